use crate::building::simulate_building;
use crate::core::controls::season::DispatchState;
use crate::core::dispatch::{CarriedState, SystemDispatch};
use crate::core::space_heat_demand::test_fixtures::{drivers, properties};
use crate::core::units::HOURS_PER_YEAR;
use crate::input::{
    BuildingInput, BuildingProperties, ComfortProperties, CoolingTopology, HeatingTopology,
    HourlyDrivers, HvacProperties, NaturalVentilationInput, ShieldingClass, SimulationConfig,
};
use crate::output::{HourlyResult, SystemStatus, SystemStatusSet};
use crate::simulation_time::SimulationTime;
use approx::assert_relative_eq;
use pretty_assertions::assert_eq;
use rstest::*;
use std::f64::consts::PI;

fn building(properties: BuildingProperties, drivers: Vec<HourlyDrivers>) -> BuildingInput {
    BuildingInput {
        properties,
        hvac: HvacProperties::default(),
        comfort: ComfortProperties::default(),
        natural_ventilation: None,
        drivers,
    }
}

fn carried(t: f64, x: f64) -> CarriedState {
    CarriedState {
        theta_m: t,
        t_int: t,
        x_int: x,
        aru_water_return_heating: None,
        aru_water_return_cooling: None,
    }
}

/// Run a single hour from a given carried state.
fn run_hour(input: &BuildingInput, state: CarriedState) -> HourlyResult {
    let config = SimulationConfig::default();
    let dispatch = SystemDispatch::new(input, &config).unwrap();
    let simtime = SimulationTime::new(0, 1).iter().next().unwrap();

    dispatch.step(&simtime, &input.drivers[0], &state).unwrap().0
}

/// Heating season from October to April, cooling season from May to September, with a
/// yearly and a daily swing of outdoor temperature and daytime solar gains.
fn synthetic_year(template: &HourlyDrivers) -> Vec<HourlyDrivers> {
    (0..HOURS_PER_YEAR)
        .map(|hour| {
            let day = hour as f64 / 24.;
            let hour_of_day = (hour % 24) as f64;
            let heating_season = !(2880..6552).contains(&hour);
            let t_ext = 10. - 10. * (2. * PI * (day - 15.) / 365.).cos()
                + 4. * (2. * PI * (hour_of_day - 9.) / 24.).sin();
            let solar_gains = if (6. ..=18.).contains(&hour_of_day) {
                2000. * (PI * (hour_of_day - 6.) / 12.).sin()
            } else {
                0.
            };

            HourlyDrivers {
                t_ext,
                rh_ext: 70.,
                solar_gains,
                t_ve_mech: t_ext + 0.7 * (20. - t_ext),
                x_ve_mech: 0.,
                heating_season,
                cooling_season: !heating_season,
                ..template.clone()
            }
        })
        .collect()
}

#[rstest]
fn test_full_year_radiator_and_local_ac(properties: BuildingProperties, drivers: HourlyDrivers) {
    let input = building(properties, synthetic_year(&drivers));

    let results = simulate_building(
        "house",
        &input,
        &SimulationTime::full_year(),
        &SimulationConfig::default(),
    )
    .unwrap();

    assert_eq!(results.hourly.len(), 8760);
    for (index, result) in results.hourly.iter().enumerate() {
        assert_eq!(result.hour_of_year as usize, index);
        assert!(result.temperatures.t_int.is_finite());
        assert!(result.temperatures.theta_m.is_finite());
        assert!(result.x_int >= 0.);
        assert!(result.heating.q_sen_sys >= 0.);
        assert!(result.cooling.q_sen_sys <= 0.);
        if !input.drivers[index].heating_season {
            assert_eq!(result.heating.q_sen_sys, 0.);
        }
        if result.heating.q_shu > 0. && result.heating.q_shu < 6000. {
            assert_relative_eq!(result.temperatures.t_int, 21., max_relative = 1e-6);
        }
    }
    assert!(results.summary.heating_sensible > 0.);
    assert!(results.summary.cooling_sensible <= 0.);
    assert!(results.summary.hours_heating > 0);
    assert_eq!(results.summary.hours_airflow_unconverged, 0);
    assert_relative_eq!(
        results.summary.monthly_heating.iter().sum::<f64>(),
        results.summary.heating_sensible,
        max_relative = 1e-9
    );
}

#[rstest]
fn test_central_ac_over_heating(
    mut properties: BuildingProperties,
    mut drivers: HourlyDrivers,
) {
    properties.heating = HeatingTopology::CentralAc;
    drivers.t_ext = 15.;
    drivers.m_ve_mech = 0.3;
    drivers.t_ve_mech = 16.;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(20.5, 0.007));

    assert_eq!(result.state, DispatchState::HeatingActive);
    assert!(result.heating.q_rc > 0.);
    assert!(result.heating.q_ahu > result.heating.q_rc);
    assert_eq!(result.heating.q_aru, 0.);
    assert_eq!(result.heating.q_sen_sys, result.heating.q_ahu);
    assert_eq!(result.status.ahu, SystemStatus::OverHeating);
    assert_eq!(result.status.aru, SystemStatus::Off);
    assert_eq!(result.status.sen, SystemStatus::NoSystem);
    assert_eq!(result.aru_heating.t_supply, None);
    assert!(result.temperatures.t_int > 21.);
}

#[rstest]
fn test_central_ac_heating_splits_demand(
    mut properties: BuildingProperties,
    mut drivers: HourlyDrivers,
) {
    properties.heating = HeatingTopology::CentralAc;
    properties.heating_capacity = 100.;
    drivers.t_ext = -5.;
    drivers.m_ve_mech = 0.05;
    drivers.t_ve_mech = 10.;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(20., 0.005));

    assert!(result.heating.q_ahu > 0.);
    assert!(result.heating.q_aru > 0.);
    assert_relative_eq!(
        result.heating.q_ahu + result.heating.q_aru,
        result.heating.q_rc,
        max_relative = 1e-9
    );
    assert_eq!(result.heating.q_sen_sys, result.heating.q_ahu + result.heating.q_aru);
    assert_relative_eq!(result.temperatures.t_int, 21., max_relative = 1e-6);
    assert_eq!(
        result.status,
        SystemStatusSet {
            sen: SystemStatus::NoSystem,
            ahu: SystemStatus::On,
            aru: SystemStatus::On,
        }
    );
    assert_eq!(result.ahu_heating.t_supply, Some(36.));
    assert!(result.aru_water_heating.m > 0.);
    // dry supply air is humidified up to the lower comfort limit
    assert!(result.g_hu > 0.);
    assert!(result.heating.q_lat_sys > 0.);
    assert!(result.heating.e_hum_aux > 0.);
}

#[rstest]
fn test_central_ac_treats_ventilation_air_without_demand(
    mut properties: BuildingProperties,
    mut drivers: HourlyDrivers,
) {
    properties.heating = HeatingTopology::CentralAc;
    drivers.t_ext = 15.;
    drivers.solar_gains = 3000.;
    drivers.m_ve_mech = 0.1;
    drivers.t_ve_mech = 14.;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(22., 0.007));

    assert_eq!(result.state, DispatchState::HeatingActive);
    assert_eq!(result.heating.q_rc, 0.);
    assert!(result.heating.q_ahu > 0.);
    assert_eq!(result.heating.q_aru, 0.);
    assert_eq!(result.heating.q_sen_sys, result.heating.q_ahu);
    assert_eq!(result.status.ahu, SystemStatus::OverHeating);
    assert_eq!(result.status.aru, SystemStatus::Off);
}

fn hot_humid_hour(mut drivers: HourlyDrivers) -> HourlyDrivers {
    drivers.heating_season = false;
    drivers.cooling_season = true;
    drivers.t_ext = 32.;
    drivers.rh_ext = 60.;
    drivers.m_ve_mech = 0.2;
    drivers.t_ve_mech = 30.;
    drivers.x_ve_mech = 0.;
    drivers.solar_gains = 2500.;
    drivers
}

#[rstest]
fn test_central_ac_cooling(mut properties: BuildingProperties, drivers: HourlyDrivers) {
    properties.cooling = CoolingTopology::CentralAc;
    let input = building(properties, vec![hot_humid_hour(drivers)]);

    let result = run_hour(&input, carried(27., 0.012));
    let cooling = result.cooling;

    assert_eq!(result.state, DispatchState::CoolingActive);
    assert!(cooling.q_rc < 0.);
    assert!(cooling.q_ahu < 0.);
    assert!(cooling.q_lat_ahu < 0.);
    assert!(result.g_dhu < 0.);
    assert_eq!(cooling.q_scu, 0.);
    assert_relative_eq!(cooling.q_sen_sys, cooling.q_ahu + cooling.q_aru);
    assert_relative_eq!(cooling.q_lat_sys, cooling.q_lat_ahu + cooling.q_lat_aru);
    assert!(cooling.q_sen_sys >= -5000. - 1e-6);
    assert_eq!(result.ahu_cooling.t_supply, Some(16.));
    let expected_ahu = if cooling.q_ahu < cooling.q_rc {
        SystemStatus::OverCooling
    } else {
        SystemStatus::On
    };
    assert_eq!(result.status.ahu, expected_ahu);
}

#[rstest]
fn test_central_ac_cooling_splits_demand(
    mut properties: BuildingProperties,
    drivers: HourlyDrivers,
) {
    properties.cooling = CoolingTopology::CentralAc;
    let mut drivers = hot_humid_hour(drivers);
    drivers.rh_ext = 30.;
    drivers.m_ve_mech = 0.05;
    drivers.solar_gains = 1000.;
    let input = building(properties, vec![drivers]);

    // dry zone air, so the recirculation flow is sized on temperature alone
    let result = run_hour(&input, carried(27., 0.008));
    let cooling = result.cooling;

    assert!(cooling.q_ahu < 0.);
    assert!(cooling.q_rc < cooling.q_ahu);
    assert!(cooling.q_aru < 0.);
    assert_relative_eq!(cooling.q_ahu + cooling.q_aru, cooling.q_rc, max_relative = 1e-9);
    assert_relative_eq!(cooling.q_sen_sys, cooling.q_rc, max_relative = 1e-9);
    assert_eq!(cooling.q_scu, 0.);
    assert_eq!(
        result.status,
        SystemStatusSet {
            sen: SystemStatus::NoSystem,
            ahu: SystemStatus::On,
            aru: SystemStatus::On,
        }
    );
}

#[rstest]
fn test_central_ac_cools_ventilation_air_without_demand(
    mut properties: BuildingProperties,
    mut drivers: HourlyDrivers,
) {
    properties.cooling = CoolingTopology::CentralAc;
    drivers.heating_season = false;
    drivers.cooling_season = true;
    drivers.t_ext = 18.;
    drivers.solar_gains = 0.;
    drivers.t_ve_mech = 24.;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(22., 0.007));

    assert_eq!(result.state, DispatchState::CoolingActive);
    assert_eq!(result.cooling.q_rc, 0.);
    assert!(result.cooling.q_ahu < 0.);
    assert_eq!(result.cooling.q_aru, 0.);
    assert_eq!(result.cooling.q_sen_sys, result.cooling.q_ahu);
    assert_eq!(result.status.ahu, SystemStatus::OverCooling);
    assert_eq!(result.status.aru, SystemStatus::Off);
}

#[rstest]
fn test_three_for_two_cooling(mut properties: BuildingProperties, drivers: HourlyDrivers) {
    properties.cooling = CoolingTopology::ThreeForTwo;
    let input = building(properties, vec![hot_humid_hour(drivers)]);

    let result = run_hour(&input, carried(27., 0.012));
    let cooling = result.cooling;

    assert!(cooling.q_scu <= 0.);
    assert_relative_eq!(
        cooling.q_sen_sys,
        cooling.q_ahu + cooling.q_aru + cooling.q_scu
    );
    if cooling.q_ahu + cooling.q_aru >= cooling.q_rc {
        assert_relative_eq!(cooling.q_sen_sys, cooling.q_rc, max_relative = 1e-9);
    }
    assert_eq!(result.status.sen, SystemStatus::on_if(cooling.q_scu < 0.));
}

#[rstest]
fn test_local_ac_cooling(properties: BuildingProperties, drivers: HourlyDrivers) {
    let input = building(properties, vec![hot_humid_hour(drivers)]);

    let result = run_hour(&input, carried(27., 0.012));

    assert_eq!(result.cooling.q_ahu, 0.);
    assert!(result.cooling.q_aru < 0.);
    assert_eq!(result.status.ahu, SystemStatus::NoSystem);
    assert_ne!(result.status.aru, SystemStatus::Off);
    assert!(result.aru_water_cooling.m > 0.);
    assert!(result.aru_water_cooling.t_return > result.aru_water_cooling.t_supply);
}

#[rstest]
fn test_local_ac_follows_sensible_demand_on_humid_hour(
    properties: BuildingProperties,
    drivers: HourlyDrivers,
) {
    let mut drivers = hot_humid_hour(drivers);
    drivers.solar_gains = 600.;
    drivers.moisture_gains = 4e-4;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(27., 0.016));
    let cooling = result.cooling;

    assert!(cooling.q_rc < 0.);
    assert_relative_eq!(cooling.q_aru, cooling.q_rc, max_relative = 1e-9);
    assert_relative_eq!(cooling.q_sen_sys, cooling.q_rc, max_relative = 1e-9);
    assert_eq!(result.status.aru, SystemStatus::On);
    // the coil still condenses, it is just not sized for it
    assert!(result.g_dhu < 0.);
    assert!(cooling.q_lat_aru < 0.);
}

#[rstest]
fn test_ambiguous_season_runs_no_system(
    properties: BuildingProperties,
    mut drivers: HourlyDrivers,
) {
    drivers.heating_season = true;
    drivers.cooling_season = true;
    let input = building(properties, vec![drivers]);

    let result = run_hour(&input, carried(15., 0.006));

    assert_eq!(result.state, DispatchState::NoSeason);
    assert_eq!(result.heating.q_sen_sys, 0.);
    assert_eq!(result.cooling.q_sen_sys, 0.);
    assert_eq!(result.status, SystemStatusSet::all(SystemStatus::Off));
}

#[rstest]
fn test_natural_ventilation_replaces_infiltration(
    properties: BuildingProperties,
    drivers: HourlyDrivers,
) {
    let mut input = building(properties, vec![drivers]);
    input.natural_ventilation = Some(NaturalVentilationInput {
        height: 6.,
        area_facade: 200.,
        area_roof: 100.,
        n50: 3.,
        area_vent_openings: 0.,
        shielding: ShieldingClass::Normal,
        roof_slope: 0.,
        cross_ventilation: false,
    });

    let result = run_hour(&input, carried(20., 0.006));

    assert!(result.airflow_converged);
    assert!(result.m_ve_inf > 0.);
    assert!((result.m_ve_inf - 0.05).abs() > 1e-9);
}

#[rstest]
fn test_driver_count_mismatch_is_rejected(
    properties: BuildingProperties,
    drivers: HourlyDrivers,
) {
    let input = building(properties, vec![drivers; 3]);

    let result = simulate_building(
        "short",
        &input,
        &SimulationTime::new(0, 4),
        &SimulationConfig::default(),
    );

    assert!(result.is_err());
}
