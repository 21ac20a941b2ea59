use crate::core::controls::season::DispatchState;
use crate::core::space_heat_demand::rc_model::NodeTemperatures;
use crate::core::units::sum_hourly_watts_to_kwh;
use crate::simulation_time::month_of_hour;
use serde::Serialize;
use std::sync::LazyLock;

/// Operating status of a subsystem in one hour
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, strum::Display)]
pub enum SystemStatus {
    On,
    #[default]
    Off,
    #[serde(rename = "no system")]
    #[strum(serialize = "no system")]
    NoSystem,
    #[serde(rename = "over heating")]
    #[strum(serialize = "over heating")]
    OverHeating,
    #[serde(rename = "over cooling")]
    #[strum(serialize = "over cooling")]
    OverCooling,
}

impl SystemStatus {
    pub(crate) fn on_if(active: bool) -> Self {
        if active {
            SystemStatus::On
        } else {
            SystemStatus::Off
        }
    }
}

/// Status of the sensible emission system, the air handling unit and the recirculation unit
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SystemStatusSet {
    pub sen: SystemStatus,
    pub ahu: SystemStatus,
    pub aru: SystemStatus,
}

impl SystemStatusSet {
    pub fn all(status: SystemStatus) -> Self {
        Self {
            sen: status,
            ahu: status,
            aru: status,
        }
    }
}

/// Air stream of a unit. Temperatures are absent while the unit is idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AirStream {
    /// Mass flow, in kg/s
    pub m: f64,
    pub t_supply: Option<f64>,
    pub t_return: Option<f64>,
}

/// Water circuit of a coil. Temperatures are absent while the coil is idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WaterStream {
    /// Mass flow, in kg/s
    pub m: f64,
    pub t_supply: Option<f64>,
    pub t_return: Option<f64>,
}

/// Heating loads of one hour, in W
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HeatingLoads {
    /// Sensible demand found by the demand interpolation
    pub q_rc: f64,
    /// Sensible load of the hydronic emission system (radiators, floor heating)
    pub q_shu: f64,
    pub q_ahu: f64,
    pub q_aru: f64,
    /// Sensible power fed to the final solve of the thermal network
    pub q_sen_sys: f64,
    /// Latent heat of humidification
    pub q_lat_sys: f64,
    pub q_em_ls: f64,
    pub load_ratio: f64,
    /// Humidifier auxiliary electricity
    pub e_hum_aux: f64,
}

/// Cooling loads of one hour, in W (negative when heat is removed)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CoolingLoads {
    pub q_rc: f64,
    /// Sensible load of the radiative sensible cooling unit
    pub q_scu: f64,
    pub q_ahu: f64,
    pub q_aru: f64,
    pub q_lat_ahu: f64,
    pub q_lat_aru: f64,
    pub q_lat_sys: f64,
    pub q_sen_sys: f64,
    pub q_em_ls: f64,
    pub load_ratio: f64,
}

/// Complete result of one simulated hour. Every field is written in every branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct HourlyResult {
    pub hour_of_year: u32,
    pub state: DispatchState,
    #[serde(flatten)]
    pub temperatures: NodeTemperatures,
    /// Indoor moisture content, in kg/kg
    pub x_int: f64,
    /// Indoor relative humidity, in %
    pub rh_int: f64,
    /// Infiltration air flow used by the thermal network, in kg/s
    pub m_ve_inf: f64,
    pub airflow_converged: bool,
    pub heating: HeatingLoads,
    pub cooling: CoolingLoads,
    pub ahu_heating: AirStream,
    pub aru_heating: AirStream,
    pub ahu_cooling: AirStream,
    pub aru_cooling: AirStream,
    pub aru_water_heating: WaterStream,
    pub aru_water_cooling: WaterStream,
    /// Water added by humidification, in kg/s
    pub g_hu: f64,
    /// Water removed by dehumidification, in kg/s (never positive)
    pub g_dhu: f64,
    pub status: SystemStatusSet,
}

pub static HOURLY_COLUMNS: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
    vec![
        ("hour of year", "[h]"),
        ("state", ""),
        ("indoor air temp", "[deg C]"),
        ("thermal mass temp", "[deg C]"),
        ("surface temp", "[deg C]"),
        ("operative temp", "[deg C]"),
        ("indoor moisture content", "[kg/kg]"),
        ("indoor relative humidity", "[%]"),
        ("infiltration", "[kg/s]"),
        ("heating demand", "[W]"),
        ("heating hydronic", "[W]"),
        ("heating ahu", "[W]"),
        ("heating aru", "[W]"),
        ("heating sensible system", "[W]"),
        ("heating latent system", "[W]"),
        ("heating emission losses", "[W]"),
        ("humidifier electricity", "[W]"),
        ("cooling demand", "[W]"),
        ("cooling scu", "[W]"),
        ("cooling ahu", "[W]"),
        ("cooling aru", "[W]"),
        ("cooling latent system", "[W]"),
        ("cooling sensible system", "[W]"),
        ("cooling emission losses", "[W]"),
        ("humidification", "[kg/s]"),
        ("dehumidification", "[kg/s]"),
        ("ahu heating flow", "[kg/s]"),
        ("aru heating flow", "[kg/s]"),
        ("ahu cooling flow", "[kg/s]"),
        ("aru cooling flow", "[kg/s]"),
        ("status sensible", ""),
        ("status ahu", ""),
        ("status aru", ""),
    ]
});

impl HourlyResult {
    /// Values in the order of `HOURLY_COLUMNS`
    pub fn csv_row(&self) -> Vec<String> {
        let numbers = [
            self.temperatures.t_int,
            self.temperatures.theta_m,
            self.temperatures.theta_c,
            self.temperatures.theta_o,
            self.x_int,
            self.rh_int,
            self.m_ve_inf,
            self.heating.q_rc,
            self.heating.q_shu,
            self.heating.q_ahu,
            self.heating.q_aru,
            self.heating.q_sen_sys,
            self.heating.q_lat_sys,
            self.heating.q_em_ls,
            self.heating.e_hum_aux,
            self.cooling.q_rc,
            self.cooling.q_scu,
            self.cooling.q_ahu,
            self.cooling.q_aru,
            self.cooling.q_lat_sys,
            self.cooling.q_sen_sys,
            self.cooling.q_em_ls,
            self.g_hu,
            self.g_dhu,
            self.ahu_heating.m,
            self.aru_heating.m,
            self.ahu_cooling.m,
            self.aru_cooling.m,
        ];

        [self.hour_of_year.to_string(), self.state.to_string()]
            .into_iter()
            .chain(numbers.iter().map(|value| value.to_string()))
            .chain([
                self.status.sen.to_string(),
                self.status.ahu.to_string(),
                self.status.aru.to_string(),
            ])
            .collect()
    }
}

/// Energy totals of a simulated period, in kWh
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnnualSummary {
    pub heating_sensible: f64,
    pub heating_latent: f64,
    pub heating_emission_losses: f64,
    pub humidifier_electricity: f64,
    /// Negative, heat removed
    pub cooling_sensible: f64,
    pub cooling_latent: f64,
    pub cooling_emission_losses: f64,
    pub monthly_heating: [f64; 12],
    pub monthly_cooling: [f64; 12],
    pub hours_heating: usize,
    pub hours_cooling: usize,
    pub hours_airflow_unconverged: usize,
}

impl AnnualSummary {
    pub fn from_hourly(results: &[HourlyResult]) -> Self {
        let total = |f: fn(&HourlyResult) -> f64| sum_hourly_watts_to_kwh(results.iter().map(f));

        let mut monthly_heating = [0.; 12];
        let mut monthly_cooling = [0.; 12];
        for result in results {
            let month = month_of_hour(result.hour_of_year);
            monthly_heating[month] += sum_hourly_watts_to_kwh([result.heating.q_sen_sys]);
            monthly_cooling[month] += sum_hourly_watts_to_kwh([result.cooling.q_sen_sys]);
        }

        Self {
            heating_sensible: total(|r| r.heating.q_sen_sys),
            heating_latent: total(|r| r.heating.q_lat_sys),
            heating_emission_losses: total(|r| r.heating.q_em_ls),
            humidifier_electricity: total(|r| r.heating.e_hum_aux),
            cooling_sensible: total(|r| r.cooling.q_sen_sys),
            cooling_latent: total(|r| r.cooling.q_lat_sys),
            cooling_emission_losses: total(|r| r.cooling.q_em_ls),
            monthly_heating,
            monthly_cooling,
            hours_heating: results
                .iter()
                .filter(|r| r.state == DispatchState::HeatingActive)
                .count(),
            hours_cooling: results
                .iter()
                .filter(|r| r.state == DispatchState::CoolingActive)
                .count(),
            hours_airflow_unconverged: results.iter().filter(|r| !r.airflow_converged).count(),
        }
    }
}
