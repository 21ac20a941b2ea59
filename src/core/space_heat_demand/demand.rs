use crate::core::space_heat_demand::rc_model::{NodeTemperatures, ThermalNetwork};
use crate::errors::DemandError;
use crate::input::SimulationConfig;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemandMode {
    Heating,
    Cooling,
}

impl DemandMode {
    fn sign(&self) -> f64 {
        match self {
            DemandMode::Heating => 1.,
            DemandMode::Cooling => -1.,
        }
    }
}

/// Outcome of the free-floating and probe evaluations of the network.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemandProbe {
    pub free_floating: NodeTemperatures,
    /// Power needed to reach the setpoint before capacity limits, in W
    pub required_power: f64,
    /// Required power limited to the installed capacity, in W
    pub power: f64,
    pub clamped: bool,
    /// Indoor air temperature the limited power will produce
    pub t_int_expected: f64,
}

impl DemandProbe {
    fn no_demand(free_floating: NodeTemperatures) -> Self {
        Self {
            free_floating,
            required_power: 0.,
            power: 0.,
            clamped: false,
            t_int_expected: free_floating.t_int,
        }
    }
}

/// Sensible demand together with the temperatures it realises.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensibleDemand {
    pub power: f64,
    pub temperatures: NodeTemperatures,
    pub clamped: bool,
}

/// Find the power that brings the indoor air to its setpoint, without the final solve.
///
/// The zone temperature responds linearly to power for fixed conductances, so one
/// free-floating solve and one solve at a reference power give the exact answer by
/// interpolation. The network is evaluated at most twice.
///
/// Arguments:
/// * `network` - zone network bound to the current hour
/// * `mode` - heating or cooling
/// * `setpoint` - indoor air temperature to reach, in deg C
/// * `floor_area` - conditioned floor area, in m2 (scales the probe power)
/// * `capacity` - installed power, in W (negative for cooling)
/// * `config` - demand band, probe intensity and degeneracy threshold
pub fn probe_sensible_demand(
    network: &impl ThermalNetwork,
    mode: DemandMode,
    setpoint: f64,
    floor_area: f64,
    capacity: f64,
    config: &SimulationConfig,
) -> Result<DemandProbe, DemandError> {
    let free_floating = network.node_temperatures(0.);
    let t_free = free_floating.t_int;
    if !t_free.is_finite() {
        return Err(DemandError::NonFiniteTemperature(t_free));
    }

    let has_demand = match mode {
        DemandMode::Heating => t_free < setpoint - config.demand_band,
        DemandMode::Cooling => t_free > setpoint + config.demand_band,
    };
    if !has_demand {
        return Ok(DemandProbe::no_demand(free_floating));
    }

    let probe_power = mode.sign() * config.probe_power_intensity * floor_area;
    let t_probe = network.node_temperatures(probe_power).t_int;
    if !t_probe.is_finite() {
        return Err(DemandError::NonFiniteTemperature(t_probe));
    }
    if (t_probe - t_free).abs() < config.degenerate_threshold {
        return Err(DemandError::DegenerateNetwork { t_free, t_probe });
    }

    let required_power = probe_power * (setpoint - t_free) / (t_probe - t_free);

    let (lower, upper) = match mode {
        DemandMode::Heating => (0., capacity.max(0.)),
        DemandMode::Cooling => (capacity.min(0.), 0.),
    };
    if mode.sign() * required_power < 0. {
        warn!(
            "{mode:?} demand interpolation gave power of opposite sign ({required_power:.1} W), limiting to zero"
        );
    }
    let power = required_power.clamp(lower, upper);
    let clamped = power != required_power;

    let t_int_expected = if clamped {
        t_free + (t_probe - t_free) * power / probe_power
    } else {
        setpoint
    };

    Ok(DemandProbe {
        free_floating,
        required_power,
        power,
        clamped,
        t_int_expected,
    })
}

/// Solve the network at the power finally delivered to the zone.
pub fn realize(
    network: &impl ThermalNetwork,
    power: f64,
) -> Result<NodeTemperatures, DemandError> {
    let temperatures = network.node_temperatures(power);
    if !temperatures.all_finite() {
        return Err(DemandError::NonFiniteTemperature(temperatures.t_int));
    }

    Ok(temperatures)
}

/// Sensible demand of the zone limited by capacity, with the temperatures it produces.
/// Uses between one and three solves of the network.
pub fn calc_sensible_demand(
    network: &impl ThermalNetwork,
    mode: DemandMode,
    setpoint: f64,
    floor_area: f64,
    capacity: f64,
    config: &SimulationConfig,
) -> Result<SensibleDemand, DemandError> {
    let probe = probe_sensible_demand(network, mode, setpoint, floor_area, capacity, config)?;

    let temperatures = if probe.power == 0. {
        probe.free_floating
    } else {
        realize(network, probe.power)?
    };

    Ok(SensibleDemand {
        power: probe.power,
        temperatures,
        clamped: probe.clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::space_heat_demand::test_fixtures::LinearNetwork;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    #[rstest]
    fn test_radiator_scenario_is_three_times_probe(config: SimulationConfig) {
        // 18 degC free floating, 19 degC with the 10 W/m2 probe on 100 m2
        let network = LinearNetwork::new(18., 1. / 1000.);

        let demand =
            calc_sensible_demand(&network, DemandMode::Heating, 21., 100., 10_000., &config)
                .unwrap();

        assert_relative_eq!(demand.power, 3000., max_relative = 1e-12);
        assert!(!demand.clamped);
        assert_relative_eq!(demand.temperatures.t_int, 21., max_relative = 1e-12);
        assert_eq!(network.solves(), 3);
    }

    #[rstest]
    #[case(15., 0.0042, 22.)]
    #[case(9., 0.0007, 20.5)]
    #[case(20.99, 0.01, 21.)]
    fn test_interpolation_is_exact_for_linear_network(
        config: SimulationConfig,
        #[case] t_free: f64,
        #[case] slope: f64,
        #[case] setpoint: f64,
    ) {
        let network = LinearNetwork::new(t_free, slope);
        let demand =
            calc_sensible_demand(&network, DemandMode::Heating, setpoint, 80., 1e9, &config)
                .unwrap();

        assert_relative_eq!(
            demand.power,
            (setpoint - t_free) / slope,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            network.node_temperatures(demand.power).t_int,
            demand.temperatures.t_int,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_heating_is_clamped_to_capacity(config: SimulationConfig) {
        let network = LinearNetwork::new(10., 1. / 1000.);

        let probe =
            probe_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config)
                .unwrap();
        assert_relative_eq!(probe.required_power, 11_000., max_relative = 1e-12);
        assert_eq!(probe.power, 5000.);
        assert!(probe.clamped);
        assert_relative_eq!(probe.t_int_expected, 15., max_relative = 1e-12);

        let demand =
            calc_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config)
                .unwrap();
        assert_relative_eq!(demand.temperatures.t_int, 15., max_relative = 1e-12);
    }

    #[rstest]
    fn test_cooling_demand_is_negative_and_clamped(config: SimulationConfig) {
        let network = LinearNetwork::new(30., 1. / 500.);

        let demand =
            calc_sensible_demand(&network, DemandMode::Cooling, 26., 50., -1500., &config)
                .unwrap();

        // unclamped requirement would be -2000 W
        assert_eq!(demand.power, -1500.);
        assert!(demand.clamped);
        assert_relative_eq!(demand.temperatures.t_int, 27., max_relative = 1e-12);
    }

    #[rstest]
    fn test_no_demand_inside_band_uses_single_solve(config: SimulationConfig) {
        let network = LinearNetwork::new(21.0005, 1. / 1000.);

        let demand =
            calc_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config)
                .unwrap();

        assert_eq!(demand.power, 0.);
        assert_eq!(demand.temperatures.t_int, 21.0005);
        assert_eq!(network.solves(), 1);
    }

    #[rstest]
    fn test_no_heating_demand_when_zone_is_warm(config: SimulationConfig) {
        let network = LinearNetwork::new(24., 1. / 1000.);
        let probe =
            probe_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config)
                .unwrap();

        assert_eq!(probe.power, 0.);
        assert_eq!(probe.t_int_expected, 24.);
    }

    #[rstest]
    fn test_wrong_sign_response_is_limited_to_zero(config: SimulationConfig) {
        // a network that cools down when heated
        let network = LinearNetwork::new(18., -1. / 1000.);

        let probe =
            probe_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config)
                .unwrap();

        assert!(probe.required_power < 0.);
        assert_eq!(probe.power, 0.);
        assert!(probe.clamped);
    }

    #[rstest]
    fn test_degenerate_network_is_reported(config: SimulationConfig) {
        let network = LinearNetwork::new(18., 0.);

        let result = calc_sensible_demand(&network, DemandMode::Heating, 21., 100., 5000., &config);

        assert_eq!(
            result,
            Err(DemandError::DegenerateNetwork {
                t_free: 18.,
                t_probe: 18.
            })
        );
    }
}
