// This module provides the resistance-capacitance model of a thermal zone.
// The calculations follow the simplified hourly method of SIA 2044 (five node network
// with one thermal mass node), which is solved implicitly for the mass node and
// back-substituted for the surface, air and operative temperatures.

use crate::core::material_properties::AIR;
use crate::core::units::SECONDS_PER_HOUR;
use crate::input::{BuildingProperties, CoolingTopology, HeatingTopology, HourlyDrivers};
use serde::Serialize;

// Convective heat transfer coefficient of internal surfaces, in W/(m2.K)
const H_CV_I: f64 = 2.5;
// Heat transfer coefficient between surface node and mass node, in W/(m2.K)
const H_IC: f64 = 9.1;
// Fraction of solar gains released directly to the air node
const F_SA: f64 = 0.1;
// Radiative fractions of internal gains
const F_R_LIGHTING: f64 = 0.7;
const F_R_PEOPLE: f64 = 0.5;
const F_R_APPLIANCES: f64 = 0.2;
// Share of lighting and appliance electricity released as heat in the zone
const F_ELECTRICITY_TO_HEAT: f64 = 0.9;
// Reduction factor for heat loss through elements in contact with the ground
pub(crate) const BASEMENT_FACTOR: f64 = 0.7;
// Weight of the air temperature in the operative temperature
const W_AIR_OPERATIVE: f64 = 0.31;

/// Node temperatures produced by one solve of the network, in deg C
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NodeTemperatures {
    pub t_int: f64,
    pub theta_m: f64,
    pub theta_c: f64,
    pub theta_o: f64,
}

impl NodeTemperatures {
    pub(crate) fn all_finite(&self) -> bool {
        self.t_int.is_finite()
            && self.theta_m.is_finite()
            && self.theta_c.is_finite()
            && self.theta_o.is_finite()
    }
}

/// A zone whose temperatures respond to a heating (positive) or cooling (negative) power.
pub trait ThermalNetwork {
    /// Node temperatures reached with the given power input, in W
    fn node_temperatures(&self, power: f64) -> NodeTemperatures;
}

/// Transmission heat transfer coefficient of opaque elements, in W/K
pub fn calc_htr_op(properties: &BuildingProperties) -> f64 {
    properties.area_opaque_above_ground * properties.u_wall
        + properties.area_opaque_below_ground * properties.u_base * BASEMENT_FACTOR
        + properties.area_roof * properties.u_roof
}

/// Transmission heat transfer coefficient of windows, in W/K
pub fn calc_htr_w(properties: &BuildingProperties) -> f64 {
    properties.area_window * properties.u_window
}

/// Fraction of the heating power released to the air node
pub fn heating_convective_fraction(topology: HeatingTopology) -> f64 {
    match topology {
        HeatingTopology::Radiator => 1.,
        HeatingTopology::FloorHeating => 0.5,
        HeatingTopology::CentralAc => 1.,
        HeatingTopology::None => 1.,
    }
}

/// Fraction of the cooling power removed from the air node
pub fn cooling_convective_fraction(topology: CoolingTopology) -> f64 {
    match topology {
        CoolingTopology::LocalAc => 1.,
        CoolingTopology::CentralAc => 1.,
        CoolingTopology::ThreeForTwo => 1.,
        CoolingTopology::CeilingRadiative => 0.5,
        CoolingTopology::None => 1.,
    }
}

/// Conductances and gain distribution factors that depend only on the building.
#[derive(Clone, Debug, PartialEq)]
pub struct RcConductances {
    h_mc: f64,
    h_ac: f64,
    h_em: f64,
    h_ec: f64,
    f_ic: f64,
    f_sc: f64,
    f_im: f64,
    f_sm: f64,
    /// Internal heat capacity, in Wh/K
    c_m: f64,
}

impl RcConductances {
    pub fn new(properties: &BuildingProperties) -> Self {
        let a_t = properties.area_internal_surfaces;
        let a_m = properties.area_mass;
        let a_w = properties.area_window;

        let h_ec = calc_htr_w(properties);
        let h_mc = H_IC * a_m;
        let h_ac = a_t / (1. / H_CV_I - 1. / H_IC);
        let h_em = 1. / (1. / calc_htr_op(properties) - 1. / h_mc);

        Self {
            h_mc,
            h_ac,
            h_em,
            h_ec,
            f_ic: (a_t - a_m - h_ec / H_IC) / a_t,
            f_sc: (a_t - a_m - a_w - h_ec / H_IC) / (a_t - a_w),
            f_im: a_m / a_t,
            f_sm: a_m / (a_t - a_w),
            c_m: properties.heat_capacity / SECONDS_PER_HOUR as f64,
        }
    }

    pub fn h_em(&self) -> f64 {
        self.h_em
    }

    pub fn h_ec(&self) -> f64 {
        self.h_ec
    }
}

/// Heat flows delivered to the three internal nodes, in W
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainSplit {
    pub air: f64,
    pub surface: f64,
    pub mass: f64,
}

/// Air flows entering the zone during one hour, in kg/s
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoneAirFlows {
    pub mechanical: f64,
    pub t_mechanical: f64,
    pub window: f64,
    pub infiltration: f64,
}

impl ZoneAirFlows {
    pub fn total(&self) -> f64 {
        self.mechanical + self.window + self.infiltration
    }
}

/// The network bound to the conditions of one hour. Solving it for different powers is
/// cheap and side-effect free.
#[derive(Clone, Debug)]
pub struct RcTimestep<'a> {
    conductances: &'a RcConductances,
    h_ea: f64,
    theta_ea: f64,
    theta_e: f64,
    phi_lighting: f64,
    phi_appliances: f64,
    phi_people: f64,
    solar_gains: f64,
    theta_m_prev: f64,
    frac_convective: f64,
}

impl<'a> RcTimestep<'a> {
    /// Arguments:
    /// * `conductances` - static conductances of the building
    /// * `drivers` - exogenous conditions of the hour
    /// * `air_flows` - air flows entering the zone this hour
    /// * `theta_m_prev` - mass node temperature at the end of the previous hour
    /// * `frac_convective` - convective fraction of the heating or cooling power
    pub fn new(
        conductances: &'a RcConductances,
        drivers: &HourlyDrivers,
        air_flows: ZoneAirFlows,
        theta_m_prev: f64,
        frac_convective: f64,
    ) -> Self {
        let m_total = air_flows.total();
        let theta_ea = if m_total > 0. {
            (air_flows.mechanical * air_flows.t_mechanical
                + (air_flows.window + air_flows.infiltration) * drivers.t_ext)
                / m_total
        } else {
            drivers.t_ext
        };

        Self {
            conductances,
            h_ea: m_total * AIR.specific_heat_capacity(),
            theta_ea,
            theta_e: drivers.t_ext,
            phi_lighting: F_ELECTRICITY_TO_HEAT * drivers.lighting,
            phi_appliances: F_ELECTRICITY_TO_HEAT * drivers.appliances
                + drivers.data_centre_heat
                - drivers.refrigeration_heat,
            phi_people: drivers.people_sensible,
            solar_gains: drivers.solar_gains,
            theta_m_prev,
            frac_convective,
        }
    }

    /// Distribution of internal, solar and heating/cooling gains to the air, surface and
    /// mass nodes.
    pub fn gain_split(&self, power: f64) -> GainSplit {
        let c = self.conductances;
        let phi_hc_cv = self.frac_convective * power;
        let phi_hc_r = (1. - self.frac_convective) * power;

        let radiative = F_R_LIGHTING * self.phi_lighting
            + F_R_PEOPLE * self.phi_people
            + F_R_APPLIANCES * self.phi_appliances
            + phi_hc_r;

        GainSplit {
            air: F_SA * self.solar_gains
                + (1. - F_R_LIGHTING) * self.phi_lighting
                + (1. - F_R_PEOPLE) * self.phi_people
                + (1. - F_R_APPLIANCES) * self.phi_appliances
                + phi_hc_cv,
            surface: c.f_ic * radiative + (1. - F_SA) * c.f_sc * self.solar_gains,
            mass: c.f_im * radiative + (1. - F_SA) * c.f_sm * self.solar_gains,
        }
    }
}

impl ThermalNetwork for RcTimestep<'_> {
    fn node_temperatures(&self, power: f64) -> NodeTemperatures {
        let c = self.conductances;
        let gains = self.gain_split(power);
        let (h_ea, h_ac) = (self.h_ea, c.h_ac);

        // h_1 = 1/(1/h_ea + 1/h_ac), written so that a zone without air exchange stays finite
        let h_1 = h_ea * h_ac / (h_ea + h_ac);
        // h_1 * (phi_a/h_ea + theta_ea)
        let air_path = (h_ac * gains.air + h_ea * h_ac * self.theta_ea) / (h_ea + h_ac);
        let h_2 = h_1 + c.h_ec;
        let h_3 = 1. / (1. / h_2 + 1. / c.h_mc);

        let theta_em = self.theta_e;
        let theta_ec = self.theta_e;

        let phi_m_tot =
            gains.mass + c.h_em * theta_em + h_3 * (gains.surface + c.h_ec * theta_ec + air_path) / h_2;

        let theta_m_t = (self.theta_m_prev * (c.c_m - 0.5 * (h_3 + c.h_em)) + phi_m_tot)
            / (c.c_m + 0.5 * (h_3 + c.h_em));
        let theta_m = (theta_m_t + self.theta_m_prev) / 2.;

        let theta_c = (c.h_mc * theta_m + gains.surface + c.h_ec * theta_ec + air_path)
            / (c.h_mc + c.h_ec + h_1);
        let t_int = (h_ac * theta_c + h_ea * self.theta_ea + gains.air) / (h_ac + h_ea);
        let theta_o = W_AIR_OPERATIVE * t_int + (1. - W_AIR_OPERATIVE) * theta_c;

        NodeTemperatures {
            t_int,
            theta_m,
            theta_c,
            theta_o,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::space_heat_demand::test_fixtures::{drivers, properties};
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn conductances(properties: BuildingProperties) -> RcConductances {
        RcConductances::new(&properties)
    }

    #[fixture]
    fn air_flows() -> ZoneAirFlows {
        ZoneAirFlows {
            mechanical: 0.1,
            t_mechanical: 16.,
            window: 0.,
            infiltration: 0.05,
        }
    }

    #[rstest]
    fn test_transmission_coefficients(properties: BuildingProperties) {
        // 200 * 0.3 + 100 * 0.4 * 0.7 + 100 * 0.2
        assert_relative_eq!(calc_htr_op(&properties), 108.);
        assert_relative_eq!(calc_htr_w(&properties), 60.);
    }

    #[rstest]
    fn test_temperatures_are_linear_in_power(
        conductances: RcConductances,
        drivers: HourlyDrivers,
        air_flows: ZoneAirFlows,
    ) {
        let step = RcTimestep::new(&conductances, &drivers, air_flows, 19., 1.);

        let t_0 = step.node_temperatures(0.).t_int;
        let t_1 = step.node_temperatures(1000.).t_int;
        let t_2 = step.node_temperatures(2000.).t_int;

        assert!(t_1 > t_0);
        assert_relative_eq!(t_2 - t_1, t_1 - t_0, max_relative = 1e-9);
    }

    #[rstest]
    fn test_cooling_power_lowers_all_nodes(
        conductances: RcConductances,
        drivers: HourlyDrivers,
        air_flows: ZoneAirFlows,
    ) {
        let step = RcTimestep::new(&conductances, &drivers, air_flows, 19., 0.5);
        let free = step.node_temperatures(0.);
        let cooled = step.node_temperatures(-3000.);

        assert!(cooled.t_int < free.t_int);
        assert!(cooled.theta_c < free.theta_c);
        assert!(cooled.theta_m < free.theta_m);
        assert_relative_eq!(
            cooled.theta_o,
            0.31 * cooled.t_int + 0.69 * cooled.theta_c,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_zone_without_air_exchange_stays_finite(
        conductances: RcConductances,
        drivers: HourlyDrivers,
    ) {
        let step = RcTimestep::new(&conductances, &drivers, ZoneAirFlows::default(), 19., 1.);
        assert!(step.node_temperatures(500.).all_finite());
    }

    #[rstest]
    fn test_steady_state_without_gains_is_outdoor_temperature(
        conductances: RcConductances,
        mut drivers: HourlyDrivers,
        air_flows: ZoneAirFlows,
    ) {
        drivers.solar_gains = 0.;
        drivers.lighting = 0.;
        drivers.appliances = 0.;
        drivers.people_sensible = 0.;
        let air_flows = ZoneAirFlows {
            t_mechanical: drivers.t_ext,
            ..air_flows
        };
        let step = RcTimestep::new(&conductances, &drivers, air_flows, drivers.t_ext, 1.);
        let temps = step.node_temperatures(0.);

        assert_relative_eq!(temps.t_int, drivers.t_ext, max_relative = 1e-12);
        assert_relative_eq!(temps.theta_m, drivers.t_ext, max_relative = 1e-12);
    }

    #[rstest]
    fn test_gain_split_conserves_gains_without_glazing(
        mut properties: BuildingProperties,
        drivers: HourlyDrivers,
        air_flows: ZoneAirFlows,
    ) {
        properties.area_window = 0.;
        let conductances = RcConductances::new(&properties);
        let step = RcTimestep::new(&conductances, &drivers, air_flows, 19., 0.5);
        let split = step.gain_split(1500.);

        let total_gains = 0.9 * drivers.lighting
            + 0.9 * drivers.appliances
            + drivers.people_sensible
            + drivers.solar_gains
            + 1500.;
        assert_relative_eq!(
            split.air + split.surface + split.mass,
            total_gains,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_convective_fractions() {
        assert_relative_eq!(heating_convective_fraction(HeatingTopology::FloorHeating), 0.5);
        assert_relative_eq!(heating_convective_fraction(HeatingTopology::Radiator), 1.);
        assert_relative_eq!(
            cooling_convective_fraction(CoolingTopology::CeilingRadiative),
            0.5
        );
        assert_relative_eq!(cooling_convective_fraction(CoolingTopology::ThreeForTwo), 1.);
    }
}
