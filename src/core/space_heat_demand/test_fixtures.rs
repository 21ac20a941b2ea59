use crate::core::space_heat_demand::rc_model::{NodeTemperatures, ThermalNetwork};
use crate::input::{
    BuildingProperties, CoolingTopology, HeatingTopology, HourlyDrivers, Thermostat,
};
use rstest::fixture;
use std::cell::Cell;

#[fixture]
pub fn properties() -> BuildingProperties {
    BuildingProperties {
        floor_area: 100.,
        volume: 300.,
        area_opaque_above_ground: 200.,
        area_opaque_below_ground: 100.,
        area_window: 40.,
        area_roof: 100.,
        u_wall: 0.3,
        u_base: 0.4,
        u_roof: 0.2,
        u_window: 1.5,
        area_mass: 250.,
        heat_capacity: 16_500_000.,
        area_internal_surfaces: 450.,
        heating_capacity: 60.,
        cooling_capacity: 50.,
        window_to_wall_ratio: 0.2,
        heating: HeatingTopology::Radiator,
        cooling: CoolingTopology::LocalAc,
    }
}

#[fixture]
pub fn drivers() -> HourlyDrivers {
    HourlyDrivers {
        t_ext: 5.,
        rh_ext: 80.,
        wind_speed: 3.,
        solar_gains: 400.,
        lighting: 200.,
        appliances: 300.,
        data_centre_heat: 0.,
        refrigeration_heat: 0.,
        people_sensible: 350.,
        moisture_gains: 1e-5,
        m_ve_mech: 0.1,
        t_ve_mech: 16.,
        x_ve_mech: 0.004,
        m_ve_window: 0.,
        m_ve_inf: 0.05,
        heating_thermostat: Thermostat::at_setpoint(21.),
        cooling_thermostat: Thermostat::at_setpoint(26.),
        heating_season: true,
        cooling_season: false,
    }
}

/// Network whose nodes all sit at `t_free + slope * power`, counting its solves.
pub struct LinearNetwork {
    t_free: f64,
    slope: f64,
    solves: Cell<usize>,
}

impl LinearNetwork {
    pub fn new(t_free: f64, slope: f64) -> Self {
        Self {
            t_free,
            slope,
            solves: Cell::new(0),
        }
    }

    pub fn solves(&self) -> usize {
        self.solves.get()
    }
}

impl ThermalNetwork for LinearNetwork {
    fn node_temperatures(&self, power: f64) -> NodeTemperatures {
        self.solves.set(self.solves.get() + 1);
        let t = self.t_free + self.slope * power;

        NodeTemperatures {
            t_int: t,
            theta_m: t,
            theta_c: t,
            theta_o: t,
        }
    }
}
