pub mod ahu;
pub mod aru;
pub mod coil;

use crate::core::material_properties::LATENT_HEAT_VAPORISATION;
use crate::core::space_heat_demand::moisture::calc_humidification_moisture_load;
use crate::core::units::kg_per_s_to_kg_per_h;

// Auxiliary electricity of the adiabatic humidifier, in W per kg/h of water added
const HUMIDIFIER_ELECTRICITY_PER_KG_H: f64 = 15.;

/// Temperature and moisture of an air stream
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AirState {
    /// Mass flow, in kg/s
    pub m: f64,
    /// Temperature, in deg C
    pub t: f64,
    /// Moisture content, in kg/kg
    pub x: f64,
}

/// Water added to the supply air of a unit and what it costs
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Humidification {
    /// Water added, in kg/s
    pub g_hu: f64,
    /// Latent heat of the added water, in W
    pub q_latent: f64,
    /// Auxiliary electricity of the humidifier, in W
    pub e_aux: f64,
}

/// Humidify supply air so that the zone does not fall below its lower humidity limit.
///
/// Arguments:
/// * `supply` - air leaving the heating coil
/// * `t_int` - indoor air temperature, in deg C
/// * `rh_min` - lower comfort limit of relative humidity, in %
pub fn calc_humidification(supply: &AirState, t_int: f64, rh_min: f64) -> Humidification {
    let g_hu = calc_humidification_moisture_load(t_int, rh_min, supply.m, supply.x);

    Humidification {
        g_hu,
        q_latent: g_hu * LATENT_HEAT_VAPORISATION,
        e_aux: kg_per_s_to_kg_per_h(g_hu) * HUMIDIFIER_ELECTRICITY_PER_KG_H,
    }
}
