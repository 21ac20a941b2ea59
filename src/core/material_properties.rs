use crate::core::units::KELVIN_OFFSET_SIMPLIFIED;
use std::sync::LazyLock;

/// This module contains data on the properties of materials, and classes to
/// organise this data.

#[derive(Clone, Copy, Debug)]
pub struct MaterialProperties {
    density: f64,                // kg/m3 at the reference temperature
    specific_heat_capacity: f64, // J/(kg.K)
}

impl MaterialProperties {
    pub const fn new(density: f64, specific_heat_capacity: f64) -> Self {
        Self {
            density,
            specific_heat_capacity,
        }
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn specific_heat_capacity(&self) -> f64 {
        self.specific_heat_capacity
    }

    /// Heat carried by a mass flow of the material, in W
    ///
    /// Arguments:
    /// * `mass_flow` - in kg/s
    /// * `temp_high` - temperature for which the heat flow should be calculated, in deg C or K
    /// * `temp_base` - temperature which defines "zero energy", in same units as temp_high
    pub fn heat_flow(&self, mass_flow: f64, temp_high: f64, temp_base: f64) -> f64 {
        mass_flow * self.specific_heat_capacity * (temp_high - temp_base)
    }

    /// Mass flow needed to carry a heat flow across a temperature difference, in kg/s
    pub fn mass_flow_for_heat(&self, heat_flow: f64, temp_high: f64, temp_base: f64) -> f64 {
        heat_flow / (self.specific_heat_capacity * (temp_high - temp_base))
    }
}

pub static WATER: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(1000.0, 4184.0));
pub static AIR: LazyLock<MaterialProperties> =
    LazyLock::new(|| MaterialProperties::new(1.23, 1005.0));

/// Latent heat of vaporisation of water, in J/kg
pub const LATENT_HEAT_VAPORISATION: f64 = 2_460_000.;

/// Reference temperature of the simplified air density relation, in K
pub(crate) const TEMP_AIR_REF: f64 = 283.;

/// Density of air at the given temperature (EN 15242 simplification), in kg/m3
///
/// Arguments:
/// * `temp` - air temperature, in deg C
pub fn air_density(temp: f64) -> f64 {
    AIR.density() * TEMP_AIR_REF / (temp + KELVIN_OFFSET_SIMPLIFIED)
}
