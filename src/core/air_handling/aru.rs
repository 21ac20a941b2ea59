use crate::core::air_handling::coil::{WaterCoil, WaterSide};
use crate::core::air_handling::AirState;
use crate::core::material_properties::{AIR, LATENT_HEAT_VAPORISATION};
use crate::core::psychrometrics::{enthalpy, saturation_moisture_content};
use crate::errors::{CoilError, InputError};
use crate::input::{AirUnitProperties, SimulationConfig};
use tracing::warn;

// Smallest difference between supply and return air the unit can work with, in K
const MIN_SUPPLY_RETURN_DIFFERENCE: f64 = 0.1;
// Smallest moisture difference from which a dehumidification flow is derived, in kg/kg
const MIN_MOISTURE_DIFFERENCE: f64 = 1e-9;

/// Which quantities the recirculation flow is sized for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AruControl {
    pub temperature: bool,
    pub moisture: bool,
}

/// Residual loads handed to the recirculation unit in the cooling season
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AruCoolingRequest {
    /// Sensible cooling still required, in W (never positive)
    pub q_sensible: f64,
    /// Water still to be removed from the zone, in kg/s (never positive)
    pub g_dehumidification: f64,
    /// Largest sensible cooling the unit may deliver, in W (never positive)
    pub q_limit: f64,
}

/// State of the recirculation unit in operation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AruOperation {
    pub supply: AirState,
    pub t_return: f64,
    pub x_return: f64,
    /// Sensible heat delivered to the zone, in W
    pub q_sensible: f64,
    /// Latent heat removed from the zone, in W (never positive)
    pub q_latent: f64,
    /// Water removed from the zone, in kg/s (never positive)
    pub g_dehumidification: f64,
    pub t_contact: f64,
    pub water: WaterSide,
}

/// Local unit conditioning recirculated room air at a fixed supply temperature
#[derive(Clone, Debug, PartialEq)]
pub struct RecirculationUnit {
    t_supply_heating: f64,
    t_supply_cooling: f64,
    heating_coil: WaterCoil,
    cooling_coil: WaterCoil,
}

impl RecirculationUnit {
    pub fn new(
        properties: &AirUnitProperties,
        heating_capacity: f64,
        cooling_capacity: f64,
    ) -> Result<Self, InputError> {
        Ok(Self {
            t_supply_heating: properties.t_supply_heating,
            t_supply_cooling: properties.t_supply_cooling,
            heating_coil: WaterCoil::new(properties.heating_coil, heating_capacity)?,
            cooling_coil: WaterCoil::new(properties.cooling_coil, cooling_capacity)?,
        })
    }

    pub fn t_supply_cooling(&self) -> f64 {
        self.t_supply_cooling
    }

    /// Deliver a sensible heating residual by recirculating room air through the heating coil.
    ///
    /// Returns `None` when there is nothing to deliver or the supply temperature is not above
    /// the return temperature.
    ///
    /// Arguments:
    /// * `q_sensible` - sensible heating still required, in W
    /// * `t_return` - room air temperature drawn by the unit, in deg C
    /// * `x_return` - room air moisture content, in kg/kg
    /// * `t_water_return_seed` - coil water return temperature of the previous hour
    /// * `config` - tolerance and iteration limit of the water side solve
    pub fn heating(
        &self,
        q_sensible: f64,
        t_return: f64,
        x_return: f64,
        t_water_return_seed: Option<f64>,
        config: &SimulationConfig,
    ) -> Result<Option<AruOperation>, CoilError> {
        if q_sensible <= 0. {
            return Ok(None);
        }
        let t_supply = self.t_supply_heating;
        if t_supply - t_return < MIN_SUPPLY_RETURN_DIFFERENCE {
            warn!(
                "Recirculation unit cannot heat: return air at {t_return:.2} degC is not below supply at {t_supply:.2} degC"
            );
            return Ok(None);
        }

        let m = AIR.mass_flow_for_heat(q_sensible, t_supply, t_return);
        let t_contact = self.heating_coil.contact_temperature(m, t_return, t_supply)?;
        let water =
            self.heating_coil
                .solve_water_side(q_sensible, t_contact, t_water_return_seed, config)?;

        Ok(Some(AruOperation {
            supply: AirState {
                m,
                t: t_supply,
                x: x_return,
            },
            t_return,
            x_return,
            q_sensible,
            q_latent: 0.,
            g_dehumidification: 0.,
            t_contact,
            water,
        }))
    }

    /// Cool recirculated room air to the cooling supply temperature. The air flow is sized for
    /// the sensible residual, the dehumidification residual, or the larger of both, as
    /// selected by `control`; the moisture driven flow never exceeds the sensible limit.
    pub fn cooling(
        &self,
        request: &AruCoolingRequest,
        control: AruControl,
        t_return: f64,
        x_return: f64,
        t_water_return_seed: Option<f64>,
        config: &SimulationConfig,
    ) -> Result<Option<AruOperation>, CoilError> {
        let t_supply = self.t_supply_cooling;
        let delta_t = t_return - t_supply;
        if delta_t < MIN_SUPPLY_RETURN_DIFFERENCE {
            if request.q_sensible < 0. || request.g_dehumidification < 0. {
                warn!(
                    "Recirculation unit cannot cool: return air at {t_return:.2} degC is not above supply at {t_supply:.2} degC"
                );
            }
            return Ok(None);
        }
        let cp = AIR.specific_heat_capacity();

        let m_temperature = if control.temperature {
            (-request.q_sensible).max(0.) / (cp * delta_t)
        } else {
            0.
        };

        let x_supply = x_return.min(saturation_moisture_content(t_supply));
        let delta_x = x_return - x_supply;
        let m_moisture = if control.moisture
            && request.g_dehumidification < 0.
            && delta_x > MIN_MOISTURE_DIFFERENCE
        {
            let m_limit = (-request.q_limit).max(0.) / (cp * delta_t);
            (-request.g_dehumidification / delta_x).min(m_limit)
        } else {
            0.
        };

        let m = m_temperature.max(m_moisture);
        if m <= 0. {
            return Ok(None);
        }

        let q_sensible = AIR.heat_flow(m, t_supply, t_return);
        let g_dehumidification = m * (x_supply - x_return);
        let q_latent = g_dehumidification * LATENT_HEAT_VAPORISATION;

        // total coil load from the enthalpy change of the recirculated air
        let q_coil = m * (enthalpy(t_supply, x_supply) - enthalpy(t_return, x_return)) * 1000.;
        let t_contact = self.cooling_coil.contact_temperature(m, t_return, t_supply)?;
        let water = self.cooling_coil.solve_water_side(
            q_coil,
            t_contact,
            t_water_return_seed,
            config,
        )?;

        Ok(Some(AruOperation {
            supply: AirState {
                m,
                t: t_supply,
                x: x_supply,
            },
            t_return,
            x_return,
            q_sensible,
            q_latent,
            g_dehumidification,
            t_contact,
            water,
        }))
    }
}
