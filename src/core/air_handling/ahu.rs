use crate::core::air_handling::coil::WaterCoil;
use crate::core::air_handling::AirState;
use crate::core::material_properties::{AIR, LATENT_HEAT_VAPORISATION};
use crate::core::psychrometrics::saturation_moisture_content;
use crate::errors::InputError;
use crate::input::AirUnitProperties;

/// What the air handling unit does to the mechanical ventilation air in one hour.
/// Loads are relative to the supply air entering the unit after heat recovery.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AhuOperation {
    /// Air leaving the unit towards the zone
    pub supply: AirState,
    /// Sensible heat added (positive) or removed (negative), in W
    pub q_sensible: f64,
    /// Latent heat removed by condensation, in W (never positive)
    pub q_latent: f64,
    /// Water condensed on the cooling coil, in kg/s (never positive)
    pub g_dehumidification: f64,
}

impl AhuOperation {
    pub(crate) fn idle(inlet: &AirState) -> Self {
        Self {
            supply: *inlet,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.q_sensible != 0. || self.q_latent != 0.
    }
}

/// Central unit treating the mechanical ventilation air with a heating and a cooling coil
/// held at fixed contact temperatures.
#[derive(Clone, Debug, PartialEq)]
pub struct AirHandlingUnit {
    t_supply_heating: f64,
    t_supply_cooling: f64,
    heating_coil: WaterCoil,
    cooling_coil: WaterCoil,
}

impl AirHandlingUnit {
    /// Arguments:
    /// * `properties` - supply temperatures and coil ratings
    /// * `heating_capacity` - nominal heating coil power, in W
    /// * `cooling_capacity` - nominal cooling coil power, in W (magnitude)
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

    pub fn t_supply_heating(&self) -> f64 {
        self.t_supply_heating
    }

    pub fn t_supply_cooling(&self) -> f64 {
        self.t_supply_cooling
    }

    /// Heat the ventilation air towards the heating supply temperature.
    pub fn heating(&self, inlet: &AirState) -> AhuOperation {
        if inlet.m <= 0. || inlet.t >= self.t_supply_heating {
            return AhuOperation::idle(inlet);
        }
        let t_contact = self.heating_coil.rating().t_contact;
        let t_out = self
            .heating_coil
            .air_outlet_temperature(inlet.m, inlet.t, t_contact)
            .min(self.t_supply_heating);

        AhuOperation {
            supply: AirState { t: t_out, ..*inlet },
            q_sensible: AIR.heat_flow(inlet.m, t_out, inlet.t).max(0.),
            q_latent: 0.,
            g_dehumidification: 0.,
        }
    }

    /// Cool the ventilation air towards the cooling supply temperature, condensing water when
    /// the air is more humid than saturated air at the coil contact temperature.
    pub fn cooling(&self, inlet: &AirState) -> AhuOperation {
        if inlet.m <= 0. || inlet.t <= self.t_supply_cooling {
            return AhuOperation::idle(inlet);
        }
        let t_contact = self.cooling_coil.rating().t_contact;
        let t_out = self
            .cooling_coil
            .air_outlet_temperature(inlet.m, inlet.t, t_contact)
            .max(self.t_supply_cooling);
        // share of the approach to the contact state actually used
        let approach = (t_out - inlet.t) / (t_contact - inlet.t);

        let x_contact = saturation_moisture_content(t_contact);
        let x_out = if inlet.x > x_contact {
            inlet.x + approach * (x_contact - inlet.x)
        } else {
            inlet.x
        };
        let g_dehumidification = inlet.m * (x_out - inlet.x);

        AhuOperation {
            supply: AirState {
                m: inlet.m,
                t: t_out,
                x: x_out,
            },
            q_sensible: AIR.heat_flow(inlet.m, t_out, inlet.t).min(0.),
            q_latent: g_dehumidification * LATENT_HEAT_VAPORISATION,
            g_dehumidification,
        }
    }
}
