// Water-to-air coil model shared by the air handling unit and the recirculation unit.
// The air side is described by an effectiveness that scales with air flow relative to the
// nominal design point; the water side by the log mean temperature difference between the
// water and the coil contact (apparatus) temperature.

use crate::core::material_properties::{AIR, WATER};
use crate::core::solvers::root_seeded;
use crate::errors::{CoilError, InputError};
use crate::input::{CoilRating, SimulationConfig};
use tracing::warn;

// Exponent of the air side heat transfer coefficient on air flow
const UA_FLOW_EXPONENT: f64 = 0.77;
// Largest share of the available water side temperature difference a load may demand
const MAX_LMTD_FRACTION: f64 = 0.999;
// Smallest effectiveness from which a contact temperature is derived
const MIN_EFFECTIVENESS: f64 = 1e-9;

/// Log mean of two temperature differences of the same sign
pub fn calc_lmtd(delta_t_a: f64, delta_t_b: f64) -> f64 {
    if is_close!(delta_t_a, delta_t_b, rel_tol = 1e-9) {
        return delta_t_a;
    }
    (delta_t_a - delta_t_b) / (delta_t_a / delta_t_b).ln()
}

/// Water side state of a coil in operation
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WaterSide {
    pub t_supply: f64,
    pub t_return: f64,
    /// Water mass flow, in kg/s
    pub m_water: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaterCoil {
    rating: CoilRating,
    /// +1 for a heating coil, -1 for a cooling coil
    direction: f64,
    /// Nominal heat flow, in W (positive)
    capacity: f64,
    /// Nominal air mass flow, in kg/s
    m_air_nominal: f64,
    /// Nominal air side heat transfer coefficient, in W/K
    ua_nominal: f64,
    /// Nominal water side LMTD relative to the contact temperature, in K
    lmtd_water_nominal: f64,
}

impl WaterCoil {
    /// Arguments:
    /// * `rating` - nominal design point of the coil
    /// * `capacity` - heat flow at the design point, in W (magnitude)
    pub fn new(rating: CoilRating, capacity: f64) -> Result<Self, InputError> {
        let direction = (rating.t_air_out - rating.t_air_in).signum();
        let ordered = [
            rating.t_air_in,
            rating.t_air_out,
            rating.t_contact,
            rating.t_water_return,
            rating.t_water_supply,
        ]
        .windows(2)
        .all(|pair| direction * (pair[1] - pair[0]) > 0.);
        if !ordered {
            return Err(InputError::Inconsistent(format!(
                "Coil rating temperatures are not ordered from air inlet to water supply: {rating:?}"
            )));
        }

        let capacity = capacity.abs();
        let delta_t_air = (rating.t_air_out - rating.t_air_in).abs();
        let m_air_nominal = capacity / (AIR.specific_heat_capacity() * delta_t_air);
        let lmtd_air_nominal = calc_lmtd(
            (rating.t_contact - rating.t_air_in).abs(),
            (rating.t_contact - rating.t_air_out).abs(),
        );
        let lmtd_water_nominal = calc_lmtd(
            (rating.t_water_supply - rating.t_contact).abs(),
            (rating.t_water_return - rating.t_contact).abs(),
        );

        Ok(Self {
            rating,
            direction,
            capacity,
            m_air_nominal,
            ua_nominal: capacity / lmtd_air_nominal,
            lmtd_water_nominal,
        })
    }

    pub fn rating(&self) -> &CoilRating {
        &self.rating
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn m_air_nominal(&self) -> f64 {
        self.m_air_nominal
    }

    /// Air side effectiveness at the given air mass flow (kg/s)
    pub fn effectiveness(&self, m_air: f64) -> f64 {
        if self.ua_nominal <= 0. {
            return 0.;
        }
        if m_air <= 0. {
            return 1.;
        }
        let ua = self.ua_nominal * (m_air / self.m_air_nominal).powf(UA_FLOW_EXPONENT);

        1. - (-ua / (m_air * AIR.specific_heat_capacity())).exp()
    }

    /// Air temperature leaving the coil for a given inlet and contact temperature
    pub fn air_outlet_temperature(&self, m_air: f64, t_in: f64, t_contact: f64) -> f64 {
        t_in + self.effectiveness(m_air) * (t_contact - t_in)
    }

    /// Contact temperature needed to bring air from `t_in` to `t_out`
    pub fn contact_temperature(&self, m_air: f64, t_in: f64, t_out: f64) -> Result<f64, CoilError> {
        let effectiveness = self.effectiveness(m_air);
        if effectiveness < MIN_EFFECTIVENESS {
            return Err(CoilError::NoEffectiveness {
                mass_flow: m_air,
                effectiveness,
            });
        }

        Ok(t_in + (t_out - t_in) / effectiveness)
    }

    /// Solve the water return temperature that transfers `heat_flow` at the given contact
    /// temperature, at the rated water supply temperature.
    ///
    /// Arguments:
    /// * `heat_flow` - heat exchanged with the air, in W (sign ignored)
    /// * `t_contact` - coil contact temperature, in deg C
    /// * `t_return_seed` - return temperature found in the previous hour, if any
    /// * `config` - tolerance and iteration limit of the root search
    pub fn solve_water_side(
        &self,
        heat_flow: f64,
        t_contact: f64,
        t_return_seed: Option<f64>,
        config: &SimulationConfig,
    ) -> Result<WaterSide, CoilError> {
        let t_supply = self.rating.t_water_supply;
        let heat_flow = heat_flow.abs();
        if heat_flow == 0. || self.capacity == 0. {
            return Ok(WaterSide {
                t_supply,
                t_return: t_supply,
                m_water: 0.,
            });
        }

        // temperature differences to the contact temperature, positive for both coil types
        let delta_t_supply = self.direction * (t_supply - t_contact);
        if delta_t_supply <= 0. {
            return Err(CoilError::ContactBeyondWaterSupply {
                t_contact,
                t_water_supply: t_supply,
            });
        }

        let mut lmtd_target = heat_flow / self.capacity * self.lmtd_water_nominal;
        let lmtd_max = MAX_LMTD_FRACTION * delta_t_supply;
        if lmtd_target > lmtd_max {
            warn!(
                "Coil load of {heat_flow:.1} W needs a log mean temperature difference of {lmtd_target:.2} K, limiting to {lmtd_max:.2} K"
            );
            lmtd_target = lmtd_max;
        }

        let residual = |delta_t_return: f64| calc_lmtd(delta_t_supply, delta_t_return) - lmtd_target;
        let lower = 1e-9 * delta_t_supply;
        let delta_t_return = if residual(lower) >= 0. {
            lower
        } else {
            let seed = t_return_seed.map(|t| self.direction * (t - t_contact));
            root_seeded(
                residual,
                seed,
                (lower, delta_t_supply),
                config.coil_tolerance,
                config.coil_max_iter,
            )?
        };
        let t_return = t_contact + self.direction * delta_t_return;

        Ok(WaterSide {
            t_supply,
            t_return,
            m_water: WATER.mass_flow_for_heat(heat_flow, t_supply, t_return).abs(),
        })
    }
}
