// Moisture balance of the zone air and the humidity control loads derived from it.
// Positive flows add water to the zone, negative flows remove it; all in kg/s.

use crate::core::material_properties::AIR;
use crate::core::psychrometrics::moisture_content;
use crate::core::units::SECONDS_PER_HOUR;

/// Water and air flows acting on the zone air during one hour
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoistureFlows {
    /// Moisture released by occupants and processes
    pub internal_gains: f64,
    pub m_mech: f64,
    pub x_mech: f64,
    /// Outdoor air entering through windows and infiltration
    pub m_outdoor: f64,
    pub x_ext: f64,
    pub humidification: f64,
    pub dehumidification: f64,
}

impl MoistureFlows {
    fn incoming_air(&self) -> f64 {
        self.m_mech + self.m_outdoor
    }
}

/// Mass of dry air held in the zone, in kg
pub fn zone_air_mass(volume: f64) -> f64 {
    volume * AIR.density()
}

/// Moisture content of the zone air at the end of the hour (implicit step).
///
/// Arguments:
/// * `x_prev` - moisture content at the end of the previous hour, in kg/kg
/// * `air_mass` - mass of zone air, in kg
/// * `flows` - moisture and air flows during the hour
pub fn calc_moisture_content_in_zone(x_prev: f64, air_mass: f64, flows: &MoistureFlows) -> f64 {
    let dt = SECONDS_PER_HOUR as f64;
    let sources = flows.internal_gains
        + flows.m_mech * flows.x_mech
        + flows.m_outdoor * flows.x_ext
        + flows.humidification
        + flows.dehumidification;

    ((x_prev * air_mass + dt * sources) / (air_mass + dt * flows.incoming_air())).max(0.)
}

/// Water added to the supply air so that it reaches the lower comfort limit at the zone
/// temperature. Never negative.
pub fn calc_humidification_moisture_load(
    t_int: f64,
    rh_min: f64,
    m_mech: f64,
    x_mech: f64,
) -> f64 {
    let x_set_min = moisture_content(t_int, rh_min);
    (m_mech * (x_set_min - x_mech)).max(0.)
}

/// Water that would have to be removed during the hour to keep the zone at the upper
/// comfort limit. Never positive.
pub fn calc_dehumidification_moisture_load(
    x_prev: f64,
    air_mass: f64,
    flows: &MoistureFlows,
    t_int: f64,
    rh_max: f64,
) -> f64 {
    let uncontrolled = MoistureFlows {
        dehumidification: 0.,
        ..*flows
    };
    let x_free = calc_moisture_content_in_zone(x_prev, air_mass, &uncontrolled);
    let x_set_max = moisture_content(t_int, rh_max);

    if x_free <= x_set_max {
        return 0.;
    }
    let dt = SECONDS_PER_HOUR as f64;

    (x_set_max - x_free) * (air_mass + dt * flows.incoming_air()) / dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::psychrometrics::relative_humidity;
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn flows() -> MoistureFlows {
        MoistureFlows {
            internal_gains: 2e-5,
            m_mech: 0.2,
            x_mech: 0.007,
            m_outdoor: 0.05,
            x_ext: 0.009,
            humidification: 0.,
            dehumidification: 0.,
        }
    }

    #[rstest]
    fn test_balance_without_sources_keeps_moisture() {
        let x = calc_moisture_content_in_zone(0.008, 300., &MoistureFlows::default());
        assert_relative_eq!(x, 0.008);
    }

    #[rstest]
    fn test_balance_tends_to_supply_moisture(flows: MoistureFlows) {
        let flows = MoistureFlows {
            internal_gains: 0.,
            x_ext: flows.x_mech,
            ..flows
        };
        let x = calc_moisture_content_in_zone(0.012, 300., &flows);
        assert!(x < 0.012 && x > flows.x_mech);
    }

    #[rstest]
    fn test_humidification_only_adds_water() {
        // dry winter supply air
        let g_hu = calc_humidification_moisture_load(21., 30., 0.2, 0.001);
        assert!(g_hu > 0.);
        assert_relative_eq!(
            g_hu,
            0.2 * (moisture_content(21., 30.) - 0.001),
            max_relative = 1e-12
        );
        assert_relative_eq!(calc_humidification_moisture_load(21., 30., 0.2, 0.012), 0.);
    }

    #[rstest]
    fn test_dehumidification_reaches_upper_limit() {
        // humid summer air and a crowded zone
        let flows = MoistureFlows {
            internal_gains: 5e-4,
            m_mech: 0.05,
            x_mech: 0.015,
            m_outdoor: 0.02,
            x_ext: 0.016,
            humidification: 0.,
            dehumidification: 0.,
        };
        let air_mass = zone_air_mass(500.);
        let x_prev = 0.014;
        let g_dhu = calc_dehumidification_moisture_load(x_prev, air_mass, &flows, 24., 70.);
        assert!(g_dhu < 0.);

        let controlled = MoistureFlows {
            dehumidification: g_dhu,
            ..flows
        };
        let x = calc_moisture_content_in_zone(x_prev, air_mass, &controlled);
        assert_relative_eq!(relative_humidity(24., x), 70., max_relative = 1e-9);
    }

    #[rstest]
    fn test_no_dehumidification_in_dry_zone(flows: MoistureFlows) {
        let g_dhu = calc_dehumidification_moisture_load(0.006, 300., &flows, 24., 70.);
        assert_relative_eq!(g_dhu, 0.);
    }
}
