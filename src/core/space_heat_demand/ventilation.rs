// This module provides the natural ventilation airflow network of a single zone.
// The calculations follow the leakage and ventilation opening paths of EN 15242:
// each path carries a volume flow driven by wind and stack pressure, and the zone
// reference pressure is found by balancing the mass flows entering and leaving.

use crate::core::material_properties::{air_density, AIR, TEMP_AIR_REF};
use crate::core::solvers::minimize_bounded;
use crate::core::units::{kg_per_h_to_kg_per_s, CENTIMETRES_SQUARED_PER_METRE_SQUARED, KELVIN_OFFSET_SIMPLIFIED, SECONDS_PER_HOUR};
use crate::input::{NaturalVentilationInput, ShieldingClass, SimulationConfig};
use itertools::izip;
use tracing::warn;

// Gravitational constant in m/s2
const G: f64 = 9.81;
// Flow exponent of leakage paths
const N_LEAKAGE: f64 = 0.667;
// Flow exponent of ventilation openings
const N_VENT: f64 = 0.5;
// Reference pressure difference of the air tightness test, in Pa
const DELTA_P_LEAKAGE_REF: f64 = 50.;
// Discharge coefficient of ventilation openings
const C_D_VENT: f64 = 0.6;
// Wind speed reduction from meteorological station to an urban site (terrain class 2)
const F_WIND_SITE: f64 = 0.8;
// Margin added around the bracket of balancing pressures, in Pa
const P_BRACKET_MARGIN: f64 = 1.;
// Absolute tolerance on the reference pressure passed to the minimiser, in Pa
const P_REF_XTOL: f64 = 1e-10;

// Wind pressure coefficients with cross ventilation (EN 15242 Table B.5).
// Rows: height band (below 15 m, 15 to 50 m, above 50 m) shifted by shielding class.
// Columns: windward facade, leeward facade, roof below 10 deg, 10 to 30 deg, above 30 deg.
const CP_CROSS_VENTILATION: [[f64; 5]; 7] = [
    [0.5, -0.7, -0.7, -0.6, -0.2],
    [0.25, -0.5, -0.6, -0.5, -0.2],
    [0.05, -0.3, -0.5, -0.4, -0.2],
    [0.65, -0.7, -0.7, -0.6, -0.2],
    [0.45, -0.5, -0.6, -0.5, -0.2],
    [0.25, -0.3, -0.5, -0.4, -0.2],
    [0.8, -0.7, -0.7, -0.6, -0.2],
];
// Wind pressure coefficients without cross ventilation (EN 15242 Table B.6)
const CP_SINGLE_SIDED: [f64; 3] = [0.05, -0.05, 0.];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathOrientation {
    Windward,
    Leeward,
    Roof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeightBand {
    Below15,
    Between15And50,
    Above50,
}

impl HeightBand {
    pub fn from_height(height: f64) -> Self {
        if height < 15. {
            HeightBand::Below15
        } else if height < 50. {
            HeightBand::Between15And50
        } else {
            HeightBand::Above50
        }
    }

    fn row(&self) -> usize {
        match self {
            HeightBand::Below15 => 0,
            HeightBand::Between15And50 => 3,
            HeightBand::Above50 => 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoofSlopeClass {
    Below10,
    Between10And30,
    Above30,
}

impl RoofSlopeClass {
    pub fn from_slope(slope: f64) -> Self {
        if slope < 10. {
            RoofSlopeClass::Below10
        } else if slope <= 30. {
            RoofSlopeClass::Between10And30
        } else {
            RoofSlopeClass::Above30
        }
    }
}

fn shielding_offset(shielding: ShieldingClass) -> usize {
    match shielding {
        ShieldingClass::Open => 0,
        ShieldingClass::Normal => 1,
        ShieldingClass::Shielded => 2,
    }
}

/// Wind pressure coefficient of a path
pub fn wind_pressure_coefficient(
    orientation: PathOrientation,
    height: HeightBand,
    shielding: ShieldingClass,
    roof_slope: RoofSlopeClass,
    cross_ventilation: bool,
) -> f64 {
    if !cross_ventilation {
        return match orientation {
            PathOrientation::Windward => CP_SINGLE_SIDED[0],
            PathOrientation::Leeward => CP_SINGLE_SIDED[1],
            PathOrientation::Roof => CP_SINGLE_SIDED[2],
        };
    }

    let row = (height.row() + shielding_offset(shielding)).min(6);
    let column = match orientation {
        PathOrientation::Windward => 0,
        PathOrientation::Leeward => 1,
        PathOrientation::Roof => match roof_slope {
            RoofSlopeClass::Below10 => 2,
            RoofSlopeClass::Between10And30 => 3,
            RoofSlopeClass::Above30 => 4,
        },
    };

    CP_CROSS_VENTILATION[row][column]
}

/// Calculate pressure difference between the exterior and the interior of the zone
/// for a flow path (at its elevation above the zone floor), in Pa
///
/// Arguments:
/// * `h_path` - height of air flow path (m)
/// * `c_p_path` - wind pressure coefficient
/// * `u_site` - wind velocity at site (m/s)
/// * `t_e` - external air temperature (deg C)
/// * `t_z` - zone air temperature (deg C)
/// * `p_z_ref` - internal reference pressure (Pa)
fn calculate_pressure_difference_at_an_airflow_path(
    h_path: f64,
    c_p_path: f64,
    u_site: f64,
    t_e: f64,
    t_z: f64,
    p_z_ref: f64,
) -> f64 {
    let p_e_path = AIR.density()
        * (0.5 * c_p_path * u_site.powi(2)
            - h_path * G * TEMP_AIR_REF / (t_e + KELVIN_OFFSET_SIMPLIFIED));
    let p_z_path = p_z_ref - stack_pressure(h_path, t_z);
    p_e_path - p_z_path
}

fn stack_pressure(h_path: f64, t: f64) -> f64 {
    AIR.density() * h_path * G * TEMP_AIR_REF / (t + KELVIN_OFFSET_SIMPLIFIED)
}

/// A leakage path or ventilation opening with a power-law flow characteristic
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AirflowPath {
    /// Flow coefficient, in m3/(h.Pa^n)
    pub coefficient: f64,
    pub exponent: f64,
    /// Height above zone floor, in m
    pub height: f64,
    pub orientation: PathOrientation,
    pub wind_pressure_coefficient: f64,
}

impl AirflowPath {
    /// Volume flow through the path, positive into the zone, in m3/h
    fn volume_flow(&self, delta_p: f64) -> f64 {
        self.coefficient * delta_p.signum() * delta_p.abs().powf(self.exponent)
    }

    /// Reference pressure at which the path carries no flow
    fn neutral_pressure(&self, u_site: f64, t_e: f64, t_z: f64) -> f64 {
        calculate_pressure_difference_at_an_airflow_path(
            self.height,
            self.wind_pressure_coefficient,
            u_site,
            t_e,
            t_z,
            0.,
        )
    }
}

/// Result of balancing the zone reference pressure for one hour
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NaturalVentilationFlows {
    /// Air mass flow entering the zone, in kg/s
    pub m_in: f64,
    /// Air mass flow leaving the zone, in kg/s (negative)
    pub m_out: f64,
    /// Zone reference pressure, in Pa
    pub p_ref: f64,
    pub converged: bool,
}

/// Static airflow paths of a building, built once and reused every hour
#[derive(Clone, Debug, PartialEq)]
pub struct VentilationPathNetwork {
    paths: Vec<AirflowPath>,
}

impl VentilationPathNetwork {
    /// Arguments:
    /// * `input` - geometry, air tightness and exposure of the building
    /// * `volume` - air volume of the zone, in m3
    pub fn new(input: &NaturalVentilationInput, volume: f64) -> Self {
        let height_band = |h: f64| HeightBand::from_height(h);
        let roof_slope = RoofSlopeClass::from_slope(input.roof_slope);
        let cp = |orientation, h| {
            wind_pressure_coefficient(
                orientation,
                height_band(h),
                input.shielding,
                roof_slope,
                input.cross_ventilation,
            )
        };

        // leakage coefficient of the zone, split between facades and roof by area
        let coeff_leakage_zone =
            input.n50 * volume / DELTA_P_LEAKAGE_REF.powf(N_LEAKAGE);
        let area_envelope = input.area_facade + input.area_roof;
        let facade_share = if area_envelope > 0. {
            input.area_facade / area_envelope
        } else {
            1.
        };
        let coeff_leakage_facade = coeff_leakage_zone * facade_share;
        let coeff_leakage_roof = coeff_leakage_zone * (1. - facade_share);

        let coeff_vent_zone = SECONDS_PER_HOUR as f64
            / CENTIMETRES_SQUARED_PER_METRE_SQUARED as f64
            * C_D_VENT
            * input.area_vent_openings
            * (2. / AIR.density()).sqrt();

        let facade_heights = [0.25, 0.25, 0.75, 0.75].map(|f| f * input.height);
        let facade_orientations = [
            PathOrientation::Windward,
            PathOrientation::Leeward,
            PathOrientation::Windward,
            PathOrientation::Leeward,
        ];

        let mut paths = Vec::with_capacity(9);
        for (coefficient, exponent) in [
            (coeff_leakage_facade, N_LEAKAGE),
            (coeff_vent_zone, N_VENT),
        ] {
            for (height, orientation) in izip!(facade_heights, facade_orientations) {
                paths.push(AirflowPath {
                    coefficient: 0.25 * coefficient,
                    exponent,
                    height,
                    orientation,
                    wind_pressure_coefficient: cp(orientation, height),
                });
            }
        }
        paths.push(AirflowPath {
            coefficient: coeff_leakage_roof,
            exponent: N_LEAKAGE,
            height: input.height,
            orientation: PathOrientation::Roof,
            wind_pressure_coefficient: cp(PathOrientation::Roof, input.height),
        });

        Self { paths }
    }

    pub fn paths(&self) -> &[AirflowPath] {
        &self.paths
    }

    /// Air mass flows into and out of the zone at a reference pressure, in kg/h
    pub fn mass_flows_at(&self, p_ref: f64, t_zone: f64, t_ext: f64, u_site: f64) -> (f64, f64) {
        let (mut qv_in, mut qv_out) = (0., 0.);
        for path in &self.paths {
            let delta_p = calculate_pressure_difference_at_an_airflow_path(
                path.height,
                path.wind_pressure_coefficient,
                u_site,
                t_ext,
                t_zone,
                p_ref,
            );
            let qv = path.volume_flow(delta_p);
            if qv > 0. {
                qv_in += qv;
            } else {
                qv_out += qv;
            }
        }

        (qv_in * air_density(t_ext), qv_out * air_density(t_zone))
    }

    /// Find the zone reference pressure that balances inflow and outflow.
    ///
    /// Non-convergence is not an error: the best pressure found is reported with
    /// `converged` set to false.
    ///
    /// Arguments:
    /// * `t_zone` - zone air temperature, in deg C
    /// * `t_ext` - outdoor air temperature, in deg C
    /// * `u_wind_10` - meteorological wind speed at 10 m, in m/s
    /// * `config` - tolerance and iteration limit of the balance
    pub fn solve(
        &self,
        t_zone: f64,
        t_ext: f64,
        u_wind_10: f64,
        config: &SimulationConfig,
    ) -> NaturalVentilationFlows {
        let u_site = F_WIND_SITE * u_wind_10;
        let imbalance = |p_ref: f64| {
            let (qm_in, qm_out) = self.mass_flows_at(p_ref, t_zone, t_ext, u_site);
            (qm_in + qm_out).abs()
        };

        // the balance is monotonic in the reference pressure, so the root lies between the
        // pressures at which the first and the last path reverse
        let (p_low, p_high) = self
            .paths
            .iter()
            .map(|path| path.neutral_pressure(u_site, t_ext, t_zone))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        let (p_low, p_high) = if p_low.is_finite() && p_high.is_finite() {
            (p_low - P_BRACKET_MARGIN, p_high + P_BRACKET_MARGIN)
        } else {
            (-P_BRACKET_MARGIN, P_BRACKET_MARGIN)
        };

        let (p_ref, residual) = match minimize_bounded(
            &imbalance,
            p_low,
            p_high,
            P_REF_XTOL,
            config.airflow_max_iter,
        ) {
            Ok(minimum) => (minimum.x, minimum.cost),
            Err(e) => {
                warn!("Natural ventilation balance failed ({e}), using the bracket midpoint");
                let p_mid = 0.5 * (p_low + p_high);
                (p_mid, imbalance(p_mid))
            }
        };

        let (qm_in, qm_out) = self.mass_flows_at(p_ref, t_zone, t_ext, u_site);
        let converged = residual <= config.airflow_tolerance * qm_in.max(1.);
        if !converged {
            warn!(
                "Natural ventilation balance did not converge: inflow {qm_in:.3} kg/h, outflow {qm_out:.3} kg/h"
            );
        }

        NaturalVentilationFlows {
            m_in: kg_per_h_to_kg_per_s(qm_in),
            m_out: kg_per_h_to_kg_per_s(qm_out),
            p_ref,
            converged,
        }
    }
}
