// This module provides the losses of space heating and cooling emission systems, following
// prEN 15316-2:2014 (equivalent increase of the room temperature caused by the emitter),
// with the losses capped at the installed capacity.

use crate::input::{CoolingTopology, HeatingTopology};

// Temperature difference below which the loss relation is not evaluated, in K
const MIN_TEMPERATURE_DIFFERENCE: f64 = 1e-6;
// Solar contribution to the combined outdoor temperature in the cooling case, in K
const DELTA_THETA_E_SOL_LOW_GLAZING: f64 = 8.;
const DELTA_THETA_E_SOL_HIGH_GLAZING: f64 = 12.;
const HIGH_GLAZING_WINDOW_TO_WALL_RATIO: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmissionSystem {
    Radiator,
    FloorHeating,
    CentralAcHeating,
    LocalAc,
    CentralAcCooling,
    ThreeForTwo,
    CeilingRadiative,
    None,
}

impl From<HeatingTopology> for EmissionSystem {
    fn from(topology: HeatingTopology) -> Self {
        match topology {
            HeatingTopology::Radiator => EmissionSystem::Radiator,
            HeatingTopology::FloorHeating => EmissionSystem::FloorHeating,
            HeatingTopology::CentralAc => EmissionSystem::CentralAcHeating,
            HeatingTopology::None => EmissionSystem::None,
        }
    }
}

impl From<CoolingTopology> for EmissionSystem {
    fn from(topology: CoolingTopology) -> Self {
        match topology {
            CoolingTopology::LocalAc => EmissionSystem::LocalAc,
            CoolingTopology::CentralAc => EmissionSystem::CentralAcCooling,
            CoolingTopology::ThreeForTwo => EmissionSystem::ThreeForTwo,
            CoolingTopology::CeilingRadiative => EmissionSystem::CeilingRadiative,
            CoolingTopology::None => EmissionSystem::None,
        }
    }
}

impl EmissionSystem {
    /// Equivalent increase of the room temperature caused by the emitter, in K
    pub fn delta_theta_int_inc(&self) -> f64 {
        match self {
            EmissionSystem::Radiator => 1.7,
            EmissionSystem::FloorHeating => 1.2,
            EmissionSystem::CentralAcHeating => 1.5,
            EmissionSystem::LocalAc => -1.2,
            EmissionSystem::CentralAcCooling => -1.,
            EmissionSystem::ThreeForTwo => -1.2,
            EmissionSystem::CeilingRadiative => -1.6,
            EmissionSystem::None => 0.,
        }
    }

    fn is_cooling(&self) -> bool {
        matches!(
            self,
            EmissionSystem::LocalAc
                | EmissionSystem::CentralAcCooling
                | EmissionSystem::ThreeForTwo
                | EmissionSystem::CeilingRadiative
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmissionLoss {
    /// Emission losses, in W (same sign as the load)
    pub q_em_ls: f64,
    /// Load over installed capacity
    pub load_ratio: f64,
}

/// Arguments:
/// * `system` - emission system delivering the load
/// * `q_em_out` - heat emitted to the zone, in W (negative for cooling)
/// * `q_em_max` - installed capacity, in W (negative for cooling)
/// * `t_int` - indoor air temperature, in deg C
/// * `t_ext` - outdoor air temperature, in deg C
/// * `window_to_wall_ratio` - glazed share of the facade
pub fn calc_emission_losses(
    system: EmissionSystem,
    q_em_out: f64,
    q_em_max: f64,
    t_int: f64,
    t_ext: f64,
    window_to_wall_ratio: f64,
) -> EmissionLoss {
    let load_ratio = if q_em_max != 0. {
        q_em_out / q_em_max
    } else {
        0.
    };

    let delta_theta_int_inc = system.delta_theta_int_inc();
    let theta_int_inc = t_int + delta_theta_int_inc;
    let theta_e_comb = if system.is_cooling() {
        t_ext
            + if window_to_wall_ratio < HIGH_GLAZING_WINDOW_TO_WALL_RATIO {
                DELTA_THETA_E_SOL_LOW_GLAZING
            } else {
                DELTA_THETA_E_SOL_HIGH_GLAZING
            }
    } else {
        t_ext
    };

    let q_em_ls = if (theta_int_inc - theta_e_comb).abs() < MIN_TEMPERATURE_DIFFERENCE {
        0.
    } else {
        let mut q_em_ls = q_em_out * delta_theta_int_inc / (theta_int_inc - theta_e_comb);
        if (q_em_ls + q_em_out).abs() > q_em_max.abs() {
            q_em_ls = q_em_max - q_em_out;
        }
        if q_em_ls.signum() != q_em_out.signum() || q_em_out == 0. {
            q_em_ls = 0.;
        }
        q_em_ls
    };

    EmissionLoss {
        q_em_ls,
        load_ratio,
    }
}
