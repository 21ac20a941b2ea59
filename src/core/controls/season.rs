// This module classifies each hour by season and thermostat state, deciding which branch of
// the system dispatch runs.

use crate::input::HourlyDrivers;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, strum::Display)]
pub enum DispatchState {
    #[default]
    NoSeason,
    HeatingActive,
    CoolingActive,
    /// Inside a season but with the system switched off
    SystemOff,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlDecision {
    pub state: DispatchState,
    /// Indoor air temperature to reach, present in the active states only
    pub setpoint: Option<f64>,
}

impl ControlDecision {
    fn without_setpoint(state: DispatchState) -> Self {
        Self {
            state,
            setpoint: None,
        }
    }
}

/// Season and thermostat control of one building
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonControl {
    /// Cooling only starts once the indoor air of the previous hour is warmer than this, in
    /// deg C (the coldest air the cooling units can supply)
    t_cooling_threshold: f64,
}

impl SeasonControl {
    pub fn new(t_cooling_threshold: f64) -> Self {
        Self {
            t_cooling_threshold,
        }
    }

    /// Arguments:
    /// * `drivers` - season flags and thermostats of the hour
    /// * `t_int_prev` - indoor air temperature at the end of the previous hour, in deg C
    pub fn classify(&self, drivers: &HourlyDrivers, t_int_prev: f64) -> ControlDecision {
        match (drivers.heating_season, drivers.cooling_season) {
            (true, true) => {
                warn!("Heating and cooling season are both set, no system will operate this hour");
                ControlDecision::without_setpoint(DispatchState::NoSeason)
            }
            (false, false) => {
                debug!("Neither heating nor cooling season is set");
                ControlDecision::without_setpoint(DispatchState::NoSeason)
            }
            (true, false) => match drivers.heating_thermostat.control_temperature() {
                Some(setpoint) => ControlDecision {
                    state: DispatchState::HeatingActive,
                    setpoint: Some(setpoint),
                },
                None => ControlDecision::without_setpoint(DispatchState::SystemOff),
            },
            (false, true) => match drivers.cooling_thermostat.control_temperature() {
                Some(setpoint) if t_int_prev > self.t_cooling_threshold => ControlDecision {
                    state: DispatchState::CoolingActive,
                    setpoint: Some(setpoint),
                },
                _ => ControlDecision::without_setpoint(DispatchState::SystemOff),
            },
        }
    }
}
