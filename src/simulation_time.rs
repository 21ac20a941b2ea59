use crate::core::units::HOURS_PER_YEAR;
use serde::{Deserialize, Serialize};

// # Define hours that start each month (and end next month). Note there are 13
// # values so that end of final month is handled correctly.
// # E.g. Jan is hours 0-743
const MONTH_START_END_HOURS: [u32; 13] = [
    0, 744, 1416, 2160, 2880, 3624, 4344, 5088, 5832, 6552, 7296, 8016, 8760,
];

/// Simulated period as a half-open range of hours of the year, stepped hourly.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationTime {
    #[serde(rename = "start")]
    start_hour: u32,
    #[serde(rename = "end")]
    end_hour: u32,
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::full_year()
    }
}

impl SimulationTime {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn full_year() -> Self {
        Self::new(0, HOURS_PER_YEAR)
    }

    pub fn total_steps(&self) -> usize {
        self.end_hour.saturating_sub(self.start_hour) as usize
    }

    pub fn iter(&self) -> SimulationTimeIterator {
        SimulationTimeIterator {
            current_hour: self.start_hour,
            current_index: 0,
            simulation_time: *self,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimulationTimeIterator {
    current_hour: u32,
    current_index: usize,
    simulation_time: SimulationTime,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTimeIteration {
    pub index: usize,
    pub hour_of_year: u32,
}

/// Zero-based month of an hour of the year, wrapping for periods that run past one year
pub fn month_of_hour(hour_of_year: u32) -> usize {
    let hour = hour_of_year % HOURS_PER_YEAR;
    MONTH_START_END_HOURS
        .iter()
        .skip(1)
        .position(|end_hour| hour < *end_hour)
        .unwrap_or(11)
}

impl Iterator for SimulationTimeIterator {
    type Item = SimulationTimeIteration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_hour >= self.simulation_time.end_hour {
            return None;
        }
        let item = SimulationTimeIteration {
            index: self.current_index,
            hour_of_year: self.current_hour,
        };
        self.current_hour += 1;
        self.current_index += 1;

        Some(item)
    }
}
