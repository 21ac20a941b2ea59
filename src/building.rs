use crate::core::controls::season::DispatchState;
use crate::core::dispatch::{CarriedState, SystemDispatch};
use crate::errors::{InputError, SimulationError};
use crate::input::{BuildingInput, Input, KeyString, SimulationConfig};
use crate::output::{AnnualSummary, HourlyResult, SystemStatus, SystemStatusSet};
use crate::simulation_time::SimulationTime;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use serde_valid::Validate;
use tracing::{debug, warn};

/// Hourly records of one building, in input order, with their totals
#[derive(Clone, Debug, Serialize)]
pub struct BuildingResults {
    pub hourly: Vec<HourlyResult>,
    pub summary: AnnualSummary,
}

/// Simulate one building over the whole period.
///
/// The hours are a left-to-right scan: each hour reads the state left by the previous one,
/// so they are never evaluated out of order.
///
/// Arguments:
/// * `name` - key of the building, used in diagnostics
/// * `input` - static properties and hourly drivers of the building
/// * `simulation_time` - simulated period, one driver record per hour
/// * `config` - numeric tolerances and iteration limits
pub fn simulate_building(
    name: &str,
    input: &BuildingInput,
    simulation_time: &SimulationTime,
    config: &SimulationConfig,
) -> Result<BuildingResults, SimulationError> {
    config.validate().map_err(InputError::from)?;
    input.validate_for(name, simulation_time)?;

    let dispatch = SystemDispatch::new(input, config)?;
    let mut carried = CarriedState::initial(&input.drivers[0]);
    let mut hourly = Vec::with_capacity(input.drivers.len());

    for (simtime, drivers) in simulation_time.iter().zip(&input.drivers) {
        let (result, next) = dispatch
            .step(&simtime, drivers, &carried)
            .map_err(|err| SimulationError::at_hour(simtime.index, err))?;
        hourly.push(result);
        carried = next;
    }

    let unserved = hourly
        .iter()
        .filter(|result| {
            matches!(
                result.state,
                DispatchState::HeatingActive | DispatchState::CoolingActive
            ) && result.status == SystemStatusSet::all(SystemStatus::NoSystem)
        })
        .count();
    if unserved > 0 {
        warn!("Building {name}: {unserved} hours called for heating or cooling without a system to provide it");
    }

    let summary = AnnualSummary::from_hourly(&hourly);
    debug!(
        "Building {name}: {:.1} kWh heating, {:.1} kWh cooling",
        summary.heating_sensible, summary.cooling_sensible
    );

    Ok(BuildingResults { hourly, summary })
}

/// Simulate every building of the input independently. A failure is reported against its
/// own building and leaves the others untouched.
pub fn simulate_buildings(
    input: &Input,
) -> IndexMap<KeyString, Result<BuildingResults, SimulationError>> {
    input
        .buildings
        .par_iter()
        .map(|(name, building)| {
            (
                name.clone(),
                simulate_building(name, building, &input.simulation_time, &input.config),
            )
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
