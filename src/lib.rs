#![allow(clippy::too_many_arguments)]

pub mod building;
pub mod core;
pub mod errors;
pub mod input;
pub mod output;
pub mod output_writer;
pub mod simulation_time;

#[cfg(test)]
mod tests;

#[macro_use]
extern crate is_close;

use crate::building::{simulate_buildings, BuildingResults};
use crate::errors::SimulationError;
use crate::input::{ingest_for_processing, KeyString};
use crate::output::{HourlyResult, HOURLY_COLUMNS};
use crate::output_writer::OutputWriter;
use csv::WriterBuilder;
use indexmap::IndexMap;
use std::io::Read;
use tracing::{error, info};

pub type RunResults = IndexMap<KeyString, Result<BuildingResults, SimulationError>>;

/// Read a project, simulate all of its buildings and write the results of each successful
/// building. Failed buildings are logged and returned with their error; they never stop
/// the rest of the batch.
pub fn run_project(input: impl Read, output: impl OutputWriter) -> anyhow::Result<RunResults> {
    let input = ingest_for_processing(input)?;
    info!(
        "Simulating {} buildings over {} hours",
        input.buildings.len(),
        input.simulation_time.total_steps()
    );

    let results = simulate_buildings(&input);

    for (name, result) in &results {
        match result {
            Ok(building) => {
                if !output.is_noop() {
                    write_hourly_output_file(&output, name, &building.hourly)?;
                    write_summary_output_file(&output, name, building)?;
                }
            }
            Err(err) => error!("Building {name} failed: {err}"),
        }
    }

    Ok(results)
}

fn write_hourly_output_file(
    output: &impl OutputWriter,
    building_key: &str,
    hourly: &[HourlyResult],
) -> anyhow::Result<()> {
    info!("writing out hourly results of {building_key}");
    let writer = output.writer_for_building(building_key, "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(HOURLY_COLUMNS.iter().map(|(heading, _)| *heading))?;
    writer.write_record(HOURLY_COLUMNS.iter().map(|(_, unit)| *unit))?;
    for result in hourly {
        writer.write_record(result.csv_row())?;
    }
    writer.flush()?;

    Ok(())
}

fn write_summary_output_file(
    output: &impl OutputWriter,
    building_key: &str,
    building: &BuildingResults,
) -> anyhow::Result<()> {
    let writer = output.writer_for_building(building_key, "json")?;
    serde_json::to_writer_pretty(writer, &building.summary)?;

    Ok(())
}
