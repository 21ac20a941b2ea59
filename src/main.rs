extern crate rc_demand;

use clap::Parser;
use rc_demand::output_writer::FileOutputWriter;
use rc_demand::run_project;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct RcDemandArgs {
    input_file: String,
    /// Directory for the result files (defaults to the directory of the input file)
    #[arg(long, short)]
    output_dir: Option<String>,
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = RcDemandArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let input_path = Path::new(args.input_file.as_str());
    let input_file_stem = input_path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("results");
    let output_dir = match args.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let output = FileOutputWriter::new(output_dir, format!("{input_file_stem}__{{}}_results.{{}}"));

    let results = run_project(BufReader::new(File::open(input_path)?), &output)?;

    let mut failures = 0;
    for (name, result) in &results {
        match result {
            Ok(building) => info!(
                "{name}: heating {:.1} kWh, cooling {:.1} kWh",
                building.summary.heating_sensible, building.summary.cooling_sensible
            ),
            Err(_) => failures += 1,
        }
    }
    if failures > 0 {
        warn!("{failures} of {} buildings failed", results.len());
    }

    Ok(())
}
