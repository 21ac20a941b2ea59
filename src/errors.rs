use thiserror::Error;

/// Failure of a single building's simulation. Sibling buildings in a batch are unaffected.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Building input was considered invalid due to error: {0}")]
    InvalidInput(#[from] InputError),
    #[error("Numeric failure in hour {hour} of the simulation: {source}")]
    FailureInCalculation {
        hour: usize,
        #[source]
        source: CalculationError,
    },
}

impl SimulationError {
    pub(crate) fn at_hour(hour: usize, source: impl Into<CalculationError>) -> Self {
        Self::FailureInCalculation {
            hour,
            source: source.into(),
        }
    }
}

/// Errors identified while checking static or hourly inputs before the hourly scan starts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Validation of building properties failed: {0}")]
    Validation(#[from] serde_valid::validation::Errors),
    #[error("Expected {expected} hourly driver records but {actual} were given")]
    DriverCountMismatch { expected: usize, actual: usize },
    #[error("Building {building} has no hourly driver records")]
    NoDrivers { building: String },
    #[error("{0}")]
    Inconsistent(String),
}

/// Numeric failures that are fatal for the affected building.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error(transparent)]
    Demand(#[from] DemandError),
    #[error(transparent)]
    Coil(#[from] CoilError),
}

#[derive(Debug, Error, PartialEq)]
pub enum DemandError {
    #[error("Probe temperatures {t_free} and {t_probe} are indistinguishable, the thermal network is degenerate")]
    DegenerateNetwork { t_free: f64, t_probe: f64 },
    #[error("Thermal network produced a non-finite temperature ({0})")]
    NonFiniteTemperature(f64),
}

#[derive(Debug, Error)]
pub enum CoilError {
    #[error("Water return temperature of coil could not be solved: {0}")]
    NonConvergence(#[from] anyhow::Error),
    #[error("Coil contact temperature could not be derived for air flow {mass_flow} kg/s (effectiveness {effectiveness})")]
    NoEffectiveness { mass_flow: f64, effectiveness: f64 },
    #[error("Coil contact temperature {t_contact} is not reachable with water supplied at {t_water_supply}")]
    ContactBeyondWaterSupply { t_contact: f64, t_water_supply: f64 },
}
