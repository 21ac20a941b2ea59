pub mod air_handling;
pub mod controls;
pub mod dispatch;
pub mod emission_losses;
pub mod material_properties;
pub mod psychrometrics;

pub(crate) mod solvers;
pub mod space_heat_demand;
pub mod units;
