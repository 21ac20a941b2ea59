pub mod demand;
pub mod moisture;
pub mod rc_model;
pub mod ventilation;

#[cfg(test)]
pub(crate) mod test_fixtures;
