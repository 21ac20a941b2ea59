pub const WATTS_PER_KILOWATT: u32 = 1_000;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const HOURS_PER_YEAR: u32 = HOURS_PER_DAY * DAYS_PER_YEAR;
pub const CENTIMETRES_SQUARED_PER_METRE_SQUARED: u32 = 10_000;

/// Offset between Celsius and Kelvin used by the simplified air density and stack
/// pressure relations (EN 15242), which work with 273 rather than 273.15.
pub(crate) const KELVIN_OFFSET_SIMPLIFIED: f64 = 273.;

pub(crate) fn kg_per_s_to_kg_per_h(mass_flow: f64) -> f64 {
    mass_flow * SECONDS_PER_HOUR as f64
}

pub(crate) fn kg_per_h_to_kg_per_s(mass_flow: f64) -> f64 {
    mass_flow / SECONDS_PER_HOUR as f64
}

/// Convert an hourly power series (W) into an energy total (kWh)
pub fn sum_hourly_watts_to_kwh(series: impl IntoIterator<Item = f64>) -> f64 {
    series.into_iter().sum::<f64>() / WATTS_PER_KILOWATT as f64
}
