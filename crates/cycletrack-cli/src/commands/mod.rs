pub mod accuracy;
pub mod config;
pub mod cycle;
pub mod forecast;
pub mod observe;
pub mod simulate;

use chrono::NaiveDate;
use serde::Serialize;

use cycletrack_core::ValidationError;

/// clap value parser for `YYYY-MM-DD` arguments.
pub fn parse_day(input: &str) -> Result<NaiveDate, ValidationError> {
    cycletrack_core::parse_date(input)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
