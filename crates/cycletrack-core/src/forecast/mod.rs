//! Cycle forecasting.
//!
//! The generator holds the pure window arithmetic; the planner wires it to
//! cycle statistics so callers can go straight from observations to a
//! complete set of forecast windows.

mod generator;
mod planner;

pub use generator::{
    derive_ovulation_windows, forecast_cycles, period_end_marker, validate_count, ForecastKind,
    ForecastWindow, FERTILE_CONFIDENCE, FERTILE_SPAN_DAYS, MENSTRUATION_CONFIDENCE,
    OVULATION_CONFIDENCE, PERIOD_END_CONFIDENCE,
};

pub use planner::{build_forecast_plan, CycleSettings, ForecastPlan};
