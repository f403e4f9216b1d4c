//! Forecast accuracy module.
//!
//! Measures how well past forecasts matched logged bleeding: per-day
//! classification, delay/anticipation detection, and an overall score.

mod tracker;

pub use tracker::{
    compare_forecast_to_actual, compute_accuracy, compute_delays_and_anticipations,
    AccuracyReport, Correction, CorrectionKind, DayClassification, DayComparison, DelayRecord,
    DelayReport, PredictionAccuracyTracker,
};
