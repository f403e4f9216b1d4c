//! # Cycletrack Core Library
//!
//! This library provides the cycle inference and forecasting engine behind
//! Cycletrack, a daily fertility-observation log. Every engine operation is
//! a pure function over an immutable slice of observations, with "today"
//! passed in explicitly; the CLI binary is a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Cycle inference**: groups bleeding days into periods and fertile-sign
//!   days into ovulation episodes, derives lookback-window averages and
//!   luteal phase day numbers
//! - **Forecasting**: projects future menstruation, ovulation and fertile
//!   windows from the last period
//! - **Accuracy**: compares past forecasts with logged bleeding and scores
//!   delays, anticipations and day-level accuracy
//! - **Storage**: SQLite observation/forecast/correction storage and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`detect_menstruation_periods`] / [`detect_ovulation_episodes`]
//! - [`compute_cycle_stats`]
//! - [`luteal_phase_day`] / [`all_luteal_phase_intervals`]
//! - [`forecast_cycles`] / [`build_forecast_plan`]
//! - [`PredictionAccuracyTracker`]
//! - [`Database`] and [`Config`]

pub mod accuracy;
pub mod cycle;
pub mod error;
pub mod forecast;
pub mod observation;
pub mod simulation;
pub mod storage;

pub use accuracy::{
    compare_forecast_to_actual, compute_accuracy, compute_delays_and_anticipations,
    AccuracyReport, Correction, CorrectionKind, DayClassification, DayComparison, DelayRecord,
    DelayReport, PredictionAccuracyTracker,
};
pub use cycle::{
    all_luteal_phase_intervals, compute_cycle_stats, detect_menstruation_periods,
    detect_ovulation_episodes, luteal_phase_day, CycleStats, LutealInterval, OvulationEpisode,
    Period,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use forecast::{
    build_forecast_plan, derive_ovulation_windows, forecast_cycles, CycleSettings, ForecastKind,
    ForecastPlan, ForecastWindow,
};
pub use observation::{parse_date, BleedingLevel, Mucus, Observation, Sensation};
pub use simulation::{simulate_history, SimulationConfig};
pub use storage::{Config, Database, StoredForecast};
