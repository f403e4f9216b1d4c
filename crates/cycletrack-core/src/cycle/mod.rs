//! Cycle inference from raw observations.
//!
//! This module groups logged days into menstruation periods and ovulation
//! episodes, derives per-cycle averages over a lookback window, and numbers
//! the days of the luteal phase.

mod detector;
mod luteal;
mod stats;

pub use detector::{
    detect_menstruation_periods, detect_ovulation_episodes, group_consecutive_days,
    OvulationEpisode, Period, OVULATION_MAX_GAP_DAYS, PERIOD_MAX_GAP_DAYS,
};

pub use luteal::{all_luteal_phase_intervals, luteal_phase_day, LutealInterval, LUTEAL_OFFSET_DAYS};

pub use stats::{
    compute_cycle_stats, lookback_start, CycleStats, DEFAULT_BLEED_DURATION,
    DEFAULT_CYCLE_LENGTH, MAX_LOOKBACK_MONTHS, MIN_LOOKBACK_MONTHS,
};
