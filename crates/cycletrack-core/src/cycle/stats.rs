//! Cycle statistics over a trailing lookback window.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::detector::{detect_menstruation_periods, Period};
use crate::error::ValidationError;
use crate::observation::Observation;

/// Cycle length used when fewer than two periods are known.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// Bleed duration used when no period is known.
pub const DEFAULT_BLEED_DURATION: u32 = 5;

/// Smallest accepted lookback window.
pub const MIN_LOOKBACK_MONTHS: u32 = 1;

/// Largest accepted lookback window.
pub const MAX_LOOKBACK_MONTHS: u32 = 24;

/// Averages derived from the periods inside the lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStats {
    pub average_cycle_length: u32,
    pub average_bleed_duration: u32,
    /// Periods detected inside the window, oldest first.
    pub periods: Vec<Period>,
}

impl CycleStats {
    /// Most recent period inside the window, if any.
    pub fn last_period(&self) -> Option<&Period> {
        self.periods.last()
    }

    /// Number of start-to-start samples behind `average_cycle_length`.
    pub fn cycle_samples(&self) -> usize {
        self.periods.len().saturating_sub(1)
    }
}

/// First day of the lookback window ending at `today`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLookback`] when `lookback_months` is
/// zero or above [`MAX_LOOKBACK_MONTHS`].
pub fn lookback_start(today: NaiveDate, lookback_months: u32) -> Result<NaiveDate, ValidationError> {
    if !(MIN_LOOKBACK_MONTHS..=MAX_LOOKBACK_MONTHS).contains(&lookback_months) {
        return Err(ValidationError::InvalidLookback {
            months: i64::from(lookback_months),
            min: MIN_LOOKBACK_MONTHS,
            max: MAX_LOOKBACK_MONTHS,
        });
    }
    today
        .checked_sub_months(Months::new(lookback_months))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "today".to_string(),
            message: format!("{today} minus {lookback_months} months is out of range"),
        })
}

/// Compute average cycle length and bleed duration from the observations
/// dated within `[today - lookback_months, today]`.
///
/// Averages are rounded half-up. With fewer than two periods the cycle length
/// falls back to [`DEFAULT_CYCLE_LENGTH`]; with no period the duration falls
/// back to [`DEFAULT_BLEED_DURATION`].
///
/// # Errors
///
/// Fails only for an invalid lookback window.
pub fn compute_cycle_stats(
    observations: &[Observation],
    lookback_months: u32,
    today: NaiveDate,
) -> Result<CycleStats, ValidationError> {
    let window_start = lookback_start(today, lookback_months)?;
    let in_window: Vec<Observation> = observations
        .iter()
        .filter(|o| window_start <= o.date && o.date <= today)
        .cloned()
        .collect();

    let periods = detect_menstruation_periods(&in_window);

    let cycle_lengths: Vec<i64> = periods
        .windows(2)
        .map(|pair| (pair[1].start - pair[0].start).num_days())
        .collect();
    let durations: Vec<i64> = periods.iter().map(Period::duration_days).collect();

    let average_cycle_length = rounded_mean(&cycle_lengths).unwrap_or(DEFAULT_CYCLE_LENGTH);
    let average_bleed_duration = rounded_mean(&durations).unwrap_or(DEFAULT_BLEED_DURATION);

    if cycle_lengths.is_empty() {
        tracing::debug!(
            periods = periods.len(),
            "not enough periods for a cycle length, using default"
        );
    }
    tracing::debug!(
        %window_start,
        %today,
        periods = periods.len(),
        average_cycle_length,
        average_bleed_duration,
        "computed cycle stats"
    );

    Ok(CycleStats {
        average_cycle_length,
        average_bleed_duration,
        periods,
    })
}

/// Arithmetic mean rounded half-up, `None` for an empty sample.
fn rounded_mean(samples: &[i64]) -> Option<u32> {
    if samples.is_empty() {
        return None;
    }
    let sum: i64 = samples.iter().sum();
    let mean = sum as f64 / samples.len() as f64;
    Some((mean + 0.5).floor().max(0.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::BleedingLevel;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bleeding_run(start: NaiveDate, days: i64) -> Vec<Observation> {
        (0..days)
            .map(|i| Observation::new(start + Duration::days(i)).with_bleeding(BleedingLevel::Heavy))
            .collect()
    }

    #[test]
    fn defaults_without_data() {
        let stats = compute_cycle_stats(&[], 6, d(2025, 6, 1)).unwrap();
        assert_eq!(stats.average_cycle_length, DEFAULT_CYCLE_LENGTH);
        assert_eq!(stats.average_bleed_duration, DEFAULT_BLEED_DURATION);
        assert!(stats.periods.is_empty());
        assert!(stats.last_period().is_none());
    }

    #[test]
    fn single_period_keeps_default_cycle_length() {
        let obs = bleeding_run(d(2025, 5, 1), 4);
        let stats = compute_cycle_stats(&obs, 6, d(2025, 6, 1)).unwrap();
        assert_eq!(stats.average_cycle_length, DEFAULT_CYCLE_LENGTH);
        assert_eq!(stats.average_bleed_duration, 4);
        assert_eq!(stats.cycle_samples(), 0);
    }

    #[test]
    fn averages_round_half_up() {
        // cycle lengths 29 and 30 -> 29.5 -> 30
        let mut obs = bleeding_run(d(2025, 1, 1), 4);
        obs.extend(bleeding_run(d(2025, 1, 30), 5));
        obs.extend(bleeding_run(d(2025, 3, 1), 4));
        let stats = compute_cycle_stats(&obs, 6, d(2025, 3, 20)).unwrap();
        assert_eq!(stats.periods.len(), 3);
        assert_eq!(stats.average_cycle_length, 30);
        // durations 4, 5, 4 -> 4.33 -> 4
        assert_eq!(stats.average_bleed_duration, 4);
    }

    #[test]
    fn observations_outside_window_are_ignored() {
        let mut obs = bleeding_run(d(2024, 1, 1), 7);
        obs.extend(bleeding_run(d(2025, 5, 1), 3));
        obs.extend(bleeding_run(d(2025, 7, 1), 3));
        let stats = compute_cycle_stats(&obs, 3, d(2025, 6, 15)).unwrap();
        assert_eq!(stats.periods.len(), 1);
        assert_eq!(stats.average_bleed_duration, 3);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let today = d(2025, 6, 15);
        let obs = vec![
            Observation::new(d(2025, 5, 15)).with_bleeding(BleedingLevel::Spotting),
            Observation::new(today).with_bleeding(BleedingLevel::Spotting),
        ];
        let stats = compute_cycle_stats(&obs, 1, today).unwrap();
        assert_eq!(stats.periods.len(), 2);
        assert_eq!(stats.average_cycle_length, 31);
    }

    #[test]
    fn invalid_lookback_fails_fast() {
        assert!(matches!(
            compute_cycle_stats(&[], 0, d(2025, 6, 1)),
            Err(ValidationError::InvalidLookback { months: 0, .. })
        ));
        assert!(compute_cycle_stats(&[], 25, d(2025, 6, 1)).is_err());
    }

    #[test]
    fn lookback_start_clamps_to_month_end() {
        assert_eq!(lookback_start(d(2025, 3, 31), 1).unwrap(), d(2025, 2, 28));
    }

    #[test]
    fn rounded_mean_handles_half() {
        assert_eq!(rounded_mean(&[]), None);
        assert_eq!(rounded_mean(&[27, 28]), Some(28));
        assert_eq!(rounded_mean(&[27, 27, 28]), Some(27));
    }
}
