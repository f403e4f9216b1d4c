//! Prediction accuracy tracking.
//!
//! Compares forecast menstruation windows with the bleeding that was actually
//! logged, day by day and window by window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cycle::group_consecutive_days;
use crate::forecast::{ForecastKind, ForecastWindow};
use crate::observation::Observation;

/// Outcome of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DayClassification {
    Correct,
    FalsePositive,
    FalseNegative,
    TrueNegative,
}

impl DayClassification {
    pub fn from_flags(predicted: bool, actual: bool) -> Self {
        match (predicted, actual) {
            (true, true) => DayClassification::Correct,
            (true, false) => DayClassification::FalsePositive,
            (false, true) => DayClassification::FalseNegative,
            (false, false) => DayClassification::TrueNegative,
        }
    }
}

/// Prediction versus observation for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayComparison {
    pub date: NaiveDate,
    pub predicted: bool,
    pub actual: bool,
    pub classification: DayClassification,
}

/// A delay or anticipation of `days` days, keyed by `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRecord {
    pub date: NaiveDate,
    pub days: u32,
}

/// Whether the actual period came later or earlier than forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorrectionKind {
    Delay,
    Anticipation,
}

impl CorrectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionKind::Delay => "delay",
            CorrectionKind::Anticipation => "anticipation",
        }
    }
}

/// A recorded divergence between a forecast and the observed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub original_predicted_date: NaiveDate,
    pub actual_date: NaiveDate,
    pub kind: CorrectionKind,
}

impl Correction {
    /// Storage key date: forecast start for delays, actual start for
    /// anticipations.
    pub fn key_date(&self) -> NaiveDate {
        match self.kind {
            CorrectionKind::Delay => self.original_predicted_date,
            CorrectionKind::Anticipation => self.actual_date,
        }
    }

    pub fn days(&self) -> u32 {
        (self.actual_date - self.original_predicted_date).num_days().unsigned_abs() as u32
    }
}

/// Delays and anticipations found by window matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayReport {
    pub delays: Vec<DelayRecord>,
    pub anticipations: Vec<DelayRecord>,
    /// Every matched divergence, in forecast order.
    #[serde(default)]
    pub corrections: Vec<Correction>,
}

impl DelayReport {
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty() && self.anticipations.is_empty()
    }
}

/// Aggregated accuracy over a comparison range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub accuracy_percent: f64,
    pub total_days: u64,
    pub correct: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub delay_days_total: u64,
    pub anticipation_days_total: u64,
}

impl AccuracyReport {
    /// Render as an ASCII summary table.
    pub fn render(&self) -> String {
        let mut output = String::new();
        output.push_str("\nPrediction Accuracy Report\n");
        output.push_str(&"=".repeat(40));
        output.push('\n');

        if self.total_days == 0 {
            output.push_str("No predicted or observed bleeding days in range.\n");
        }

        output.push_str(&format!("{:<24} {:>14.1}%\n", "Accuracy", self.accuracy_percent));
        output.push_str(&format!("{:<24} {:>15}\n", "Days compared", self.total_days));
        output.push_str(&format!("{:<24} {:>15}\n", "Correct", self.correct));
        output.push_str(&format!("{:<24} {:>15}\n", "False positives", self.false_positives));
        output.push_str(&format!("{:<24} {:>15}\n", "False negatives", self.false_negatives));
        output.push_str(&"-".repeat(40));
        output.push('\n');
        output.push_str(&format!("{:<24} {:>14}d\n", "Total delay", self.delay_days_total));
        output.push_str(&format!(
            "{:<24} {:>14}d\n",
            "Total anticipation", self.anticipation_days_total
        ));
        output
    }
}

/// A contiguous run of days, used for window matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DayRun {
    start: NaiveDate,
    end: NaiveDate,
}

fn runs_of(days: impl IntoIterator<Item = NaiveDate>) -> Vec<DayRun> {
    group_consecutive_days(days, 1)
        .into_iter()
        .map(|run| DayRun {
            start: run[0],
            end: run[run.len() - 1],
        })
        .collect()
}

/// Tracker comparing forecasts with observed outcomes.
#[derive(Debug, Clone)]
pub struct PredictionAccuracyTracker {
    /// Start differences up to this many days count as a correct match
    pub match_tolerance_days: i64,
    /// Actual windows further than this from a forecast are not matched
    pub max_match_distance_days: i64,
}

impl Default for PredictionAccuracyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionAccuracyTracker {
    /// Create a tracker with the standard tolerances (±1 day, 10 days).
    pub fn new() -> Self {
        Self {
            match_tolerance_days: 1,
            max_match_distance_days: 10,
        }
    }

    /// Create tracker with custom tolerances.
    pub fn with_settings(match_tolerance_days: i64, max_match_distance_days: i64) -> Self {
        Self {
            match_tolerance_days,
            max_match_distance_days,
        }
    }

    /// Classify every day in `[range_start, range_end]`, keeping only days
    /// that were predicted or observed.
    ///
    /// An inverted range yields an empty list.
    pub fn compare(
        &self,
        forecast_windows: &[ForecastWindow],
        observations: &[Observation],
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Vec<DayComparison> {
        let menstruation: Vec<&ForecastWindow> = forecast_windows
            .iter()
            .filter(|w| w.kind == ForecastKind::Menstruation)
            .collect();

        let mut bleeding_days: Vec<NaiveDate> = observations
            .iter()
            .filter(|o| o.is_bleeding())
            .map(|o| o.date)
            .collect();
        bleeding_days.sort_unstable();
        bleeding_days.dedup();

        let mut comparisons = Vec::new();
        let mut negatives = 0usize;
        for date in range_start.iter_days().take_while(|d| *d <= range_end) {
            let predicted = menstruation.iter().any(|w| w.contains(date));
            let actual = bleeding_days.binary_search(&date).is_ok();
            let classification = DayClassification::from_flags(predicted, actual);
            if classification == DayClassification::TrueNegative {
                negatives += 1;
                continue;
            }
            comparisons.push(DayComparison {
                date,
                predicted,
                actual,
                classification,
            });
        }

        tracing::debug!(
            %range_start,
            %range_end,
            retained = comparisons.len(),
            true_negatives = negatives,
            "compared forecast to actual"
        );
        comparisons
    }

    /// Match forecast menstruation windows to observed bleeding windows and
    /// record delays and anticipations beyond the tolerance.
    ///
    /// Each forecast window picks the actual window with the smallest start
    /// difference within `max_match_distance_days`; ties go to the earlier
    /// actual start. Unmatched forecasts record nothing.
    pub fn delays_and_anticipations(
        &self,
        forecast_windows: &[ForecastWindow],
        observations: &[Observation],
    ) -> DelayReport {
        let forecast_runs = runs_of(
            forecast_windows
                .iter()
                .filter(|w| w.kind == ForecastKind::Menstruation)
                .flat_map(ForecastWindow::days),
        );
        let actual_runs = runs_of(observations.iter().filter(|o| o.is_bleeding()).map(|o| o.date));

        let mut report = DelayReport::default();
        for forecast in &forecast_runs {
            let nearest = actual_runs
                .iter()
                .map(|actual| (actual, (actual.start - forecast.start).num_days()))
                .filter(|(_, diff)| diff.abs() <= self.max_match_distance_days)
                .min_by_key(|(actual, diff)| (diff.abs(), actual.start));

            let Some((actual, diff)) = nearest else {
                tracing::debug!(forecast_start = %forecast.start, "no actual window near forecast");
                continue;
            };

            if diff > self.match_tolerance_days {
                report.delays.push(DelayRecord {
                    date: forecast.start,
                    days: diff as u32,
                });
                report.corrections.push(Correction {
                    original_predicted_date: forecast.start,
                    actual_date: actual.start,
                    kind: CorrectionKind::Delay,
                });
            } else if diff < -self.match_tolerance_days {
                report.anticipations.push(DelayRecord {
                    date: actual.start,
                    days: diff.unsigned_abs() as u32,
                });
                report.corrections.push(Correction {
                    original_predicted_date: forecast.start,
                    actual_date: actual.start,
                    kind: CorrectionKind::Anticipation,
                });
            }
        }

        tracing::debug!(
            forecasts = forecast_runs.len(),
            actuals = actual_runs.len(),
            delays = report.delays.len(),
            anticipations = report.anticipations.len(),
            "matched forecast windows"
        );
        report
    }

    /// Aggregate day comparisons and correction magnitudes.
    ///
    /// Only predicted-or-observed days are counted. With nothing to count,
    /// accuracy is 100%.
    pub fn accuracy(
        &self,
        comparisons: &[DayComparison],
        delays: &[DelayRecord],
        anticipations: &[DelayRecord],
    ) -> AccuracyReport {
        let mut correct = 0u64;
        let mut false_positives = 0u64;
        let mut false_negatives = 0u64;
        for comparison in comparisons {
            match comparison.classification {
                DayClassification::Correct => correct += 1,
                DayClassification::FalsePositive => false_positives += 1,
                DayClassification::FalseNegative => false_negatives += 1,
                DayClassification::TrueNegative => {}
            }
        }
        let total_days = correct + false_positives + false_negatives;
        let accuracy_percent = if total_days == 0 {
            100.0
        } else {
            100.0 * correct as f64 / total_days as f64
        };

        AccuracyReport {
            accuracy_percent,
            total_days,
            correct,
            false_positives,
            false_negatives,
            delay_days_total: delays.iter().map(|r| u64::from(r.days)).sum(),
            anticipation_days_total: anticipations.iter().map(|r| u64::from(r.days)).sum(),
        }
    }
}

/// Day-by-day comparison with the default tracker.
pub fn compare_forecast_to_actual(
    forecast_windows: &[ForecastWindow],
    observations: &[Observation],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Vec<DayComparison> {
    PredictionAccuracyTracker::new().compare(forecast_windows, observations, range_start, range_end)
}

/// Window matching with the default tracker.
pub fn compute_delays_and_anticipations(
    forecast_windows: &[ForecastWindow],
    observations: &[Observation],
) -> DelayReport {
    PredictionAccuracyTracker::new().delays_and_anticipations(forecast_windows, observations)
}

/// Accuracy aggregation with the default tracker.
pub fn compute_accuracy(
    comparisons: &[DayComparison],
    delays: &[DelayRecord],
    anticipations: &[DelayRecord],
) -> AccuracyReport {
    PredictionAccuracyTracker::new().accuracy(comparisons, delays, anticipations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::BleedingLevel;
    use chrono::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn forecast(start: NaiveDate, days: i64) -> ForecastWindow {
        ForecastWindow::new(start, start + Duration::days(days - 1), ForecastKind::Menstruation)
    }

    fn bleeding_run(start: NaiveDate, days: i64) -> Vec<Observation> {
        (0..days)
            .map(|i| Observation::new(start + Duration::days(i)).with_bleeding(BleedingLevel::Heavy))
            .collect()
    }

    #[test]
    fn classification_from_flags() {
        assert_eq!(DayClassification::from_flags(true, true), DayClassification::Correct);
        assert_eq!(DayClassification::from_flags(true, false), DayClassification::FalsePositive);
        assert_eq!(DayClassification::from_flags(false, true), DayClassification::FalseNegative);
        assert_eq!(DayClassification::from_flags(false, false), DayClassification::TrueNegative);
    }

    #[test]
    fn compare_keeps_only_signal_days() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let obs = bleeding_run(d(2025, 3, 3), 5);
        let comparisons = compare_forecast_to_actual(&windows, &obs, d(2025, 2, 20), d(2025, 3, 20));

        assert_eq!(comparisons.len(), 7);
        assert_eq!(comparisons[0].date, d(2025, 3, 1));
        assert_eq!(comparisons[0].classification, DayClassification::FalsePositive);
        assert_eq!(comparisons[2].classification, DayClassification::Correct);
        assert_eq!(comparisons[6].date, d(2025, 3, 7));
        assert_eq!(comparisons[6].classification, DayClassification::FalseNegative);
        assert!(comparisons.iter().all(|c| c.predicted || c.actual));
    }

    #[test]
    fn compare_ignores_non_menstruation_windows_and_clips_range() {
        let windows = vec![
            ForecastWindow::new(d(2025, 3, 14), d(2025, 3, 14), ForecastKind::Ovulation),
            forecast(d(2025, 3, 1), 5),
        ];
        let comparisons = compare_forecast_to_actual(&windows, &[], d(2025, 3, 4), d(2025, 3, 20));
        assert_eq!(comparisons.len(), 2);
        assert!(comparisons.iter().all(|c| c.classification == DayClassification::FalsePositive));
    }

    #[test]
    fn compare_empty_and_inverted_ranges() {
        assert!(compare_forecast_to_actual(&[], &[], d(2025, 3, 1), d(2025, 3, 31)).is_empty());
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        assert!(compare_forecast_to_actual(&windows, &[], d(2025, 3, 5), d(2025, 3, 1)).is_empty());
    }

    #[test]
    fn delay_of_three_days() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let obs = bleeding_run(d(2025, 3, 4), 5);
        let report = compute_delays_and_anticipations(&windows, &obs);
        assert_eq!(
            report.delays,
            vec![DelayRecord {
                date: d(2025, 3, 1),
                days: 3
            }]
        );
        assert!(report.anticipations.is_empty());
        assert_eq!(report.corrections[0].kind, CorrectionKind::Delay);
        assert_eq!(report.corrections[0].key_date(), d(2025, 3, 1));
        assert_eq!(report.corrections[0].days(), 3);
    }

    #[test]
    fn anticipation_of_two_days() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let obs = bleeding_run(d(2025, 2, 27), 5);
        let report = compute_delays_and_anticipations(&windows, &obs);
        assert!(report.delays.is_empty());
        assert_eq!(
            report.anticipations,
            vec![DelayRecord {
                date: d(2025, 2, 27),
                days: 2
            }]
        );
        assert_eq!(report.corrections[0].key_date(), d(2025, 2, 27));
    }

    #[test]
    fn one_day_difference_is_a_match() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        for start in [d(2025, 2, 28), d(2025, 3, 1), d(2025, 3, 2)] {
            let report = compute_delays_and_anticipations(&windows, &bleeding_run(start, 4));
            assert!(report.is_empty(), "start {start} should match");
            assert!(report.corrections.is_empty());
        }
    }

    #[test]
    fn distant_actual_is_not_matched() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let report = compute_delays_and_anticipations(&windows, &bleeding_run(d(2025, 3, 12), 4));
        assert!(report.is_empty());

        let report = compute_delays_and_anticipations(&windows, &bleeding_run(d(2025, 3, 11), 4));
        assert_eq!(report.delays[0].days, 10);
    }

    #[test]
    fn nearest_actual_wins_and_ties_go_earlier() {
        let windows = vec![forecast(d(2025, 3, 10), 3)];

        // 3 days early vs 5 days late: early is nearer
        let mut obs = bleeding_run(d(2025, 3, 7), 1);
        obs.extend(bleeding_run(d(2025, 3, 15), 1));
        let report = compute_delays_and_anticipations(&windows, &obs);
        assert_eq!(report.anticipations, vec![DelayRecord { date: d(2025, 3, 7), days: 3 }]);
        assert!(report.delays.is_empty());

        // 4 early vs 4 late: tie breaks toward the earlier start
        let mut obs = bleeding_run(d(2025, 3, 6), 1);
        obs.extend(bleeding_run(d(2025, 3, 14), 1));
        let report = compute_delays_and_anticipations(&windows, &obs);
        assert_eq!(report.anticipations, vec![DelayRecord { date: d(2025, 3, 6), days: 4 }]);
        assert!(report.delays.is_empty());
    }

    #[test]
    fn actual_windows_use_strict_consecutive_grouping() {
        // bleeding on 3/4 and 3/6 is one period but two windows here; the
        // nearest one to the 3/1 forecast is 3/4.
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let obs = vec![
            Observation::new(d(2025, 3, 6)).with_bleeding(BleedingLevel::Heavy),
            Observation::new(d(2025, 3, 4)).with_bleeding(BleedingLevel::Spotting),
        ];
        let report = compute_delays_and_anticipations(&windows, &obs);
        assert_eq!(report.delays, vec![DelayRecord { date: d(2025, 3, 1), days: 3 }]);
    }

    #[test]
    fn adjacent_forecast_windows_merge() {
        let windows = vec![forecast(d(2025, 3, 1), 3), forecast(d(2025, 3, 4), 3)];
        let report = compute_delays_and_anticipations(&windows, &bleeding_run(d(2025, 3, 5), 3));
        // one merged forecast window starting 3/1; actual 4 days later
        assert_eq!(report.delays, vec![DelayRecord { date: d(2025, 3, 1), days: 4 }]);
    }

    #[test]
    fn accuracy_on_empty_input_is_100() {
        let report = compute_accuracy(&[], &[], &[]);
        assert_eq!(report.accuracy_percent, 100.0);
        assert_eq!(report.total_days, 0);
        assert_eq!(report.delay_days_total, 0);
    }

    #[test]
    fn accuracy_counts_and_totals() {
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let obs = bleeding_run(d(2025, 3, 3), 5);
        let comparisons = compare_forecast_to_actual(&windows, &obs, d(2025, 3, 1), d(2025, 3, 31));
        let delays = vec![DelayRecord { date: d(2025, 3, 1), days: 2 }];
        let anticipations = vec![
            DelayRecord { date: d(2025, 4, 1), days: 3 },
            DelayRecord { date: d(2025, 5, 1), days: 4 },
        ];
        let report = compute_accuracy(&comparisons, &delays, &anticipations);
        assert_eq!(report.total_days, 7);
        assert_eq!(report.correct, 3);
        assert_eq!(report.false_positives, 2);
        assert_eq!(report.false_negatives, 2);
        assert!((report.accuracy_percent - 300.0 / 7.0).abs() < 1e-9);
        assert_eq!(report.delay_days_total, 2);
        assert_eq!(report.anticipation_days_total, 7);
    }

    #[test]
    fn accuracy_ignores_true_negatives_in_input() {
        let comparisons = vec![
            DayComparison {
                date: d(2025, 3, 1),
                predicted: false,
                actual: false,
                classification: DayClassification::TrueNegative,
            },
            DayComparison {
                date: d(2025, 3, 2),
                predicted: true,
                actual: true,
                classification: DayClassification::Correct,
            },
        ];
        let report = compute_accuracy(&comparisons, &[], &[]);
        assert_eq!(report.total_days, 1);
        assert_eq!(report.accuracy_percent, 100.0);
    }

    #[test]
    fn custom_tolerance_tracker() {
        let tracker = PredictionAccuracyTracker::with_settings(3, 10);
        let windows = vec![forecast(d(2025, 3, 1), 5)];
        let report = tracker.delays_and_anticipations(&windows, &bleeding_run(d(2025, 3, 4), 3));
        assert!(report.is_empty());
    }

    #[test]
    fn render_report_contains_totals() {
        let report = compute_accuracy(&[], &[DelayRecord { date: d(2025, 3, 1), days: 3 }], &[]);
        let text = report.render();
        assert!(text.contains("Prediction Accuracy Report"));
        assert!(text.contains("No predicted or observed"));
        assert!(text.contains("100.0%"));
        assert!(text.contains("3d"));
    }
}
