//! End-to-end forecast pipeline: observations in, forecast windows out.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::generator::{
    derive_ovulation_windows, forecast_cycles, period_end_marker, ForecastKind, ForecastWindow,
};
use crate::cycle::{compute_cycle_stats, CycleStats, Period};
use crate::error::ValidationError;
use crate::observation::Observation;

/// Engine-facing settings, resolved from the user configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSettings {
    pub lookback_months: u32,
    pub forecast_count: usize,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            lookback_months: 6,
            forecast_count: 6,
        }
    }
}

/// Result of a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPlan {
    /// Reference date the plan was computed for.
    pub generated_on: NaiveDate,
    pub stats: CycleStats,
    /// Bleed duration actually used for the windows (clamped to the cycle length).
    pub bleed_duration_used: u32,
    /// All windows ordered by start date, then kind.
    pub windows: Vec<ForecastWindow>,
}

impl ForecastPlan {
    pub fn last_period(&self) -> Option<&Period> {
        self.stats.last_period()
    }

    pub fn windows_of(&self, kind: ForecastKind) -> impl Iterator<Item = &ForecastWindow> + '_ {
        self.windows.iter().filter(move |w| w.kind == kind)
    }

    /// Forecast menstruation windows, oldest first.
    pub fn menstruation_windows(&self) -> Vec<ForecastWindow> {
        self.windows_of(ForecastKind::Menstruation).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Run statistics and forecasting over `observations` as of `today`.
///
/// Without any period in the lookback window the plan carries default
/// statistics and no windows. Ovulation and fertile windows are derived for
/// the current cycle and for every forecast cycle.
///
/// # Errors
///
/// Fails for an invalid lookback window, or when a window would fall
/// outside the representable date range.
pub fn build_forecast_plan(
    observations: &[Observation],
    settings: &CycleSettings,
    today: NaiveDate,
) -> Result<ForecastPlan, ValidationError> {
    let stats = compute_cycle_stats(observations, settings.lookback_months, today)?;
    let cycle_length = stats.average_cycle_length;
    let bleed_duration = if stats.average_bleed_duration > cycle_length {
        tracing::warn!(
            average_bleed_duration = stats.average_bleed_duration,
            average_cycle_length = cycle_length,
            "bleed duration exceeds cycle length, clamping"
        );
        cycle_length
    } else {
        stats.average_bleed_duration
    };

    let Some(last) = stats.last_period().copied() else {
        tracing::debug!("no period in lookback window, nothing to forecast");
        return Ok(ForecastPlan {
            generated_on: today,
            stats,
            bleed_duration_used: bleed_duration,
            windows: Vec::new(),
        });
    };

    let menstruation = forecast_cycles(last.start, cycle_length, bleed_duration, settings.forecast_count)?;

    let mut windows = derive_ovulation_windows(last.start, cycle_length)?;
    for window in &menstruation {
        windows.push(period_end_marker(window));
        windows.extend(derive_ovulation_windows(window.start, cycle_length)?);
    }
    windows.extend(menstruation);
    windows.sort_by(|a, b| a.start.cmp(&b.start).then(a.kind.cmp(&b.kind)));

    tracing::debug!(
        %today,
        last_period_start = %last.start,
        windows = windows.len(),
        "built forecast plan"
    );

    Ok(ForecastPlan {
        generated_on: today,
        stats,
        bleed_duration_used: bleed_duration,
        windows,
    })
}
