//! Projection of future menstruation, ovulation and fertile windows.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Confidence attached to a forecast menstruation window.
pub const MENSTRUATION_CONFIDENCE: f64 = 0.8;
/// Confidence attached to the end-of-period marker.
pub const PERIOD_END_CONFIDENCE: f64 = 0.7;
/// Confidence attached to a forecast ovulation day.
pub const OVULATION_CONFIDENCE: f64 = 0.7;
/// Confidence attached to a forecast fertile window.
pub const FERTILE_CONFIDENCE: f64 = 0.6;

/// Fertile days on each side of the ovulation day.
pub const FERTILE_SPAN_DAYS: i64 = 3;

/// What a forecast window predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForecastKind {
    Menstruation,
    /// Single-day marker on the last predicted bleeding day.
    PeriodEnd,
    Ovulation,
    Fertile,
}

impl ForecastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastKind::Menstruation => "menstruation",
            ForecastKind::PeriodEnd => "periodEnd",
            ForecastKind::Ovulation => "ovulation",
            ForecastKind::Fertile => "fertile",
        }
    }

    /// Policy confidence for this kind.
    pub fn confidence(self) -> f64 {
        match self {
            ForecastKind::Menstruation => MENSTRUATION_CONFIDENCE,
            ForecastKind::PeriodEnd => PERIOD_END_CONFIDENCE,
            ForecastKind::Ovulation => OVULATION_CONFIDENCE,
            ForecastKind::Fertile => FERTILE_CONFIDENCE,
        }
    }
}

impl FromStr for ForecastKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menstruation" => Ok(ForecastKind::Menstruation),
            "periodEnd" => Ok(ForecastKind::PeriodEnd),
            "ovulation" => Ok(ForecastKind::Ovulation),
            "fertile" => Ok(ForecastKind::Fertile),
            other => Err(ValidationError::UnknownTag {
                field: "forecastKind",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicted, inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: ForecastKind,
    pub confidence: f64,
}

impl ForecastWindow {
    /// Window of `kind` with the kind's policy confidence.
    pub fn new(start: NaiveDate, end: NaiveDate, kind: ForecastKind) -> Self {
        Self {
            start,
            end,
            kind,
            confidence: kind.confidence(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every calendar day of the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Convert a caller-supplied count into a usable one.
///
/// # Errors
///
/// Returns [`ValidationError::NegativeCount`] for `count < 0`.
pub fn validate_count(count: i64) -> Result<usize, ValidationError> {
    usize::try_from(count).map_err(|_| ValidationError::NegativeCount(count))
}

/// Project `count` menstruation windows after `last_period_start`.
///
/// Window `i` starts at `last_period_start + average_cycle_length * (i + 1)`
/// and spans `average_bleed_duration` days.
///
/// # Errors
///
/// Fails if either average is zero, or if the bleed duration exceeds the
/// cycle length (windows would overlap).
pub fn forecast_cycles(
    last_period_start: NaiveDate,
    average_cycle_length: u32,
    average_bleed_duration: u32,
    count: usize,
) -> Result<Vec<ForecastWindow>, ValidationError> {
    if average_cycle_length == 0 {
        return Err(ValidationError::InvalidValue {
            field: "averageCycleLength".to_string(),
            message: "must be at least 1 day".to_string(),
        });
    }
    if average_bleed_duration == 0 {
        return Err(ValidationError::InvalidValue {
            field: "averageBleedDuration".to_string(),
            message: "must be at least 1 day".to_string(),
        });
    }
    if average_bleed_duration > average_cycle_length {
        return Err(ValidationError::InvalidValue {
            field: "averageBleedDuration".to_string(),
            message: format!(
                "{average_bleed_duration} days exceeds the {average_cycle_length}-day cycle"
            ),
        });
    }

    let cycle = i64::from(average_cycle_length);
    let span = i64::from(average_bleed_duration) - 1;
    let mut windows = Vec::with_capacity(count);
    for i in 0..count {
        let offset = cycle * (i as i64 + 1);
        let start = last_period_start
            .checked_add_signed(Duration::days(offset))
            .ok_or_else(|| out_of_range("forecast start", last_period_start, offset))?;
        let end = start
            .checked_add_signed(Duration::days(span))
            .ok_or_else(|| out_of_range("forecast end", start, span))?;
        windows.push(ForecastWindow::new(start, end, ForecastKind::Menstruation));
    }
    Ok(windows)
}

/// Ovulation day and the two fertile windows around it for the cycle
/// starting at `period_start`.
///
/// The ovulation day is `period_start + floor(average_cycle_length / 2)`.
/// The fertile span `[ov - 3, ov + 3]` is reported as the two windows on
/// either side of it. Returned in chronological order.
///
/// # Errors
///
/// Fails when any window edge falls outside the representable date range.
pub fn derive_ovulation_windows(
    period_start: NaiveDate,
    average_cycle_length: u32,
) -> Result<Vec<ForecastWindow>, ValidationError> {
    let shift = |from: NaiveDate, days: i64, what: &str| {
        from.checked_add_signed(Duration::days(days))
            .ok_or_else(|| out_of_range(what, from, days))
    };

    let ovulation = shift(period_start, i64::from(average_cycle_length / 2), "ovulation day")?;
    let before = ForecastWindow::new(
        shift(ovulation, -FERTILE_SPAN_DAYS, "fertile start")?,
        shift(ovulation, -1, "fertile end")?,
        ForecastKind::Fertile,
    );
    let day = ForecastWindow::new(ovulation, ovulation, ForecastKind::Ovulation);
    let after = ForecastWindow::new(
        shift(ovulation, 1, "fertile start")?,
        shift(ovulation, FERTILE_SPAN_DAYS, "fertile end")?,
        ForecastKind::Fertile,
    );
    Ok(vec![before, day, after])
}

/// Single-day end-of-period marker for a menstruation window.
pub fn period_end_marker(window: &ForecastWindow) -> ForecastWindow {
    ForecastWindow::new(window.end, window.end, ForecastKind::PeriodEnd)
}

fn out_of_range(what: &str, from: NaiveDate, days: i64) -> ValidationError {
    ValidationError::InvalidValue {
        field: what.to_string(),
        message: format!("{from} + {days} days is out of range"),
    }
}
