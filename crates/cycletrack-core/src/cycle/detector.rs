//! Period and ovulation-episode detection.
//!
//! Both detectors share one primitive: sort the qualifying days, drop
//! duplicates, then grow the current run while the gap to the previous day
//! stays within a tolerance. Only the qualifying predicate and the
//! tolerance differ.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::observation::Observation;

/// Largest gap (in days) between two bleeding days of the same period.
pub const PERIOD_MAX_GAP_DAYS: i64 = 2;

/// Largest gap (in days) between two fertile-sign days of the same episode.
pub const OVULATION_MAX_GAP_DAYS: i64 = 3;

/// A detected menstruation period, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Number of calendar days covered, `end - start + 1`.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A detected run of days bearing fertile biomarkers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationEpisode {
    /// Chronologically ordered, never empty.
    pub days: Vec<NaiveDate>,
}

impl OvulationEpisode {
    pub fn first_day(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last_day(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }
}

/// Group dates into runs where consecutive members are at most `max_gap`
/// days apart.
///
/// Input order does not matter and duplicates collapse. Each returned run is
/// sorted and non-empty; runs are in chronological order.
pub fn group_consecutive_days(
    dates: impl IntoIterator<Item = NaiveDate>,
    max_gap: i64,
) -> Vec<Vec<NaiveDate>> {
    let mut sorted: Vec<NaiveDate> = dates.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups: Vec<Vec<NaiveDate>> = Vec::new();
    for date in sorted {
        match groups.last_mut() {
            Some(current)
                if current
                    .last()
                    .is_some_and(|prev| (date - *prev).num_days() <= max_gap) =>
            {
                current.push(date);
            }
            _ => groups.push(vec![date]),
        }
    }
    groups
}

/// Group bleeding days (spotting or heavy) into menstruation periods.
///
/// Two bleeding days merge when they are at most two days apart; a gap of
/// exactly three days starts a new period.
pub fn detect_menstruation_periods(observations: &[Observation]) -> Vec<Period> {
    let bleeding_days = observations
        .iter()
        .filter(|o| o.is_bleeding())
        .map(|o| o.date);

    let periods: Vec<Period> = group_consecutive_days(bleeding_days, PERIOD_MAX_GAP_DAYS)
        .into_iter()
        .map(|days| Period {
            start: days[0],
            end: days[days.len() - 1],
        })
        .collect();

    tracing::debug!(
        observations = observations.len(),
        periods = periods.len(),
        "detected menstruation periods"
    );
    periods
}

/// Group days that satisfy the fertile biomarker rule into ovulation
/// episodes, merging across gaps of up to three days.
pub fn detect_ovulation_episodes(observations: &[Observation]) -> Vec<OvulationEpisode> {
    let fertile_days = observations
        .iter()
        .filter(|o| o.has_fertile_signs())
        .map(|o| o.date);

    let episodes: Vec<OvulationEpisode> =
        group_consecutive_days(fertile_days, OVULATION_MAX_GAP_DAYS)
            .into_iter()
            .map(|days| OvulationEpisode { days })
            .collect();

    tracing::debug!(episodes = episodes.len(), "detected ovulation episodes");
    episodes
}
