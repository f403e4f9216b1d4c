//! Luteal phase day numbering for calendar display.
//!
//! The luteal phase of an ovulation episode starts four days after the
//! episode's last day and runs until the day before the next period. When no
//! later period has been observed yet, it is truncated at `today`; intervals
//! are never projected into the future.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::detector::{detect_menstruation_periods, detect_ovulation_episodes, OvulationEpisode, Period};
use crate::observation::Observation;

/// Days between the last fertile-sign day and the first luteal day.
pub const LUTEAL_OFFSET_DAYS: i64 = 4;

/// An inclusive luteal-phase interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutealInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LutealInterval {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 1-indexed position of `date` inside the interval.
    pub fn day_number(&self, date: NaiveDate) -> Option<u32> {
        if !self.contains(date) {
            return None;
        }
        u32::try_from((date - self.start).num_days() + 1).ok()
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Raw interval for one episode; may be degenerate (`start > end`).
///
/// `None` when the luteal start falls past the last representable date.
fn interval_for_episode(
    episode: &OvulationEpisode,
    periods: &[Period],
    today: NaiveDate,
) -> Option<LutealInterval> {
    let last_fertile = episode.last_day();
    let start = last_fertile.checked_add_signed(Duration::days(LUTEAL_OFFSET_DAYS))?;
    let end = periods
        .iter()
        .find(|p| p.start > last_fertile)
        .map(|p| p.start - Duration::days(1))
        .unwrap_or(today)
        .min(today);
    Some(LutealInterval { start, end })
}

/// Every non-degenerate luteal interval in chronological episode order.
pub fn all_luteal_phase_intervals(observations: &[Observation], today: NaiveDate) -> Vec<LutealInterval> {
    let periods = detect_menstruation_periods(observations);
    let episodes = detect_ovulation_episodes(observations);

    episodes
        .iter()
        .filter_map(|episode| interval_for_episode(episode, &periods, today))
        .filter(|interval| interval.start <= interval.end)
        .collect()
}

/// Position of `target` inside the luteal phase, 1 on the first luteal day.
///
/// Returns `None` outside every luteal interval. If intervals of distinct
/// episodes overlap, the earliest episode's interval is used.
pub fn luteal_phase_day(target: NaiveDate, observations: &[Observation], today: NaiveDate) -> Option<u32> {
    all_luteal_phase_intervals(observations, today)
        .iter()
        .find_map(|interval| interval.day_number(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{BleedingLevel, Mucus, Sensation};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bleed(date: NaiveDate) -> Observation {
        Observation::new(date).with_bleeding(BleedingLevel::Heavy)
    }

    fn fertile(date: NaiveDate) -> Observation {
        Observation::new(date)
            .with_sensation(Sensation::Slippery)
            .with_mucus(Mucus::Clear)
    }

    /// Period Jan 1-5, fertile Jan 12-14, next period Jan 29.
    fn closed_cycle() -> Vec<Observation> {
        let mut obs: Vec<Observation> = (1..=5).map(|i| bleed(d(2025, 1, i))).collect();
        obs.extend((12..=14).map(|i| fertile(d(2025, 1, i))));
        obs.extend((29..=31).map(|i| bleed(d(2025, 1, i))));
        obs
    }

    #[test]
    fn first_luteal_day_is_one() {
        let obs = closed_cycle();
        let today = d(2025, 3, 1);
        assert_eq!(luteal_phase_day(d(2025, 1, 18), &obs, today), Some(1));
        assert_eq!(luteal_phase_day(d(2025, 1, 28), &obs, today), Some(11));
    }

    #[test]
    fn outside_interval_is_none() {
        let obs = closed_cycle();
        let today = d(2025, 3, 1);
        assert_eq!(luteal_phase_day(d(2025, 1, 17), &obs, today), None);
        assert_eq!(luteal_phase_day(d(2025, 1, 29), &obs, today), None);
        assert_eq!(luteal_phase_day(d(2025, 1, 14), &obs, today), None);
    }

    #[test]
    fn open_interval_is_truncated_at_today() {
        let mut obs: Vec<Observation> = (1..=5).map(|i| bleed(d(2025, 1, i))).collect();
        obs.push(fertile(d(2025, 1, 13)));
        let today = d(2025, 1, 20);

        let intervals = all_luteal_phase_intervals(&obs, today);
        assert_eq!(
            intervals,
            vec![LutealInterval {
                start: d(2025, 1, 17),
                end: today
            }]
        );
        assert_eq!(luteal_phase_day(today, &obs, today), Some(4));
        assert_eq!(luteal_phase_day(d(2025, 1, 21), &obs, today), None);
    }

    #[test]
    fn degenerate_interval_is_skipped() {
        let mut obs = vec![fertile(d(2025, 1, 13))];
        // next period starts the day after the luteal start would be reached
        obs.push(bleed(d(2025, 1, 16)));
        assert!(all_luteal_phase_intervals(&obs, d(2025, 2, 1)).is_empty());

        // fertile signs only three days ago: phase has not begun
        let recent = vec![fertile(d(2025, 1, 13))];
        assert!(all_luteal_phase_intervals(&recent, d(2025, 1, 16)).is_empty());
        assert_eq!(luteal_phase_day(d(2025, 1, 16), &recent, d(2025, 1, 16)), None);
    }

    #[test]
    fn episode_at_last_representable_date_is_skipped() {
        let obs = vec![fertile(NaiveDate::MAX)];
        assert!(all_luteal_phase_intervals(&obs, NaiveDate::MAX).is_empty());
        assert_eq!(luteal_phase_day(NaiveDate::MAX, &obs, NaiveDate::MAX), None);
    }

    #[test]
    fn no_episodes_yields_nothing() {
        let obs: Vec<Observation> = (1..=5).map(|i| bleed(d(2025, 1, i))).collect();
        assert!(all_luteal_phase_intervals(&obs, d(2025, 2, 1)).is_empty());
        assert_eq!(luteal_phase_day(d(2025, 1, 20), &obs, d(2025, 2, 1)), None);
    }

    #[test]
    fn next_period_must_start_after_last_fertile_day() {
        // bleeding overlapping the fertile run does not close the interval
        let obs = vec![
            fertile(d(2025, 1, 10)),
            bleed(d(2025, 1, 10)),
            fertile(d(2025, 1, 11)),
            bleed(d(2025, 2, 5)),
        ];
        let intervals = all_luteal_phase_intervals(&obs, d(2025, 3, 1));
        assert_eq!(
            intervals,
            vec![LutealInterval {
                start: d(2025, 1, 15),
                end: d(2025, 2, 4)
            }]
        );
    }

    #[test]
    fn overlapping_intervals_first_episode_wins() {
        // Two episodes with no period between them: both intervals run to the
        // same next period, so the later one is nested inside the earlier.
        let obs = vec![
            fertile(d(2025, 1, 10)),
            fertile(d(2025, 1, 20)),
            bleed(d(2025, 2, 10)),
        ];
        let today = d(2025, 3, 1);
        let intervals = all_luteal_phase_intervals(&obs, today);
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].start, d(2025, 1, 14));
        assert_eq!(intervals[1].start, d(2025, 1, 24));
        assert_eq!(intervals[0].end, intervals[1].end);

        // Jan 25 is day 2 of the second interval but day 12 of the first.
        assert_eq!(luteal_phase_day(d(2025, 1, 25), &obs, today), Some(12));
    }

    #[test]
    fn interval_helpers() {
        let interval = LutealInterval {
            start: d(2025, 1, 18),
            end: d(2025, 1, 28),
        };
        assert_eq!(interval.len_days(), 11);
        assert_eq!(interval.day_number(d(2025, 1, 18)), Some(1));
        assert_eq!(interval.day_number(d(2025, 1, 29)), None);
    }
}
