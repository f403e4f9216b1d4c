use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;

use cycletrack_core::{
    all_luteal_phase_intervals, compute_cycle_stats, detect_menstruation_periods,
    detect_ovulation_episodes, luteal_phase_day, Config, Database, ValidationError,
};
use cycletrack_core::cycle::{MAX_LOOKBACK_MONTHS, MIN_LOOKBACK_MONTHS};

use super::{parse_day, print_json};

#[derive(Subcommand)]
pub enum CycleAction {
    /// Detected menstruation periods
    Periods,
    /// Detected ovulation episodes
    Ovulation,
    /// Average cycle length and bleed duration over the lookback window
    Stats {
        /// Lookback window in months (defaults to cycle.lookback_months)
        #[arg(long, allow_negative_numbers = true)]
        lookback: Option<i64>,
    },
    /// Luteal phase day number for a date
    Luteal {
        /// Day to look up (defaults to today)
        #[arg(value_parser = parse_day)]
        date: Option<NaiveDate>,
    },
    /// All luteal phase intervals up to today
    LutealIntervals,
}

pub fn run(action: CycleAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let observations = db.observations()?;

    match action {
        CycleAction::Periods => print_json(&detect_menstruation_periods(&observations))?,
        CycleAction::Ovulation => print_json(&detect_ovulation_episodes(&observations))?,
        CycleAction::Stats { lookback } => {
            let months = match lookback {
                Some(months) => lookback_months(months)?,
                None => Config::load()?.cycle.lookback_months,
            };
            let stats = compute_cycle_stats(&observations, months, today)?;
            print_json(&stats)?;
        }
        CycleAction::Luteal { date } => {
            let date = date.unwrap_or(today);
            let day = luteal_phase_day(date, &observations, today);
            print_json(&json!({ "date": date, "lutealDay": day }))?;
        }
        CycleAction::LutealIntervals => {
            print_json(&all_luteal_phase_intervals(&observations, today))?;
        }
    }
    Ok(())
}

/// Narrow a user-supplied month count, rejecting non-positive values.
fn lookback_months(months: i64) -> Result<u32, ValidationError> {
    u32::try_from(months)
        .ok()
        .filter(|m| *m >= MIN_LOOKBACK_MONTHS)
        .ok_or(ValidationError::InvalidLookback {
            months,
            min: MIN_LOOKBACK_MONTHS,
            max: MAX_LOOKBACK_MONTHS,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_months_rejects_non_positive() {
        assert_eq!(lookback_months(6).unwrap(), 6);
        assert!(lookback_months(0).is_err());
        assert!(lookback_months(-3).is_err());
    }
}
