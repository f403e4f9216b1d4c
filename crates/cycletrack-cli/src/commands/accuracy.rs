use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;

use cycletrack_core::cycle::lookback_start;
use cycletrack_core::{
    AccuracyReport, Config, Database, DayComparison, DelayReport, ForecastKind, ForecastWindow,
    PredictionAccuracyTracker,
};

use super::{parse_day, print_json};

#[derive(Subcommand)]
pub enum AccuracyAction {
    /// Score stored forecasts against logged bleeding
    Report {
        /// First day (defaults to the start of the lookback window)
        #[arg(long, value_parser = parse_day)]
        from: Option<NaiveDate>,
        /// Last day (defaults to today)
        #[arg(long, value_parser = parse_day)]
        to: Option<NaiveDate>,
        /// Print JSON instead of the summary table
        #[arg(long)]
        json: bool,
        /// Persist detected delays and anticipations
        #[arg(long)]
        save_corrections: bool,
    },
    /// List stored corrections
    Corrections,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccuracyOutput {
    from: NaiveDate,
    to: NaiveDate,
    comparisons: Vec<DayComparison>,
    #[serde(flatten)]
    delays: DelayReport,
    accuracy: AccuracyReport,
}

pub fn run(action: AccuracyAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        AccuracyAction::Report {
            from,
            to,
            json,
            save_corrections,
        } => {
            let to = to.unwrap_or(today);
            let from = match from {
                Some(from) => from,
                None => lookback_start(to, Config::load()?.cycle.lookback_months)?,
            };

            // Only forecasts that could already have come true are judged.
            let windows: Vec<ForecastWindow> = db
                .forecasts()?
                .into_iter()
                .map(|stored| stored.window)
                .filter(|w| w.kind == ForecastKind::Menstruation && from <= w.start && w.start <= to)
                .collect();
            let observations = db.observations()?;

            let tracker = PredictionAccuracyTracker::new();
            let comparisons = tracker.compare(&windows, &observations, from, to);
            let delays = tracker.delays_and_anticipations(&windows, &observations);
            let accuracy = tracker.accuracy(&comparisons, &delays.delays, &delays.anticipations);

            if save_corrections {
                let saved = db.save_corrections(&delays.corrections)?;
                tracing::info!(saved, "stored corrections");
            }

            if json {
                print_json(&AccuracyOutput {
                    from,
                    to,
                    comparisons,
                    delays,
                    accuracy,
                })?;
            } else {
                println!("{}", accuracy.render());
            }
        }
        AccuracyAction::Corrections => {
            print_json(&db.corrections()?)?;
        }
    }
    Ok(())
}
