use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;

use cycletrack_core::observation::parse_tag_set;
use cycletrack_core::{BleedingLevel, Database, Mucus, Observation, Sensation};

use super::{parse_day, print_json};

#[derive(Subcommand)]
pub enum ObserveAction {
    /// Log (or overwrite) the observation for a day
    Add {
        /// Day to log (defaults to today)
        #[arg(long, value_parser = parse_day)]
        date: Option<NaiveDate>,
        /// none, spotting or heavy
        #[arg(long, default_value = "none")]
        bleeding: BleedingLevel,
        /// Comma-separated: dry, moist, sticky, slippery
        #[arg(long, default_value = "")]
        sensation: String,
        /// Comma-separated: eggWhite, clear, stretchy, thick, sticky, white
        #[arg(long, default_value = "")]
        mucus: String,
        /// Intercourse on this day
        #[arg(long)]
        intercourse: bool,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
    },
    /// List logged observations
    List {
        /// First day (inclusive)
        #[arg(long, value_parser = parse_day)]
        from: Option<NaiveDate>,
        /// Last day (inclusive)
        #[arg(long, value_parser = parse_day)]
        to: Option<NaiveDate>,
    },
    /// Import observations from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Remove the observation for a day
    Remove {
        #[arg(value_parser = parse_day)]
        date: NaiveDate,
    },
}

pub fn run(action: ObserveAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ObserveAction::Add {
            date,
            bleeding,
            sensation,
            mucus,
            intercourse,
            note,
        } => {
            let observation = Observation {
                date: date.unwrap_or(today),
                bleeding_level: bleeding,
                sensation: parse_tag_set::<Sensation>(&sensation)?,
                mucus: parse_tag_set::<Mucus>(&mucus)?,
                had_intercourse: intercourse,
                note,
            };
            db.upsert_observation(&observation)?;
            print_json(&observation)?;
        }
        ObserveAction::List { from, to } => {
            let observations = match (from, to) {
                (None, None) => db.observations()?,
                (from, to) => {
                    let earliest = NaiveDate::from_ymd_opt(1, 1, 1).ok_or("invalid date")?;
                    let latest = NaiveDate::from_ymd_opt(9999, 12, 31).ok_or("invalid date")?;
                    db.observations_in_range(from.unwrap_or(earliest), to.unwrap_or(latest))?
                }
            };
            print_json(&observations)?;
        }
        ObserveAction::Import { file } => {
            let count = db.import_observations(&file)?;
            println!("imported {count} observations");
        }
        ObserveAction::Remove { date } => {
            if db.delete_observation(date)? {
                println!("removed {date}");
            } else {
                return Err(format!("no observation for {date}").into());
            }
        }
    }
    Ok(())
}
