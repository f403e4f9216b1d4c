use chrono::NaiveDate;
use clap::Subcommand;

use cycletrack_core::forecast::validate_count;
use cycletrack_core::{build_forecast_plan, Config, Database};

use super::print_json;

#[derive(Subcommand)]
pub enum ForecastAction {
    /// Compute a forecast plan from the logged observations
    Generate {
        /// Number of cycles to forecast (defaults to forecast.count)
        #[arg(long, allow_negative_numbers = true)]
        count: Option<i64>,
        /// Persist the windows, replacing stored forecasts from today on
        #[arg(long)]
        save: bool,
    },
    /// List stored forecast windows
    List,
}

pub fn run(action: ForecastAction, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ForecastAction::Generate { count, save } => {
            let mut settings = Config::load()?.settings();
            if let Some(count) = count {
                settings.forecast_count = validate_count(count)?;
            }

            let observations = db.observations()?;
            let plan = build_forecast_plan(&observations, &settings, today)?;

            if save {
                let cleared = db.clear_forecasts_from(today)?;
                let saved = db.save_forecasts(&plan.windows, today)?;
                tracing::info!(cleared, saved, "stored forecast windows");
            }
            print_json(&plan)?;
        }
        ForecastAction::List => {
            print_json(&db.forecasts()?)?;
        }
    }
    Ok(())
}
