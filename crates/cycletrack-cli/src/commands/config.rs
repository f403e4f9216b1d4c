use clap::Subcommand;
use serde::Serialize;

use cycletrack_core::{Config, CycleSettings};

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "cycle.lookback_months", "forecast.count")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values with the engine settings they resolve to
    List,
    /// Reset config to defaults
    Reset,
}

#[derive(Serialize)]
struct ConfigListing<'a> {
    #[serde(flatten)]
    config: &'a Config,
    settings: CycleSettings,
}

/// One-line summary of what the engine will do with `config`.
fn describe(config: &Config) -> String {
    let settings = config.settings();
    format!(
        "statistics over {} month(s), forecasting {} cycle(s)",
        settings.lookback_months, settings.forecast_count
    )
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok: {}", describe(&config));
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print_json(&ConfigListing {
                settings: config.settings(),
                config: &config,
            })?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults: {}", describe(&config));
        }
    }
    Ok(())
}
