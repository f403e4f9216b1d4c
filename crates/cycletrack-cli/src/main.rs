use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cycletrack-cli", version, about = "Cycletrack CLI")]
struct Cli {
    /// Reference date used as "today" (YYYY-MM-DD); defaults to the local date
    #[arg(long, global = true, value_parser = commands::parse_day)]
    today: Option<NaiveDate>,

    /// Log filter (overridden by CYCLETRACK_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily observation log
    Observe {
        #[command(subcommand)]
        action: commands::observe::ObserveAction,
    },
    /// Detected periods, ovulation episodes, statistics and luteal phase
    Cycle {
        #[command(subcommand)]
        action: commands::cycle::CycleAction,
    },
    /// Forecast generation and storage
    Forecast {
        #[command(subcommand)]
        action: commands::forecast::ForecastAction,
    },
    /// Forecast accuracy against logged bleeding
    Accuracy {
        #[command(subcommand)]
        action: commands::accuracy::AccuracyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate a synthetic observation history
    Simulate(commands::simulate::SimulateArgs),
    /// Print shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("CYCLETRACK_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    tracing::debug!(%today, "reference date");

    let result = match cli.command {
        Commands::Observe { action } => commands::observe::run(action, today),
        Commands::Cycle { action } => commands::cycle::run(action, today),
        Commands::Forecast { action } => commands::forecast::run(action, today),
        Commands::Accuracy { action } => commands::accuracy::run(action, today),
        Commands::Config { action } => commands::config::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "cycletrack-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
