mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icsview")]
#[command(about = "Expand iCalendar feeds into the event occurrences of a date range")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the occurrences of every event in an .ics file
    Occurrences {
        /// Path to the .ics file, or "-" for stdin
        file: PathBuf,

        /// Window start (YYYY-MM-DD or RFC 3339); defaults to now
        #[arg(long)]
        from: Option<String>,

        /// Window end (YYYY-MM-DD or RFC 3339); defaults to a week after the start
        #[arg(long)]
        to: Option<String>,

        /// IANA zone for floating and all-day times (e.g. "Europe/Berlin")
        #[arg(long)]
        tz: Option<String>,

        /// Recurrence instances examined per event
        #[arg(long)]
        max_instances: Option<u16>,

        /// Print JSON instead of a day-grouped list
        #[arg(long)]
        json: bool,
    },
    /// Check whether a task schedule applies on a date
    OccursOn {
        /// Date to check (YYYY-MM-DD)
        date: String,

        /// Schedule as JSON, e.g. '{"kind":"weekly","weeklyByDay":["MO"]}'
        #[arg(long)]
        schedule: Option<String>,
    },
    /// Show the config file location and effective options
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Occurrences {
            file,
            from,
            to,
            tz,
            max_instances,
            json,
        } => commands::occurrences::run(commands::occurrences::Args {
            file,
            from,
            to,
            tz,
            max_instances,
            json,
        }),
        Commands::OccursOn { date, schedule } => commands::occurs_on::run(&date, schedule.as_deref()),
        Commands::Config => commands::config::run(),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
