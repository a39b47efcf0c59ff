//! loadplan CLI - Capacity-Aware Task Scheduling
//!
//! Command-line interface for computing due dates, daily load heat maps and
//! repairing schedules stored as JSON task lists.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use loadplan_core::DateKey;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "loadplan")]
#[command(author, version, about = "Capacity-aware task scheduling", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Capacity configuration file (TOML)
    #[arg(short, long, env = "LOADPLAN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the base daily capacity in hours
    #[arg(long, global = true)]
    daily_hours: Option<f64>,

    /// Override Saturday capacity (off, half, full)
    #[arg(long, global = true, value_parser = commands::parse_day_mode)]
    saturday: Option<loadplan_core::DayMode>,

    /// Override Sunday capacity (off, half, full)
    #[arg(long, global = true, value_parser = commands::parse_day_mode)]
    sunday: Option<loadplan_core::DayMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the minimum feasible due date for a task
    Due {
        /// Tasks file (JSON array)
        #[arg(value_name = "TASKS")]
        file: PathBuf,

        /// Task to evaluate
        #[arg(short, long)]
        task: String,

        /// Start date (defaults to the task's own start date)
        #[arg(short, long, value_parser = commands::parse_date)]
        start: Option<DateKey>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the per-day load heat map
    Load {
        /// Tasks file (JSON array)
        #[arg(value_name = "TASKS")]
        file: PathBuf,

        /// First day to show
        #[arg(long, value_parser = commands::parse_date)]
        from: Option<DateKey>,

        /// Last day to show
        #[arg(long, value_parser = commands::parse_date)]
        to: Option<DateKey>,

        /// Hide the per-task breakdown
        #[arg(long)]
        no_tasks: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Place a task on the calendar starting at a given date
    Assign {
        /// Tasks file (JSON array)
        #[arg(value_name = "TASKS")]
        file: PathBuf,

        #[arg(short, long)]
        task: String,

        #[arg(short, long, value_parser = commands::parse_date)]
        start: DateKey,

        /// Write the updated task list back to the file
        #[arg(short, long)]
        write: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Push due dates that fall before their feasible minimum
    Repair {
        /// Tasks file (JSON array)
        #[arg(value_name = "TASKS")]
        file: PathBuf,

        /// Write the repaired task list back to the file
        #[arg(short, long)]
        write: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Report due date violations and overloaded days (exit 1 if any)
    Check {
        /// Tasks file (JSON array)
        #[arg(value_name = "TASKS")]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let overrides = commands::CapacityOverrides {
        daily_hours: cli.daily_hours,
        saturday: cli.saturday,
        sunday: cli.sunday,
    };
    let capacity = commands::load_capacity(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Commands::Due {
            file,
            task,
            start,
            format,
        } => commands::due(&file, capacity, &task, start, format),
        Commands::Load {
            file,
            from,
            to,
            no_tasks,
            format,
        } => commands::load(&file, capacity, from, to, !no_tasks, format),
        Commands::Assign {
            file,
            task,
            start,
            write,
            format,
        } => commands::assign(&file, capacity, &task, start, write, format),
        Commands::Repair {
            file,
            write,
            format,
        } => commands::repair(&file, capacity, write, format),
        Commands::Check { file, format } => commands::check(&file, capacity, format),
    }
}
