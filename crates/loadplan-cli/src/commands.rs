//! Command implementations
//!
//! Each command loads the task list and capacity configuration, builds a
//! `Planner` over that snapshot, and prints a text or JSON result.
//!
//! ## Exit Codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | `check` found violations, overloads or capped tasks; `due` was capped |
//! | 2 | Usage or input error (reported by clap or `anyhow`) |

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use loadplan_core::{CapacityConfig, DateKey, DayMode, Renderer, Task};
use loadplan_render::{JsonRenderer, TextHeatmapRenderer};
use loadplan_solver::{Planner, RepairChange};
use serde::Serialize;
use tracing::info;

use crate::OutputFormat;

/// Capacity settings given on the command line
#[derive(Debug, Default)]
pub struct CapacityOverrides {
    pub daily_hours: Option<f64>,
    pub saturday: Option<DayMode>,
    pub sunday: Option<DayMode>,
}

pub fn parse_date(raw: &str) -> Result<DateKey, String> {
    DateKey::parse(raw).map_err(|e| e.to_string())
}

pub fn parse_day_mode(raw: &str) -> Result<DayMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "off" => Ok(DayMode::Off),
        "half" => Ok(DayMode::Half),
        "full" => Ok(DayMode::Full),
        other => Err(format!("expected off, half or full, got '{other}'")),
    }
}

/// Load the configuration file (or defaults) and apply overrides
pub fn load_capacity(path: Option<&Path>, overrides: &CapacityOverrides) -> Result<CapacityConfig> {
    let mut config = match path {
        Some(path) => CapacityConfig::load(path)
            .with_context(|| format!("Failed to load capacity config {}", path.display()))?,
        None => CapacityConfig::default(),
    };
    if let Some(hours) = overrides.daily_hours {
        config.daily_capacity_hours = hours;
    }
    if let Some(mode) = overrides.saturday {
        config.weekend.saturday = mode;
    }
    if let Some(mode) = overrides.sunday {
        config.weekend.sunday = mode;
    }
    config.validate().context("Invalid capacity configuration")?;
    Ok(config)
}

fn read_tasks(path: &Path) -> Result<Vec<Task>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tasks file {}", path.display()))?;
    let tasks: Vec<Task> = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse tasks file {}", path.display()))?;
    info!(path = %path.display(), tasks = tasks.len(), "loaded tasks");
    Ok(tasks)
}

fn write_tasks(path: &Path, tasks: &[Task]) -> Result<()> {
    let json = serde_json::to_string_pretty(tasks).context("Failed to serialize tasks")?;
    fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write tasks file {}", path.display()))?;
    info!(path = %path.display(), "wrote tasks");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_repairs(changes: &[RepairChange]) {
    for change in changes {
        let note = if change.capped { " (capped)" } else { "" };
        println!(
            "repaired {}: {} -> {}{}",
            change.task_id, change.previous_due, change.new_due, note
        );
    }
}

// ============================================================================
// due
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DueOutput<'a> {
    task_id: &'a str,
    start: DateKey,
    remaining_minutes: f64,
    due: DateKey,
    capped: bool,
}

pub fn due(
    file: &Path,
    capacity: CapacityConfig,
    task_id: &str,
    start: Option<DateKey>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let planner = Planner::new(read_tasks(file)?, capacity);
    let min_due = planner.min_due_for(task_id, start)?;
    let task = planner
        .task(task_id)
        .with_context(|| format!("Task not found: {task_id}"))?;
    let start = start.or(task.start_date).unwrap_or(min_due.date());

    match format {
        OutputFormat::Json => print_json(&DueOutput {
            task_id,
            start,
            remaining_minutes: task.remaining_minutes(),
            due: min_due.date(),
            capped: min_due.is_capped(),
        })?,
        OutputFormat::Text => {
            println!("{}", min_due.date());
            if min_due.is_capped() {
                eprintln!(
                    "warning: {task_id} does not fit within the search window; {} is not a real finish date",
                    min_due.date()
                );
            }
        }
    }

    Ok(if min_due.is_capped() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

// ============================================================================
// load
// ============================================================================

pub fn load(
    file: &Path,
    capacity: CapacityConfig,
    from: Option<DateKey>,
    to: Option<DateKey>,
    show_tasks: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    if let (Some(from), Some(to)) = (from, to) {
        anyhow::ensure!(from <= to, "--from {from} is after --to {to}");
    }

    let planner = Planner::new(read_tasks(file)?, capacity);
    let mut loads = planner.load_map();
    if from.is_some() || to.is_some() {
        let first = from.or_else(|| loads.dates().next());
        let last = to.or_else(|| loads.dates().last());
        if let (Some(first), Some(last)) = (first, last) {
            loads = loads.window(first, last);
        }
    }

    let rendered = match format {
        OutputFormat::Text => TextHeatmapRenderer::new()
            .show_tasks(show_tasks)
            .render(&loads, planner.capacity())?,
        OutputFormat::Json => JsonRenderer::pretty().render(&loads, planner.capacity())?,
    };
    print!("{rendered}");
    if format == OutputFormat::Json {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// assign
// ============================================================================

pub fn assign(
    file: &Path,
    capacity: CapacityConfig,
    task_id: &str,
    start: DateKey,
    write: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut planner = Planner::new(read_tasks(file)?, capacity);
    let applied = planner.assign_start(task_id, start)?;

    match format {
        OutputFormat::Json => print_json(&applied)?,
        OutputFormat::Text => {
            let placement = &applied.value;
            println!("{}: {} -> {}", placement.task_id, placement.start, placement.due);
            print_repairs(&applied.repairs);
        }
    }

    if write {
        write_tasks(file, planner.tasks())?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// repair
// ============================================================================

pub fn repair(
    file: &Path,
    capacity: CapacityConfig,
    write: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let mut planner = Planner::new(read_tasks(file)?, capacity);
    let changes = planner.repair();

    match format {
        OutputFormat::Json => print_json(&changes)?,
        OutputFormat::Text if changes.is_empty() => println!("All due dates are feasible"),
        OutputFormat::Text => print_repairs(&changes),
    }

    if write && !changes.is_empty() {
        write_tasks(file, planner.tasks())?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// check
// ============================================================================

pub fn check(file: &Path, capacity: CapacityConfig, format: OutputFormat) -> Result<ExitCode> {
    let planner = Planner::new(read_tasks(file)?, capacity);
    let report = planner.check();

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for violation in &report.violations {
                println!(
                    "violation: {} due {} but cannot finish before {}",
                    violation.task_id, violation.due, violation.min_due
                );
            }
            for task_id in &report.capped {
                println!("capped: {task_id} does not fit within the search window");
            }
            for period in &report.overloads {
                println!(
                    "overload: {} .. {} peak {:.0} min ({})",
                    period.start,
                    period.end,
                    period.peak_load,
                    period.involved_tasks.join(", ")
                );
            }
            if report.is_clean() {
                println!("Schedule is consistent");
            }
        }
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
