//! # loadplan-core
//!
//! Core domain model and traits for the loadplan scheduling engine.
//!
//! This crate provides:
//! - Date keys: `DateKey`, a canonical `YYYY-MM-DD` calendar day
//! - Capacity configuration: `CapacityConfig`, `WeekendConfig`, `DayMode`
//! - Domain types: `Task`, `TaskStatus`
//! - Derived result types: `DailyLoadMap`, `MinDueDate`, `OverloadPeriod`
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use loadplan_core::{CapacityConfig, DateKey, Task};
//!
//! let monday = DateKey::parse("2024-01-01").unwrap();
//! let task = Task::new("write-report")
//!     .title("Write report")
//!     .estimate(420)
//!     .scheduled(monday, monday);
//!
//! let capacity = CapacityConfig::default();
//! assert_eq!(capacity.day_capacity(monday), 7.0);
//! assert_eq!(task.remaining_minutes(), 420.0);
//! ```

pub mod capacity;
pub mod date;

pub use capacity::{CapacityConfig, DayMode, WeekendConfig};
pub use date::{DateKey, DateKeyError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique identifier for a task
pub type TaskId = String;

/// Load ratio above which a day counts as overloaded
pub const OVERLOAD_RATIO: f64 = 1.001;

/// Load ratio above which a day counts as near capacity
pub const NEAR_CAPACITY_RATIO: f64 = 0.85;

// ============================================================================
// Task
// ============================================================================

/// Workflow state of a task
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Archived,
}

impl TaskStatus {
    /// Terminal tasks never consume capacity
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Archived)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "Todo"),
            TaskStatus::InProgress => write!(f, "In Progress"),
            TaskStatus::Done => write!(f, "Done"),
            TaskStatus::Archived => write!(f, "Archived"),
        }
    }
}

/// The scheduling view of a task owned by the surrounding application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// Display label
    #[serde(default)]
    pub title: String,
    /// Planned work in minutes
    #[serde(default)]
    pub estimated_duration: i64,
    /// Work already logged, in seconds
    #[serde(default)]
    pub spent_duration: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateKey>,
    /// Display class carried into daily load entries
    #[serde(default = "default_color_class")]
    pub color_class: String,
}

fn default_color_class() -> String {
    "default".into()
}

impl Task {
    /// Create a new backlog task with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            estimated_duration: 0,
            spent_duration: 0,
            status: TaskStatus::Todo,
            start_date: None,
            due_date: None,
            color_class: default_color_class(),
        }
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the estimated duration in minutes
    pub fn estimate(mut self, minutes: i64) -> Self {
        self.estimated_duration = minutes;
        self
    }

    /// Set the time already spent, in seconds
    pub fn spent(mut self, seconds: i64) -> Self {
        self.spent_duration = seconds;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Place the task on the calendar
    pub fn scheduled(mut self, start: DateKey, due: DateKey) -> Self {
        self.start_date = Some(start);
        self.due_date = Some(due);
        self
    }

    /// Set the display class
    pub fn color_class(mut self, class: impl Into<String>) -> Self {
        self.color_class = class.into();
        self
    }

    /// Work still to do, in minutes. Never negative.
    pub fn remaining_minutes(&self) -> f64 {
        let spent_minutes = self.spent_duration as f64 / 60.0;
        (self.estimated_duration as f64 - spent_minutes).max(0.0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Both start and due date assigned
    pub fn is_scheduled(&self) -> bool {
        self.start_date.is_some() && self.due_date.is_some()
    }

    /// `(start, due)` when scheduled
    pub fn date_range(&self) -> Option<(DateKey, DateKey)> {
        Some((self.start_date?, self.due_date?))
    }

    /// Scheduled and not in a terminal state
    pub fn is_active_on_calendar(&self) -> bool {
        self.is_scheduled() && !self.is_terminal()
    }

    /// Number of calendar days covered, inclusive. `None` for backlog tasks.
    pub fn span_days(&self) -> Option<i64> {
        let (start, due) = self.date_range()?;
        Some(start.days_until(due) + 1)
    }

    /// Return to the backlog
    pub fn unschedule(&mut self) {
        self.start_date = None;
        self.due_date = None;
    }
}

// ============================================================================
// Solver Result
// ============================================================================

/// Outcome of a minimum-due-date search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum MinDueDate {
    /// The remaining work fits; this is the first day it can finish
    Feasible(DateKey),
    /// The day walk hit its iteration bound before the work was absorbed.
    /// Carries the day the walk reached.
    Capped(DateKey),
}

impl MinDueDate {
    pub fn date(&self) -> DateKey {
        match self {
            MinDueDate::Feasible(date) | MinDueDate::Capped(date) => *date,
        }
    }

    pub fn is_capped(&self) -> bool {
        matches!(self, MinDueDate::Capped(_))
    }
}

// ============================================================================
// Daily Load
// ============================================================================

/// Visual classification of a day's load
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadLevel {
    Healthy,
    NearCapacity,
    Overloaded,
}

impl LoadLevel {
    /// Classify `load_minutes` against a day with `capacity_hours`
    pub fn classify(load_minutes: f64, capacity_hours: f64) -> Self {
        if capacity_hours <= 0.0 {
            return if load_minutes > 0.0 {
                LoadLevel::Overloaded
            } else {
                LoadLevel::Healthy
            };
        }
        let ratio = load_minutes / 60.0 / capacity_hours;
        if ratio > OVERLOAD_RATIO {
            LoadLevel::Overloaded
        } else if ratio > NEAR_CAPACITY_RATIO {
            LoadLevel::NearCapacity
        } else {
            LoadLevel::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadLevel::Healthy => "healthy",
            LoadLevel::NearCapacity => "near-capacity",
            LoadLevel::Overloaded => "overloaded",
        }
    }
}

impl std::fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One task's share of a day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLoad {
    pub id: TaskId,
    pub title: String,
    /// Minutes posted to the day
    pub load: f64,
    pub color_class: String,
}

/// Aggregate load on one day
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyLoadEntry {
    /// Minutes posted by all tasks
    pub total: f64,
    pub tasks: Vec<TaskLoad>,
}

/// Per-day load, ordered by date
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLoadMap {
    days: BTreeMap<DateKey, DailyLoadEntry>,
}

impl DailyLoadMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `minutes` for `task` on `date`, merging with an existing entry for the same task
    pub fn post(&mut self, date: DateKey, task: &Task, minutes: f64) {
        let day = self.days.entry(date).or_default();
        day.total += minutes;
        match day.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => existing.load += minutes,
            None => day.tasks.push(TaskLoad {
                id: task.id.clone(),
                title: task.title.clone(),
                load: minutes,
                color_class: task.color_class.clone(),
            }),
        }
    }

    pub fn get(&self, date: DateKey) -> Option<&DailyLoadEntry> {
        self.days.get(&date)
    }

    /// Minutes posted on `date` (0 for untouched days)
    pub fn total(&self, date: DateKey) -> f64 {
        self.days.get(&date).map(|d| d.total).unwrap_or(0.0)
    }

    /// Minutes `task_id` posted on `date`
    pub fn task_load(&self, date: DateKey, task_id: &str) -> f64 {
        self.days
            .get(&date)
            .and_then(|d| d.tasks.iter().find(|t| t.id == task_id))
            .map(|t| t.load)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateKey, &DailyLoadEntry)> {
        self.days.iter().map(|(date, entry)| (*date, entry))
    }

    pub fn dates(&self) -> impl Iterator<Item = DateKey> + '_ {
        self.days.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Sum of all posted minutes
    pub fn grand_total(&self) -> f64 {
        self.days.values().map(|d| d.total).sum()
    }

    /// Restrict to `[from, to]`; empty when `from > to`
    pub fn window(&self, from: DateKey, to: DateKey) -> Self {
        if from > to {
            return Self::new();
        }
        Self {
            days: self
                .days
                .range(from..=to)
                .map(|(date, entry)| (*date, entry.clone()))
                .collect(),
        }
    }

    pub fn level(&self, date: DateKey, capacity: &CapacityConfig) -> LoadLevel {
        LoadLevel::classify(self.total(date), capacity.day_capacity(date))
    }

    pub fn overloaded_days(&self, capacity: &CapacityConfig) -> Vec<DateKey> {
        self.dates()
            .filter(|date| self.level(*date, capacity) == LoadLevel::Overloaded)
            .collect()
    }

    /// Group consecutive overloaded days into periods
    pub fn overload_periods(&self, capacity: &CapacityConfig) -> Vec<OverloadPeriod> {
        let mut periods: Vec<OverloadPeriod> = Vec::new();

        for date in self.overloaded_days(capacity) {
            let Some(entry) = self.days.get(&date) else {
                continue;
            };
            match periods.last_mut() {
                Some(period) if period.end.succ() == date => {
                    period.end = date;
                    period.peak_load = period.peak_load.max(entry.total);
                    for task in &entry.tasks {
                        if !period.involved_tasks.contains(&task.id) {
                            period.involved_tasks.push(task.id.clone());
                        }
                    }
                }
                _ => periods.push(OverloadPeriod {
                    start: date,
                    end: date,
                    peak_load: entry.total,
                    involved_tasks: entry.tasks.iter().map(|t| t.id.clone()).collect(),
                }),
            }
        }

        periods
    }
}

/// A run of consecutive overloaded days
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverloadPeriod {
    pub start: DateKey,
    pub end: DateKey,
    /// Highest daily total in the run, in minutes
    pub peak_load: f64,
    pub involved_tasks: Vec<TaskId>,
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering of a daily load map
pub trait Renderer {
    type Output;

    /// Render the load map under the given capacity configuration
    fn render(
        &self,
        loads: &DailyLoadMap,
        capacity: &CapacityConfig,
    ) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Placement and session errors
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task is not scheduled: {0}")]
    NotScheduled(TaskId),

    #[error("A resize is already in progress for task {0}")]
    ResizeInProgress(TaskId),

    #[error("No resize in progress")]
    NoActiveResize,

    #[error("Invalid column width: {0}")]
    InvalidGeometry(f64),
}

/// Capacity configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Daily capacity must be a positive number of hours, got {0}")]
    InvalidCapacity(f64),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

// ============================================================================
// Tests
// ============================================================================
