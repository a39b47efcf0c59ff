//! # loadplan-render
//!
//! Rendering backends for daily load maps.
//!
//! This crate provides:
//! - `TextHeatmapRenderer`: one line per day with a load bar and task breakdown
//! - `JsonRenderer`: the load map annotated with capacity and load level
//!
//! ## Example
//!
//! ```rust,ignore
//! use loadplan_core::Renderer;
//! use loadplan_render::{JsonRenderer, TextHeatmapRenderer};
//!
//! let loads = planner.load_map();
//! let text = TextHeatmapRenderer::new().render(&loads, planner.capacity())?;
//! let json = JsonRenderer::pretty().render(&loads, planner.capacity())?;
//! ```

use loadplan_core::{
    CapacityConfig, DailyLoadMap, DateKey, LoadLevel, RenderError, Renderer, TaskLoad,
};
use serde::Serialize;

// ============================================================================
// Text
// ============================================================================

/// Plain-text heat map
#[derive(Clone, Debug)]
pub struct TextHeatmapRenderer {
    /// Width of the load bar at 100% capacity, in characters
    pub bar_width: usize,
    /// Show each task's share under the day line
    pub show_tasks: bool,
    /// Emit days between the first and last loaded day even when empty
    pub fill_gaps: bool,
}

impl Default for TextHeatmapRenderer {
    fn default() -> Self {
        Self {
            bar_width: 20,
            show_tasks: true,
            fill_gaps: true,
        }
    }
}

impl TextHeatmapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    pub fn show_tasks(mut self, show: bool) -> Self {
        self.show_tasks = show;
        self
    }

    pub fn fill_gaps(mut self, fill: bool) -> Self {
        self.fill_gaps = fill;
        self
    }

    fn level_marker(level: LoadLevel) -> char {
        match level {
            LoadLevel::Healthy => ' ',
            LoadLevel::NearCapacity => '~',
            LoadLevel::Overloaded => '!',
        }
    }

    fn bar(&self, load_minutes: f64, capacity_minutes: f64) -> String {
        if capacity_minutes <= 0.0 {
            let fill = if load_minutes > 0.0 { 'x' } else { '.' };
            return std::iter::repeat(fill).take(self.bar_width).collect();
        }
        let ratio = (load_minutes / capacity_minutes).clamp(0.0, 1.0);
        let filled = (ratio * self.bar_width as f64).round() as usize;
        let mut bar: String = std::iter::repeat('#').take(filled).collect();
        bar.extend(std::iter::repeat('.').take(self.bar_width - filled));
        bar
    }

    fn day_line(&self, out: &mut String, date: DateKey, tasks: &[TaskLoad], total: f64, capacity: &CapacityConfig) {
        let capacity_minutes = capacity.day_capacity_minutes(date);
        let level = LoadLevel::classify(total, capacity.day_capacity(date));
        out.push_str(&format!(
            "{} {} {} [{}] {:>6.0}/{:<4.0} min  {}\n",
            Self::level_marker(level),
            date,
            date.weekday(),
            self.bar(total, capacity_minutes),
            total,
            capacity_minutes,
            level,
        ));
        if self.show_tasks {
            for task in tasks {
                out.push_str(&format!("      - {:<24} {:>6.0} min\n", task.title, task.load));
            }
        }
    }
}

impl Renderer for TextHeatmapRenderer {
    type Output = String;

    fn render(&self, loads: &DailyLoadMap, capacity: &CapacityConfig) -> Result<String, RenderError> {
        let mut out = String::new();
        let (Some(first), Some(last)) = (loads.dates().next(), loads.dates().last()) else {
            out.push_str("No scheduled work\n");
            return Ok(out);
        };

        if self.fill_gaps {
            for date in first.iter_through(last) {
                match loads.get(date) {
                    Some(entry) => self.day_line(&mut out, date, &entry.tasks, entry.total, capacity),
                    None => self.day_line(&mut out, date, &[], 0.0, capacity),
                }
            }
        } else {
            for (date, entry) in loads.iter() {
                self.day_line(&mut out, date, &entry.tasks, entry.total, capacity);
            }
        }

        let overloaded = loads.overloaded_days(capacity).len();
        out.push_str(&format!(
            "\n{} day(s), {:.0} min scheduled, {} overloaded\n",
            loads.len(),
            loads.grand_total(),
            overloaded
        ));
        Ok(out)
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON view of a load map
#[derive(Clone, Debug, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDay<'a> {
    date: DateKey,
    capacity_hours: f64,
    total: f64,
    level: LoadLevel,
    tasks: &'a [TaskLoad],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    daily_capacity_hours: f64,
    days: Vec<JsonDay<'a>>,
    overloaded_days: Vec<DateKey>,
}

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, loads: &DailyLoadMap, capacity: &CapacityConfig) -> Result<String, RenderError> {
        let report = JsonReport {
            daily_capacity_hours: capacity.daily_capacity_hours,
            days: loads
                .iter()
                .map(|(date, entry)| JsonDay {
                    date,
                    capacity_hours: capacity.day_capacity(date),
                    total: entry.total,
                    level: LoadLevel::classify(entry.total, capacity.day_capacity(date)),
                    tasks: &entry.tasks,
                })
                .collect(),
            overloaded_days: loads.overloaded_days(capacity),
        };

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        rendered.map_err(|e| RenderError::Format(e.to_string()))
    }
}
