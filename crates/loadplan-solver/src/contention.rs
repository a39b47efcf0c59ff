//! Contention map building
//!
//! When the solver evaluates one task, every other scheduled task that
//! competes for the same days is reduced to a flat daily consumption rate:
//! its remaining work spread evenly over the capacity-bearing days of its
//! own range.
//!
//! Which tasks compete is a policy decision. The default,
//! [`ShortestFirst`], lets shorter (or equal) tasks claim capacity ahead of
//! longer ones: a task only sees contention from tasks whose estimate does
//! not exceed its own, and longer tasks are treated as background work.

use std::cmp::Ordering;

use loadplan_core::{CapacityConfig, DateKey, Task, TaskId};
use tracing::trace;

/// Decides which scheduled tasks compete with each other for capacity
pub trait ContentionPolicy {
    /// Does `candidate` consume capacity ahead of a task estimated at `evaluated_estimate` minutes?
    fn competes(&self, candidate: &Task, evaluated_estimate: i64) -> bool;

    /// Order in which tasks claim capacity during distribution and repair
    fn claim_order(&self, a: &Task, b: &Task) -> Ordering;
}

/// Shorter tasks win capacity over longer ones
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShortestFirst;

impl ContentionPolicy for ShortestFirst {
    fn competes(&self, candidate: &Task, evaluated_estimate: i64) -> bool {
        candidate.estimated_duration <= evaluated_estimate
    }

    fn claim_order(&self, a: &Task, b: &Task) -> Ordering {
        a.estimated_duration.cmp(&b.estimated_duration)
    }
}

/// Sort tasks into claim order. The sort is stable, so ties keep input order.
pub fn in_claim_order<'a, P, I>(tasks: I, policy: &P) -> Vec<&'a Task>
where
    P: ContentionPolicy + ?Sized,
    I: IntoIterator<Item = &'a Task>,
{
    let mut ordered: Vec<&Task> = tasks.into_iter().collect();
    ordered.sort_by(|a, b| policy.claim_order(a, b));
    ordered
}

/// Flat daily consumption of one competing task
#[derive(Clone, Debug, PartialEq)]
pub struct ContentionEntry {
    pub task_id: TaskId,
    pub start: DateKey,
    pub due: DateKey,
    /// Minutes consumed on each day of the range
    pub daily_load: f64,
}

impl ContentionEntry {
    /// Whether `day` falls within `[start, due]`
    pub fn covers(&self, day: DateKey) -> bool {
        self.start <= day && day <= self.due
    }
}

/// Build contention entries for the task `exclude_id` with total estimate `evaluated_estimate`
pub fn build_contention_map<P: ContentionPolicy + ?Sized>(
    tasks: &[Task],
    capacity: &CapacityConfig,
    policy: &P,
    exclude_id: &str,
    evaluated_estimate: i64,
) -> Vec<ContentionEntry> {
    let entries: Vec<ContentionEntry> = tasks
        .iter()
        .filter(|task| task.id != exclude_id && !task.is_terminal())
        .filter(|task| policy.competes(task, evaluated_estimate))
        .filter_map(|task| {
            let (start, due) = task.date_range()?;
            let remaining = task.remaining_minutes();
            if remaining <= 0.0 {
                return None;
            }
            let effective_days = capacity.capacity_bearing_days(start, due).max(1);
            Some(ContentionEntry {
                task_id: task.id.clone(),
                start,
                due,
                daily_load: remaining / effective_days as f64,
            })
        })
        .collect();

    trace!(
        task = exclude_id,
        competitors = entries.len(),
        "built contention map"
    );
    entries
}

/// Minutes consumed by `entries` on `day`
pub fn consumed_on(entries: &[ContentionEntry], day: DateKey) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.covers(day))
        .map(|entry| entry.daily_load)
        .sum()
}
