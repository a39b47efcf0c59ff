//! Minimum due date search
//!
//! Walks forward from the start date one day at a time. Each day contributes
//! whatever capacity is left after competing tasks take their flat daily
//! share; the first day on which the accumulated capacity covers the
//! remaining work is the minimum feasible due date.

use loadplan_core::{CapacityConfig, DateKey, MinDueDate, Task};
use tracing::warn;

use crate::contention::{build_contention_map, consumed_on, ContentionEntry, ContentionPolicy};

/// Upper bound on the number of days the search walks
pub const MAX_WALK_DAYS: usize = 365;

/// Remaining work at or below this many minutes counts as done
pub const WORK_EPSILON: f64 = 0.01;

/// Earliest date a task starting on `start` with `remaining_minutes` of work could finish.
///
/// `exclude_id` is the evaluated task itself and `total_estimated` its full
/// estimate, which the policy uses to decide who competes.
pub fn min_due_date<P: ContentionPolicy + ?Sized>(
    tasks: &[Task],
    capacity: &CapacityConfig,
    policy: &P,
    start: DateKey,
    remaining_minutes: f64,
    exclude_id: &str,
    total_estimated: i64,
) -> MinDueDate {
    if remaining_minutes <= 0.0 {
        return MinDueDate::Feasible(start);
    }
    let contention = build_contention_map(tasks, capacity, policy, exclude_id, total_estimated);
    walk_capacity(start, remaining_minutes, capacity, &contention)
}

/// Day walk over a prebuilt contention map
pub fn walk_capacity(
    start: DateKey,
    remaining_minutes: f64,
    capacity: &CapacityConfig,
    contention: &[ContentionEntry],
) -> MinDueDate {
    if remaining_minutes <= 0.0 {
        return MinDueDate::Feasible(start);
    }

    let mut remaining = remaining_minutes;
    let mut day = start;
    for _ in 0..MAX_WALK_DAYS {
        let global = capacity.day_capacity_minutes(day);
        let available = (global - consumed_on(contention, day)).max(0.0);
        remaining -= available;
        if remaining <= WORK_EPSILON {
            return MinDueDate::Feasible(day);
        }
        day = day.succ();
    }

    warn!(
        start = %start,
        reached = %day,
        unplaced_minutes = remaining,
        bound = MAX_WALK_DAYS,
        "capacity walk hit its day bound"
    );
    MinDueDate::Capped(day)
}
