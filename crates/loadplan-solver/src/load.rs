//! Daily load distribution
//!
//! Builds the per-day load map used for heat-map coloring and validation.
//! Tasks claim capacity in policy order. A multi-day task first fills the
//! headroom left on its capacity-bearing days; anything that does not fit is
//! spread over the same days in proportion to each day's capacity, which is
//! what makes an oversubscribed range show up as overload.

use loadplan_core::{CapacityConfig, DailyLoadMap, DateKey, Task};
use tracing::debug;

use crate::contention::{in_claim_order, ContentionPolicy};
use crate::due_date::WORK_EPSILON;

/// Rebuild the daily load map from scratch
pub fn distribute<P: ContentionPolicy + ?Sized>(
    tasks: &[Task],
    capacity: &CapacityConfig,
    policy: &P,
) -> DailyLoadMap {
    let mut map = DailyLoadMap::new();

    let active = tasks.iter().filter(|task| task.is_active_on_calendar());
    for task in in_claim_order(active, policy) {
        post_task(&mut map, task, capacity);
    }

    debug!(days = map.len(), total_minutes = map.grand_total(), "distributed daily load");
    map
}

fn post_task(map: &mut DailyLoadMap, task: &Task, capacity: &CapacityConfig) {
    let Some((start, due)) = task.date_range() else {
        return;
    };
    let mut work = task.remaining_minutes();
    if work <= 0.0 {
        return;
    }

    if start.days_until(due) < 1 {
        map.post(start, task, work);
        return;
    }

    let work_days: Vec<(DateKey, f64)> = start
        .iter_through(due)
        .map(|day| (day, capacity.day_capacity_minutes(day)))
        .filter(|(_, minutes)| *minutes > 0.0)
        .collect();

    if work_days.is_empty() {
        map.post(start, task, work);
        return;
    }

    for (day, day_capacity) in &work_days {
        if work <= WORK_EPSILON {
            break;
        }
        let headroom = (day_capacity - map.total(*day)).max(0.0);
        let take = headroom.min(work);
        if take > 0.0 {
            map.post(*day, task, take);
            work -= take;
        }
    }

    if work > WORK_EPSILON {
        let range_capacity: f64 = work_days.iter().map(|(_, minutes)| minutes).sum();
        debug!(task = %task.id, overflow_minutes = work, "range oversubscribed");
        for (day, day_capacity) in &work_days {
            map.post(*day, task, work * day_capacity / range_capacity);
        }
    }
}
