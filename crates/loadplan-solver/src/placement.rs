//! Interactive placement
//!
//! Turns calendar gestures into solver calls:
//! - dropping a task on a day assigns its start and the solver's due date
//! - dragging a task's trailing edge resizes it, never below the feasible span
//! - the repair pass pushes drifted due dates forward after any change
//!
//! A resize spans several pointer events. Its state lives in an explicit
//! [`ResizeSession`] value; the task list is only touched on release.

use loadplan_core::{CapacityConfig, DateKey, MinDueDate, ScheduleError, Task, TaskId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contention::{in_claim_order, ContentionPolicy};
use crate::due_date::{min_due_date, MAX_WALK_DAYS};

/// Largest span change a single drag can request, in days
const MAX_DRAG_DAYS: f64 = (MAX_WALK_DAYS * 10) as f64;

// ============================================================================
// Assign
// ============================================================================

/// Result of assigning a start date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub task_id: TaskId,
    pub start: DateKey,
    pub due: DateKey,
    /// The solver hit its walk bound; `due` is not a real finish date
    pub capped: bool,
}

/// Minutes used when placing a task. Finished work falls back to the full
/// estimate so a re-dragged task still gets a sensible span.
pub fn placement_minutes(task: &Task) -> f64 {
    let remaining = task.remaining_minutes();
    if remaining > 0.0 {
        remaining
    } else {
        task.estimated_duration.max(0) as f64
    }
}

/// Put `task_id` on the calendar starting at `start`
pub fn assign_start<P: ContentionPolicy + ?Sized>(
    tasks: &mut [Task],
    capacity: &CapacityConfig,
    policy: &P,
    task_id: &str,
    start: DateKey,
) -> Result<Placement, ScheduleError> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;

    let minutes = placement_minutes(task);
    let estimate = task.estimated_duration;
    let due = min_due_date(tasks, capacity, policy, start, minutes, task_id, estimate);

    let task = find_mut(tasks, task_id)?;
    task.start_date = Some(start);
    task.due_date = Some(due.date());

    debug!(task = task_id, %start, due = %due.date(), "assigned start date");
    Ok(Placement {
        task_id: task_id.to_string(),
        start,
        due: due.date(),
        capped: due.is_capped(),
    })
}

/// Send `task_id` back to the backlog
pub fn unschedule(tasks: &mut [Task], task_id: &str) -> Result<(), ScheduleError> {
    find_mut(tasks, task_id)?.unschedule();
    Ok(())
}

fn find_mut<'a>(tasks: &'a mut [Task], task_id: &str) -> Result<&'a mut Task, ScheduleError> {
    tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))
}

// ============================================================================
// Resize
// ============================================================================

/// State captured when a resize starts
#[derive(Clone, Debug, PartialEq)]
pub struct ResizeState {
    pub task_id: TaskId,
    pub start: DateKey,
    /// Pointer position at pointer-down
    pub origin_x: f64,
    /// Width of one day column, in the same units as pointer positions
    pub column_width: f64,
    pub original_span: i64,
    /// Smallest span the solver allows
    pub min_days: i64,
    pub preview_days: Option<i64>,
}

/// Due date change produced when a resize is released
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResizeCommit {
    pub task_id: TaskId,
    pub due: DateKey,
    pub span_days: i64,
}

/// Edge-drag session: `Idle -> Resizing -> Idle`
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ResizeSession {
    #[default]
    Idle,
    Resizing(ResizeState),
}

impl ResizeSession {
    /// Start resizing `task`. `min_due` is the solver's minimum for its current start.
    pub fn begin(
        &mut self,
        task: &Task,
        min_due: MinDueDate,
        pointer_x: f64,
        column_width: f64,
    ) -> Result<(), ScheduleError> {
        if let ResizeSession::Resizing(active) = self {
            return Err(ScheduleError::ResizeInProgress(active.task_id.clone()));
        }
        if !column_width.is_finite() || column_width <= 0.0 {
            return Err(ScheduleError::InvalidGeometry(column_width));
        }
        let (start, due) = task
            .date_range()
            .ok_or_else(|| ScheduleError::NotScheduled(task.id.clone()))?;

        let min_days = (start.days_until(min_due.date()) + 1).max(1);
        *self = ResizeSession::Resizing(ResizeState {
            task_id: task.id.clone(),
            start,
            origin_x: pointer_x,
            column_width,
            original_span: start.days_until(due) + 1,
            min_days,
            preview_days: None,
        });
        debug!(task = %task.id, min_days, "resize started");
        Ok(())
    }

    /// Update the preview. Returns the previewed span, `None` when idle.
    pub fn pointer_move(&mut self, pointer_x: f64) -> Option<i64> {
        let ResizeSession::Resizing(state) = self else {
            return None;
        };
        let columns = ((pointer_x - state.origin_x) / state.column_width).round();
        let delta_days = if columns.is_nan() {
            0
        } else {
            columns.clamp(-MAX_DRAG_DAYS, MAX_DRAG_DAYS) as i64
        };
        let preview = state
            .original_span
            .saturating_add(delta_days)
            .max(state.min_days);
        state.preview_days = Some(preview);
        Some(preview)
    }

    /// End the session, committing the last preview if there is one
    pub fn release(&mut self) -> Option<ResizeCommit> {
        let ResizeSession::Resizing(state) = std::mem::take(self) else {
            return None;
        };
        let span_days = state.preview_days?;
        Some(ResizeCommit {
            due: state.start.add_days(span_days - 1),
            task_id: state.task_id,
            span_days,
        })
    }

    /// Abandon the session without committing
    pub fn cancel(&mut self) {
        *self = ResizeSession::Idle;
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ResizeSession::Resizing(_))
    }

    pub fn preview_days(&self) -> Option<i64> {
        match self {
            ResizeSession::Resizing(state) => state.preview_days,
            ResizeSession::Idle => None,
        }
    }
}

/// Apply a released resize to the task list
pub fn apply_resize(tasks: &mut [Task], commit: &ResizeCommit) -> Result<(), ScheduleError> {
    let task = find_mut(tasks, &commit.task_id)?;
    if task.start_date.is_none() {
        return Err(ScheduleError::NotScheduled(commit.task_id.clone()));
    }
    task.due_date = Some(commit.due);
    Ok(())
}

// ============================================================================
// Repair
// ============================================================================

/// A due date the repair pass pushed forward
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepairChange {
    pub task_id: TaskId,
    pub previous_due: DateKey,
    pub new_due: DateKey,
    pub capped: bool,
}

/// Push every scheduled task's due date up to the solver's minimum.
///
/// Tasks are checked in claim order and each correction is visible to the
/// tasks checked after it. Due dates only ever move forward.
pub fn repair<P: ContentionPolicy + ?Sized>(
    tasks: &mut [Task],
    capacity: &CapacityConfig,
    policy: &P,
) -> Vec<RepairChange> {
    let order: Vec<TaskId> = in_claim_order(
        tasks.iter().filter(|t| t.is_active_on_calendar()),
        policy,
    )
    .into_iter()
    .map(|t| t.id.clone())
    .collect();

    let mut changes = Vec::new();
    for task_id in order {
        let Some(task) = tasks.iter().find(|t| t.id == task_id) else {
            continue;
        };
        let Some((start, due)) = task.date_range() else {
            continue;
        };
        let min_due = min_due_date(
            tasks,
            capacity,
            policy,
            start,
            task.remaining_minutes(),
            &task_id,
            task.estimated_duration,
        );
        if due >= min_due.date() {
            continue;
        }
        if min_due.is_capped() {
            warn!(task = %task_id, "repair target is capped; task cannot fit current capacity");
        }

        if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
            task.due_date = Some(min_due.date());
        }
        debug!(task = %task_id, from = %due, to = %min_due.date(), "pushed due date forward");
        changes.push(RepairChange {
            task_id,
            previous_due: due,
            new_due: min_due.date(),
            capped: min_due.is_capped(),
        });
    }

    if !changes.is_empty() {
        info!(repaired = changes.len(), "repair pass moved due dates");
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contention::ShortestFirst;
    use loadplan_core::{TaskStatus, WeekendConfig};
    use pretty_assertions::assert_eq;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    fn every_day() -> CapacityConfig {
        CapacityConfig {
            daily_capacity_hours: 7.0,
            weekend: WeekendConfig::working(),
        }
    }

    fn scheduled(id: &str, minutes: i64, start: &str, due: &str) -> Task {
        Task::new(id).estimate(minutes).scheduled(key(start), key(due))
    }

    #[test]
    fn assign_sets_both_dates() {
        let mut tasks = vec![Task::new("a").estimate(840)];
        let placement =
            assign_start(&mut tasks, &every_day(), &ShortestFirst, "a", key("2024-01-01")).unwrap();

        assert_eq!(placement.due, key("2024-01-02"));
        assert!(!placement.capped);
        assert_eq!(tasks[0].date_range(), Some((key("2024-01-01"), key("2024-01-02"))));
    }

    #[test]
    fn assign_finished_task_uses_full_estimate() {
        let mut tasks = vec![Task::new("a").estimate(840).spent(840 * 60)];
        let placement =
            assign_start(&mut tasks, &every_day(), &ShortestFirst, "a", key("2024-01-01")).unwrap();
        assert_eq!(placement.due, key("2024-01-02"));
    }

    #[test]
    fn assign_unknown_task_fails() {
        let mut tasks = vec![Task::new("a")];
        let err = assign_start(&mut tasks, &every_day(), &ShortestFirst, "nope", key("2024-01-01"))
            .unwrap_err();
        assert_eq!(err, ScheduleError::TaskNotFound("nope".into()));
    }

    #[test]
    fn unschedule_clears_dates() {
        let mut tasks = vec![scheduled("a", 60, "2024-01-01", "2024-01-01")];
        unschedule(&mut tasks, "a").unwrap();
        assert!(!tasks[0].is_scheduled());
        assert!(unschedule(&mut tasks, "b").is_err());
    }

    #[test]
    fn resize_cannot_shrink_below_minimum() {
        let task = scheduled("a", 1260, "2024-01-01", "2024-01-05");
        let mut session = ResizeSession::default();
        session
            .begin(&task, MinDueDate::Feasible(key("2024-01-03")), 100.0, 40.0)
            .unwrap();

        // Drag four columns left: 5 - 4 = 1, clamped to 3
        assert_eq!(session.pointer_move(-60.0), Some(3));
        // Drag two columns right
        assert_eq!(session.pointer_move(180.0), Some(7));

        let commit = session.release().unwrap();
        assert_eq!(commit.due, key("2024-01-07"));
        assert_eq!(commit.span_days, 7);
        assert!(!session.is_active());
    }

    #[test]
    fn extreme_pointer_positions_are_bounded() {
        let task = scheduled("a", 60, "2024-01-01", "2024-01-02");
        let mut session = ResizeSession::default();
        session
            .begin(&task, MinDueDate::Feasible(key("2024-01-01")), 0.0, 30.0)
            .unwrap();

        let far = session.pointer_move(1e300).unwrap();
        assert_eq!(far, 2 + 3650);
        assert_eq!(session.pointer_move(-1e300), Some(1));
        assert_eq!(session.pointer_move(f64::NAN), Some(2));

        session.pointer_move(1e300);
        let commit = session.release().unwrap();
        assert_eq!(commit.due, key("2024-01-01").add_days(far - 1));
    }

    #[test]
    fn release_without_preview_commits_nothing() {
        let task = scheduled("a", 60, "2024-01-01", "2024-01-02");
        let mut session = ResizeSession::default();
        session
            .begin(&task, MinDueDate::Feasible(key("2024-01-01")), 0.0, 30.0)
            .unwrap();
        assert_eq!(session.release(), None);
        assert_eq!(session, ResizeSession::Idle);
        assert_eq!(session.release(), None);
    }

    #[test]
    fn cancel_discards_preview() {
        let task = scheduled("a", 60, "2024-01-01", "2024-01-02");
        let mut session = ResizeSession::default();
        session
            .begin(&task, MinDueDate::Feasible(key("2024-01-01")), 0.0, 30.0)
            .unwrap();
        session.pointer_move(90.0);
        assert_eq!(session.preview_days(), Some(5));
        session.cancel();
        assert_eq!(session.release(), None);
    }

    #[test]
    fn resize_sessions_are_exclusive() {
        let a = scheduled("a", 60, "2024-01-01", "2024-01-02");
        let b = scheduled("b", 60, "2024-01-01", "2024-01-02");
        let mut session = ResizeSession::default();
        let min = MinDueDate::Feasible(key("2024-01-01"));
        session.begin(&a, min, 0.0, 30.0).unwrap();
        assert_eq!(
            session.begin(&b, min, 0.0, 30.0),
            Err(ScheduleError::ResizeInProgress("a".into()))
        );
    }

    #[test]
    fn resize_rejects_backlog_and_bad_geometry() {
        let mut session = ResizeSession::default();
        let min = MinDueDate::Feasible(key("2024-01-01"));
        assert_eq!(
            session.begin(&Task::new("x"), min, 0.0, 30.0),
            Err(ScheduleError::NotScheduled("x".into()))
        );
        let task = scheduled("a", 60, "2024-01-01", "2024-01-02");
        assert_eq!(
            session.begin(&task, min, 0.0, 0.0),
            Err(ScheduleError::InvalidGeometry(0.0))
        );
        assert_eq!(session.pointer_move(10.0), None);
    }

    #[test]
    fn apply_resize_updates_due() {
        let mut tasks = vec![scheduled("a", 60, "2024-01-01", "2024-01-02")];
        let commit = ResizeCommit {
            task_id: "a".into(),
            due: key("2024-01-09"),
            span_days: 9,
        };
        apply_resize(&mut tasks, &commit).unwrap();
        assert_eq!(tasks[0].due_date, Some(key("2024-01-09")));
    }

    #[test]
    fn repair_pushes_drifted_due_dates() {
        let mut tasks = vec![
            scheduled("short", 420, "2024-01-01", "2024-01-01"),
            scheduled("long", 840, "2024-01-01", "2024-01-01"),
            scheduled("roomy", 60, "2024-01-10", "2024-01-20"),
        ];
        let changes = repair(&mut tasks, &every_day(), &ShortestFirst);

        // "short" fills Jan 1, so "long" needs Jan 2 and Jan 3
        assert_eq!(
            changes,
            vec![RepairChange {
                task_id: "long".into(),
                previous_due: key("2024-01-01"),
                new_due: key("2024-01-03"),
                capped: false,
            }]
        );
        assert_eq!(tasks[2].due_date, Some(key("2024-01-20")));
    }

    #[test]
    fn repair_after_capacity_cut() {
        let mut tasks = vec![scheduled("a", 840, "2024-01-01", "2024-01-02")];
        assert!(repair(&mut tasks, &every_day(), &ShortestFirst).is_empty());

        let reduced = CapacityConfig {
            daily_capacity_hours: 3.5,
            weekend: WeekendConfig::working(),
        };
        let changes = repair(&mut tasks, &reduced, &ShortestFirst);
        assert_eq!(changes.len(), 1);
        assert_eq!(tasks[0].due_date, Some(key("2024-01-04")));
    }

    #[test]
    fn repair_is_idempotent() {
        let mut tasks = vec![
            scheduled("a", 300, "2024-01-01", "2024-01-01"),
            scheduled("b", 300, "2024-01-01", "2024-01-01"),
            scheduled("c", 900, "2024-01-02", "2024-01-02"),
            scheduled("d", 2000, "2024-01-01", "2024-01-03"),
            scheduled("e", 100, "2024-01-05", "2024-01-04"),
        ];
        let capacity = CapacityConfig::default();
        let first = repair(&mut tasks, &capacity, &ShortestFirst);
        assert!(!first.is_empty());

        let snapshot = tasks.clone();
        let second = repair(&mut tasks, &capacity, &ShortestFirst);
        assert!(second.is_empty(), "second pass moved {second:?}");
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn repair_skips_terminal_tasks() {
        let mut tasks = vec![
            scheduled("done", 5000, "2024-01-01", "2024-01-01").with_status(TaskStatus::Done)
        ];
        assert!(repair(&mut tasks, &every_day(), &ShortestFirst).is_empty());
    }
}
