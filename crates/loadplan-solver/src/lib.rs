//! # loadplan-solver
//!
//! Capacity-aware scheduling over a single shared daily budget.
//!
//! This crate provides:
//! - Contention maps with a swappable `ContentionPolicy`
//! - Minimum feasible due date search (`min_due_date`)
//! - Daily load distribution for heat maps (`distribute`)
//! - Placement gestures: assign, resize sessions and the repair pass
//! - `Planner`, which owns one consistent snapshot and ties it all together
//!
//! ## Example
//!
//! ```rust
//! use loadplan_core::{CapacityConfig, DateKey, Task, WeekendConfig};
//! use loadplan_solver::Planner;
//!
//! let capacity = CapacityConfig::new(7.0, WeekendConfig::working()).unwrap();
//! let mut planner = Planner::new(vec![Task::new("report").estimate(840)], capacity);
//!
//! let monday = DateKey::parse("2024-01-01").unwrap();
//! let applied = planner.assign_start("report", monday).unwrap();
//! assert_eq!(applied.value.due.to_string(), "2024-01-02");
//! ```

pub mod contention;
pub mod due_date;
pub mod load;
pub mod placement;

pub use contention::{
    build_contention_map, in_claim_order, ContentionEntry, ContentionPolicy, ShortestFirst,
};
pub use due_date::{min_due_date, walk_capacity, MAX_WALK_DAYS, WORK_EPSILON};
pub use load::distribute;
pub use placement::{
    apply_resize, assign_start, placement_minutes, repair, unschedule, Placement, RepairChange,
    ResizeCommit, ResizeSession, ResizeState,
};

use loadplan_core::{
    CapacityConfig, DailyLoadMap, DateKey, MinDueDate, OverloadPeriod, ScheduleError, Task, TaskId,
};
use serde::Serialize;

/// A mutation's own result plus the due dates the follow-up repair pass moved
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Applied<T> {
    pub value: T,
    pub repairs: Vec<RepairChange>,
}

/// A scheduled task whose due date is earlier than the solver allows
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DueDateViolation {
    pub task_id: TaskId,
    pub due: DateKey,
    pub min_due: DateKey,
}

/// Read-only consistency check of a snapshot
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeasibilityReport {
    pub violations: Vec<DueDateViolation>,
    /// Tasks whose minimum due date search hit the walk bound
    pub capped: Vec<TaskId>,
    pub overloads: Vec<OverloadPeriod>,
}

impl FeasibilityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.capped.is_empty() && self.overloads.is_empty()
    }
}

/// Owns a task snapshot, the capacity configuration and the resize session.
///
/// Every mutation runs the repair pass afterwards so the snapshot never stays
/// inconsistent longer than one call.
#[derive(Clone, Debug)]
pub struct Planner<P: ContentionPolicy = ShortestFirst> {
    tasks: Vec<Task>,
    capacity: CapacityConfig,
    policy: P,
    resize: ResizeSession,
}

impl Planner<ShortestFirst> {
    pub fn new(tasks: Vec<Task>, capacity: CapacityConfig) -> Self {
        Self::with_policy(tasks, capacity, ShortestFirst)
    }
}

impl<P: ContentionPolicy> Planner<P> {
    pub fn with_policy(tasks: Vec<Task>, capacity: CapacityConfig, policy: P) -> Self {
        Self {
            tasks,
            capacity,
            policy,
            resize: ResizeSession::Idle,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn capacity(&self) -> &CapacityConfig {
        &self.capacity
    }

    pub fn resize_session(&self) -> &ResizeSession {
        &self.resize
    }

    /// Hours available on `date`
    pub fn day_capacity(&self, date: DateKey) -> f64 {
        self.capacity.day_capacity(date)
    }

    /// Minimum feasible due date for arbitrary inputs against this snapshot
    pub fn min_due_date(
        &self,
        start: DateKey,
        remaining_minutes: f64,
        exclude_id: &str,
        total_estimated: i64,
    ) -> MinDueDate {
        min_due_date(
            &self.tasks,
            &self.capacity,
            &self.policy,
            start,
            remaining_minutes,
            exclude_id,
            total_estimated,
        )
    }

    /// Minimum due date for a known task starting on `start`, or on its own start date
    pub fn min_due_for(
        &self,
        task_id: &str,
        start: Option<DateKey>,
    ) -> Result<MinDueDate, ScheduleError> {
        let task = self
            .task(task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        let start = start
            .or(task.start_date)
            .ok_or_else(|| ScheduleError::NotScheduled(task_id.to_string()))?;
        Ok(self.min_due_date(
            start,
            task.remaining_minutes(),
            task_id,
            task.estimated_duration,
        ))
    }

    pub fn contention_for(&self, task_id: &str) -> Result<Vec<ContentionEntry>, ScheduleError> {
        let task = self
            .task(task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        Ok(build_contention_map(
            &self.tasks,
            &self.capacity,
            &self.policy,
            task_id,
            task.estimated_duration,
        ))
    }

    /// Per-day load for the current snapshot
    pub fn load_map(&self) -> DailyLoadMap {
        distribute(&self.tasks, &self.capacity, &self.policy)
    }

    /// Replace the capacity configuration and repair the schedule against it
    pub fn set_capacity(&mut self, capacity: CapacityConfig) -> Vec<RepairChange> {
        self.capacity = capacity;
        self.repair()
    }

    /// Insert or replace a task by id
    pub fn upsert_task(&mut self, task: Task) -> Vec<RepairChange> {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        self.repair()
    }

    pub fn assign_start(
        &mut self,
        task_id: &str,
        start: DateKey,
    ) -> Result<Applied<Placement>, ScheduleError> {
        let placement = assign_start(&mut self.tasks, &self.capacity, &self.policy, task_id, start)?;
        Ok(Applied {
            value: placement,
            repairs: self.repair(),
        })
    }

    pub fn unschedule(&mut self, task_id: &str) -> Result<Applied<()>, ScheduleError> {
        unschedule(&mut self.tasks, task_id)?;
        Ok(Applied {
            value: (),
            repairs: self.repair(),
        })
    }

    /// Pointer-down on a task's trailing edge
    pub fn begin_resize(
        &mut self,
        task_id: &str,
        pointer_x: f64,
        column_width: f64,
    ) -> Result<(), ScheduleError> {
        let min_due = self.min_due_for(task_id, None)?;
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        self.resize.begin(task, min_due, pointer_x, column_width)
    }

    /// Pointer-move while resizing; returns the previewed span in days
    pub fn resize_to(&mut self, pointer_x: f64) -> Option<i64> {
        self.resize.pointer_move(pointer_x)
    }

    /// Pointer-up: commit the preview if there is one
    pub fn end_resize(&mut self) -> Result<Applied<Option<ResizeCommit>>, ScheduleError> {
        if !self.resize.is_active() {
            return Err(ScheduleError::NoActiveResize);
        }
        let commit = self.resize.release();
        if let Some(commit) = &commit {
            apply_resize(&mut self.tasks, commit)?;
        }
        Ok(Applied {
            value: commit,
            repairs: self.repair(),
        })
    }

    pub fn cancel_resize(&mut self) {
        self.resize.cancel();
    }

    /// Push drifted due dates forward
    pub fn repair(&mut self) -> Vec<RepairChange> {
        repair(&mut self.tasks, &self.capacity, &self.policy)
    }

    /// Report violations, capped searches and overloads without changing anything
    pub fn check(&self) -> FeasibilityReport {
        let mut report = FeasibilityReport::default();

        for task in in_claim_order(self.tasks.iter().filter(|t| t.is_active_on_calendar()), &self.policy) {
            let Some((start, due)) = task.date_range() else {
                continue;
            };
            let min_due = self.min_due_date(
                start,
                task.remaining_minutes(),
                &task.id,
                task.estimated_duration,
            );
            if min_due.is_capped() {
                report.capped.push(task.id.clone());
            }
            if due < min_due.date() {
                report.violations.push(DueDateViolation {
                    task_id: task.id.clone(),
                    due,
                    min_due: min_due.date(),
                });
            }
        }

        report.overloads = self.load_map().overload_periods(&self.capacity);
        report
    }
}
