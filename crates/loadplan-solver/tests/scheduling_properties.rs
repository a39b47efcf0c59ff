//! Integration tests for the scheduling engine's documented properties
//!
//! Covers the reference scenarios for the due date solver, the contention
//! asymmetry between short and long tasks, load conservation, weekend
//! handling and repair idempotence.

use loadplan_core::{CapacityConfig, DateKey, DayMode, LoadLevel, Task, WeekendConfig};
use loadplan_solver::{
    build_contention_map, distribute, min_due_date, repair, Planner, ShortestFirst,
};
use pretty_assertions::assert_eq;

fn key(s: &str) -> DateKey {
    DateKey::parse(s).unwrap()
}

fn seven_hours_no_weekend_restriction() -> CapacityConfig {
    CapacityConfig::new(7.0, WeekendConfig::working()).unwrap()
}

fn weekends_off() -> CapacityConfig {
    CapacityConfig::new(7.0, WeekendConfig::new(DayMode::Off, DayMode::Off)).unwrap()
}

// =============================================================================
// Reference Scenarios
// =============================================================================

#[test]
fn seven_hours_of_work_on_monday_finishes_monday() {
    let capacity = seven_hours_no_weekend_restriction();
    let tasks = vec![Task::new("only").estimate(420)];
    let due = min_due_date(&tasks, &capacity, &ShortestFirst, key("2024-01-01"), 420.0, "only", 420);
    assert_eq!(due.date().to_string(), "2024-01-01");
}

#[test]
fn fourteen_hours_of_work_finishes_tuesday() {
    let capacity = seven_hours_no_weekend_restriction();
    let tasks = vec![Task::new("only").estimate(840)];
    let due = min_due_date(&tasks, &capacity, &ShortestFirst, key("2024-01-01"), 840.0, "only", 840);
    assert_eq!(due.date().to_string(), "2024-01-02");
}

#[test]
fn small_task_contends_with_large_but_not_reverse() {
    let capacity = seven_hours_no_weekend_restriction();
    let tasks = vec![
        Task::new("A").estimate(60).scheduled(key("2024-01-01"), key("2024-01-05")),
        Task::new("B").estimate(600).scheduled(key("2024-01-01"), key("2024-01-05")),
    ];

    let for_b = build_contention_map(&tasks, &capacity, &ShortestFirst, "B", 600);
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].task_id, "A");
    assert_eq!(for_b[0].daily_load, 12.0);

    let for_a = build_contention_map(&tasks, &capacity, &ShortestFirst, "A", 60);
    assert!(for_a.is_empty());
}

#[test]
fn hundred_minute_task_is_not_contention_for_fifty() {
    let capacity = CapacityConfig::default();
    let tasks = vec![
        Task::new("A").estimate(100).scheduled(key("2024-01-01"), key("2024-01-03")),
        Task::new("B").estimate(50).scheduled(key("2024-01-01"), key("2024-01-03")),
    ];
    assert!(build_contention_map(&tasks, &capacity, &ShortestFirst, "B", 50).is_empty());
    let for_a = build_contention_map(&tasks, &capacity, &ShortestFirst, "A", 100);
    assert_eq!(for_a.iter().map(|e| e.task_id.as_str()).collect::<Vec<_>>(), vec!["B"]);
}

// =============================================================================
// Weekend Exclusion
// =============================================================================

#[test]
fn weekend_days_never_absorb_work() {
    let capacity = weekends_off();
    let friday = key("2024-01-05");

    // Two days of work from Friday: Saturday and Sunday are skipped
    let due = min_due_date(&[], &capacity, &ShortestFirst, friday, 840.0, "t", 840);
    assert_eq!(due.date(), key("2024-01-08"));

    // One day of work dropped on Saturday also lands on Monday
    let due = min_due_date(&[], &capacity, &ShortestFirst, key("2024-01-06"), 420.0, "t", 420);
    assert_eq!(due.date(), key("2024-01-08"));

    let tasks = vec![Task::new("t").estimate(1200).scheduled(friday, key("2024-01-09"))];
    let map = distribute(&tasks, &capacity, &ShortestFirst);
    assert_eq!(map.total(key("2024-01-06")), 0.0);
    assert_eq!(map.total(key("2024-01-07")), 0.0);
}

// =============================================================================
// Distribution
// =============================================================================

#[test]
fn single_day_load_is_conserved() {
    let capacity = CapacityConfig::default();
    for minutes in [1, 59, 420, 421, 5000] {
        let day = key("2024-01-03");
        let tasks = vec![Task::new("t").estimate(minutes).spent(30).scheduled(day, day)];
        let map = distribute(&tasks, &capacity, &ShortestFirst);
        let expected = tasks[0].remaining_minutes();
        assert_eq!(map.total(day), expected);
        assert_eq!(map.task_load(day, "t"), expected);
    }
}

#[test]
fn roomy_range_never_exceeds_day_capacity() {
    let capacity = CapacityConfig::new(6.0, WeekendConfig::new(DayMode::Half, DayMode::Off)).unwrap();
    let start = key("2024-02-01");
    let due = key("2024-02-14");
    let work = (capacity.range_capacity_hours(start, due) * 60.0) as i64 - 1;

    let tasks = vec![Task::new("t").estimate(work).scheduled(start, due)];
    let map = distribute(&tasks, &capacity, &ShortestFirst);

    for (day, entry) in map.iter() {
        assert!(
            entry.total <= capacity.day_capacity_minutes(day) + 1e-9,
            "{day} carries {} minutes",
            entry.total
        );
        assert_ne!(map.level(day, &capacity), LoadLevel::Overloaded);
    }
}

#[test]
fn overlapping_tasks_expose_overload() {
    let capacity = CapacityConfig::default();
    let tasks = vec![
        Task::new("a").estimate(600).scheduled(key("2024-01-01"), key("2024-01-02")),
        Task::new("b").estimate(700).scheduled(key("2024-01-01"), key("2024-01-02")),
    ];
    let map = distribute(&tasks, &capacity, &ShortestFirst);

    assert_eq!(map.total(key("2024-01-01")) + map.total(key("2024-01-02")), 1300.0);
    let periods = map.overload_periods(&capacity);
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].start, key("2024-01-01"));
    assert_eq!(periods[0].end, key("2024-01-02"));
    assert_eq!(periods[0].involved_tasks, vec!["a".to_string(), "b".to_string()]);
}

// =============================================================================
// Repair
// =============================================================================

#[test]
fn repair_twice_changes_nothing_the_second_time() {
    let capacity = CapacityConfig::default();
    let mut tasks = vec![
        Task::new("a").estimate(240).scheduled(key("2024-01-01"), key("2024-01-01")),
        Task::new("b").estimate(480).scheduled(key("2024-01-01"), key("2024-01-02")),
        Task::new("c").estimate(960).scheduled(key("2024-01-02"), key("2024-01-02")),
        Task::new("d").estimate(1800).scheduled(key("2024-01-04"), key("2024-01-05")),
        Task::new("backlog").estimate(30),
    ];

    let first = repair(&mut tasks, &capacity, &ShortestFirst);
    assert!(!first.is_empty());
    let after_first = tasks.clone();

    let second = repair(&mut tasks, &capacity, &ShortestFirst);
    assert!(second.is_empty());
    assert_eq!(tasks, after_first);
    assert!(!tasks[4].is_scheduled());
}

#[test]
fn repaired_planner_checks_clean_on_due_dates() {
    let mut planner = Planner::new(
        vec![
            Task::new("a").estimate(300).scheduled(key("2024-01-01"), key("2024-01-01")),
            Task::new("b").estimate(900).scheduled(key("2024-01-01"), key("2024-01-01")),
        ],
        CapacityConfig::default(),
    );
    assert!(!planner.check().violations.is_empty());

    planner.repair();
    let report = planner.check();
    assert!(report.violations.is_empty());
    assert!(report.capped.is_empty());
}
