//! End-to-end intersection scenarios.
//!
//! These tests verify:
//! - The four-way gridlock under each policy
//! - Deadlock flag bookkeeping and idempotent checks
//! - Safe-sequence resolution and Coffman reporting
//! - Replays after `reset()` are identical

use std::sync::Arc;

use gridlock_engine::hooks::{EngineEvent, EventKind};
use gridlock_engine::{Admission, Advance, Completion, Engine, EngineConfig};
use gridlock_graph::Label;
use gridlock_model::{Direction, ProcessId, ProcessState, Resource, Route};
use gridlock_policy::{DenialReason, PolicyMode};
use parking_lot::Mutex;

fn engine(policy: PolicyMode) -> Engine {
    Engine::new(EngineConfig::new().with_policy(policy))
}

fn admit_all(engine: &mut Engine, directions: &[Direction]) -> Vec<Admission> {
    directions
        .iter()
        .map(|&d| engine.create_process(d).expect("fresh process"))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario A: Detection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn four_way_gridlock_is_detected() {
    let mut engine = engine(PolicyMode::Detection);
    let outcomes = admit_all(&mut engine, &Direction::ALL);
    assert!(outcomes.iter().all(Admission::is_granted));

    let report = engine.check_deadlock();

    assert!(report.deadlocked);
    assert_eq!(report.processes.len(), 4);
    let cycle_processes = report
        .cycle
        .iter()
        .filter(|l| matches!(l, Label::Process(_)))
        .count();
    assert_eq!(cycle_processes, 5, "four processes plus the closing repeat");
    assert_eq!(
        report.cycle_trace(),
        "P1 → R_East → P2 → R_South → P3 → R_West → P4 → R_North → P1"
    );
}

#[test]
fn repeated_checks_count_one_deadlock() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(&mut engine, &Direction::ALL);

    let first = engine.check_deadlock();
    let second = engine.check_deadlock();

    assert_eq!(first, second);
    assert_eq!(engine.statistics().deadlocks_detected, 1);
    let detected = engine
        .events()
        .iter()
        .filter(|e| e.event.kind() == EventKind::DeadlockDetected)
        .count();
    assert_eq!(detected, 1);
}

#[test]
fn coffman_conditions_track_the_ring() {
    let mut engine = engine(PolicyMode::Detection);
    assert!(!engine.coffman_conditions().hold_and_wait);

    admit_all(&mut engine, &[Direction::North, Direction::East]);
    let partial = engine.coffman_conditions();
    assert!(partial.mutual_exclusion && partial.hold_and_wait && partial.no_preemption);
    assert!(!partial.circular_wait);

    admit_all(&mut engine, &[Direction::South, Direction::West]);
    assert!(engine.coffman_conditions().all_hold());
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario B: Partial ring
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn two_vehicles_do_not_deadlock() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(&mut engine, &[Direction::North, Direction::East]);

    let report = engine.check_deadlock();

    assert!(!report.deadlocked);
    assert!(report.cycle.is_empty());
    assert!(!engine.is_deadlocked());
}

#[test]
fn partial_ring_drains_in_order() {
    let mut engine = engine(PolicyMode::Detection);
    let ids: Vec<ProcessId> = admit_all(&mut engine, &[Direction::North, Direction::East])
        .iter()
        .filter_map(Admission::process)
        .collect();

    assert_eq!(engine.advance(ids[0]).unwrap(), Advance::StillWaiting);
    assert_eq!(engine.advance(ids[1]).unwrap(), Advance::Advanced);
    assert_eq!(engine.complete(ids[1]).unwrap(), Completion::Completed);
    assert_eq!(engine.advance(ids[0]).unwrap(), Advance::Advanced);
    assert_eq!(engine.complete(ids[0]).unwrap(), Completion::Completed);

    assert!(engine.registry().is_empty());
    assert_eq!(engine.statistics().completed, 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario C: Avoidance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn avoidance_denies_ring_closer_before_any_change() {
    let mut engine = engine(PolicyMode::Avoidance);
    admit_all(
        &mut engine,
        &[Direction::North, Direction::East, Direction::South],
    );
    let before = engine.graph_snapshot();

    let outcome = engine.create_process(Direction::West).unwrap();

    assert_eq!(outcome, Admission::Denied(DenialReason::UnsafeAllocation));
    assert_eq!(engine.graph_snapshot(), before);
    assert!(!engine.check_deadlock().deadlocked);
    assert_eq!(engine.statistics().denied_unsafe, 1);
    assert_eq!(engine.statistics().created, 4);
    assert_eq!(engine.statistics().admitted, 3);
}

#[test]
fn avoidance_admits_west_once_ring_opens() {
    let mut engine = engine(PolicyMode::Avoidance);
    let ids: Vec<ProcessId> = admit_all(
        &mut engine,
        &[Direction::North, Direction::East, Direction::South],
    )
    .iter()
    .filter_map(Admission::process)
    .collect();

    assert_eq!(engine.advance(ids[2]).unwrap(), Advance::Advanced);
    assert_eq!(engine.complete(ids[2]).unwrap(), Completion::Completed);

    assert!(engine.create_process(Direction::West).unwrap().is_granted());
    assert!(!engine.check_deadlock().deadlocked);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario D: Prevention
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn prevention_denies_west_on_empty_intersection() {
    let mut engine = engine(PolicyMode::Prevention);

    let outcome = engine.create_process(Direction::West).unwrap();

    assert_eq!(outcome, Admission::Denied(DenialReason::OrderingViolation));
    assert!(engine.registry().is_empty());
}

#[test]
fn prevention_denies_west_among_other_traffic() {
    let mut engine = engine(PolicyMode::Prevention);
    let outcomes = admit_all(&mut engine, &Direction::ALL);

    assert!(outcomes[..3].iter().all(Admission::is_granted));
    assert_eq!(
        outcomes[3],
        Admission::Denied(DenialReason::OrderingViolation)
    );
    assert!(!engine.check_deadlock().deadlocked);
    assert_eq!(engine.statistics().denied_ordering, 1);
}

#[test]
fn switching_policy_affects_only_future_admissions() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(&mut engine, &[Direction::West]);

    engine.set_policy(PolicyMode::Prevention);

    assert_eq!(engine.registry().len(), 1);
    assert_eq!(
        engine.create_process(Direction::West).unwrap(),
        Admission::Pending(ProcessId::new(2)),
        "the first West vehicle still holds R_West"
    );
}

#[test]
fn avoidance_switch_does_not_strand_bystanders() {
    let mut engine = engine(PolicyMode::Detection);
    for route in [
        Route::new(Resource::North, Resource::East),
        Route::new(Resource::East, Resource::North),
        Route::new(Resource::South, Resource::West),
    ] {
        assert!(engine.create_process_with_route(route, None).unwrap().is_granted());
    }
    assert!(engine.check_deadlock().deadlocked);

    engine.set_policy(PolicyMode::Avoidance);

    assert_eq!(engine.advance(ProcessId::new(3)).unwrap(), Advance::Advanced);
    assert_eq!(engine.complete(ProcessId::new(3)).unwrap(), Completion::Completed);
    assert_eq!(engine.statistics().denied_unsafe, 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn resolve_safely_retires_in_safe_order() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(
        &mut engine,
        &[Direction::North, Direction::East, Direction::South],
    );

    let resolution = engine.resolve_safely().unwrap();

    assert!(resolution.safe);
    assert_eq!(
        resolution.completed,
        vec![ProcessId::new(3), ProcessId::new(2), ProcessId::new(1)]
    );
    assert!(engine.registry().is_empty());
    assert_eq!(engine.statistics().completed, 3);
    assert_eq!(
        engine.complete(ProcessId::new(1)).unwrap(),
        Completion::AlreadyCompleted
    );
}

#[test]
fn resolve_safely_leaves_deadlock_untouched() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(&mut engine, &Direction::ALL);
    let before = engine.graph_snapshot();

    let resolution = engine.resolve_safely().unwrap();

    assert!(!resolution.safe);
    assert!(resolution.sequence.is_empty());
    assert!(resolution.completed.is_empty());
    assert_eq!(engine.graph_snapshot(), before);
    assert!(engine.is_deadlocked());
}

#[test]
fn safety_analysis_reports_matrices() {
    let mut engine = engine(PolicyMode::Detection);
    admit_all(&mut engine, &[Direction::North, Direction::South]);

    let analysis = engine.run_safety_analysis();

    assert!(analysis.safe);
    assert_eq!(analysis.matrices.processes.len(), 2);
    assert_eq!(analysis.matrices.available.get(Resource::East), 1);
    assert_eq!(analysis.matrices.available.get(Resource::North), 0);
    assert_eq!(analysis.matrices.need[0].get(Resource::East), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Observers and Reset
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn observers_see_lifecycle_in_order() {
    let mut engine = engine(PolicyMode::Detection);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine
        .hooks()
        .register_observer("recorder", EventKind::ALL, move |event: &EngineEvent| {
            sink.lock().push(event.kind());
        })
        .unwrap();

    let id = engine
        .create_process(Direction::North)
        .unwrap()
        .process()
        .unwrap();
    engine.advance(id).unwrap();
    engine.complete(id).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            EventKind::ProcessCreated,
            EventKind::ResourceGranted,
            EventKind::ProcessAdvanced,
            EventKind::ProcessCompleted,
        ]
    );
}

#[test]
fn aborting_a_ring_member_unblocks_its_waiter() {
    let mut engine = engine(PolicyMode::Detection);
    let ids: Vec<ProcessId> = admit_all(&mut engine, &Direction::ALL)
        .iter()
        .filter_map(Admission::process)
        .collect();
    assert!(engine.is_deadlocked());

    engine.abort(ids[3]).unwrap();
    assert!(!engine.is_deadlocked());
    assert_eq!(engine.advance(ids[2]).unwrap(), Advance::Advanced);
    assert_eq!(
        engine.process(ids[2]).unwrap().state(),
        ProcessState::Running
    );
    assert_eq!(
        engine.events().latest().unwrap().event,
        EngineEvent::ProcessAdvanced {
            process: ids[2],
            released: Resource::South,
            acquired: Resource::West,
        }
    );
}

#[test]
fn reset_replays_identically() {
    fn script(engine: &mut Engine) -> Vec<Admission> {
        let mut outcomes = admit_all(engine, &Direction::ALL);
        outcomes.extend(admit_all(engine, &[Direction::North]));
        engine.check_deadlock();
        outcomes
    }

    let mut engine = engine(PolicyMode::Detection);
    let first = script(&mut engine);
    let first_snapshot = engine.graph_snapshot();
    let first_stats = engine.statistics();

    engine.reset();
    assert!(engine.registry().is_empty());
    assert!(!engine.is_deadlocked());
    assert_eq!(engine.statistics().created, 0);

    let second = script(&mut engine);
    assert_eq!(first, second);
    assert_eq!(engine.graph_snapshot(), first_snapshot);
    assert_eq!(engine.statistics(), first_stats);
}
