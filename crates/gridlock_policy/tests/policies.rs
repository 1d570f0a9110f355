//! Tests for the admission policies against live registries.
//!
//! These tests verify:
//! - The ring-closing vehicle is denied under avoidance and prevention
//! - Safe sequences really complete when replayed
//! - Registries driven only through avoidance or prevention never deadlock

use gridlock_graph::WaitForGraph;
use gridlock_model::{Direction, Process, ProcessRegistry, Resource, ResourceVector, Route};
use gridlock_policy::{
    AdmissionPolicy, DenialReason, PolicyMode, SafetyRow, SafetyState, Verdict,
};

/// Spawns and admits a process under `mode`. Denied candidates are removed
/// again; a candidate whose first resource is busy is removed and reported
/// as permitted.
fn admit(registry: &mut ProcessRegistry, mode: PolicyMode, route: Route) -> Verdict {
    let id = registry.spawn(route, None);
    if !registry.is_free(route.first) {
        registry.remove(id).unwrap();
        return Verdict::Permit;
    }

    let candidate = registry.get(id).cloned().unwrap();
    let verdict = mode.policy().admit(&candidate, registry);
    match verdict {
        Verdict::Permit => registry.begin_waiting(id).unwrap(),
        Verdict::Deny(_) => {
            registry.remove(id).unwrap();
        }
    }
    verdict
}

// ─────────────────────────────────────────────────────────────────────────────
// Intersection Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn avoidance_denies_fourth_vehicle_without_state_change() {
    let mut registry = ProcessRegistry::new();
    for direction in [Direction::North, Direction::East, Direction::South] {
        assert!(admit(&mut registry, PolicyMode::Avoidance, direction.route()).is_permit());
    }
    let before = registry.clone();

    let candidate = Process::new(registry.peek_next_id(), Direction::West.route());
    let verdict = PolicyMode::Avoidance.policy().admit(&candidate, &registry);

    assert_eq!(verdict, Verdict::Deny(DenialReason::UnsafeAllocation));
    assert_eq!(registry, before);
}

#[test]
fn prevention_denies_west_route_on_empty_registry() {
    let registry = ProcessRegistry::new();
    let candidate = Process::new(registry.peek_next_id(), Direction::West.route());

    assert_eq!(
        PolicyMode::Prevention.policy().admit(&candidate, &registry),
        Verdict::Deny(DenialReason::OrderingViolation)
    );
}

#[test]
fn prevention_admits_the_other_three_directions() {
    let mut registry = ProcessRegistry::new();
    for direction in [Direction::North, Direction::East, Direction::South] {
        assert_eq!(
            admit(&mut registry, PolicyMode::Prevention, direction.route()),
            Verdict::Permit
        );
    }
    assert_eq!(
        admit(&mut registry, PolicyMode::Prevention, Direction::West.route()),
        Verdict::Deny(DenialReason::OrderingViolation)
    );
    assert_eq!(registry.len(), 3);
}

#[test]
fn avoidance_permits_advance_that_retires_first_demand() {
    // P1 holds North, wants East; P2 holds West, wants North.
    let mut registry = ProcessRegistry::new();
    let p1 = registry.spawn(Route::new(Resource::North, Resource::East), None);
    registry.begin_waiting(p1).unwrap();
    let p2 = registry.spawn(Route::new(Resource::West, Resource::North), None);
    registry.begin_waiting(p2).unwrap();

    // P1 moving onto East retires North from its demand, which frees the
    // way for P2: the advance is safe.
    let mover = registry.get(p1).cloned().unwrap();
    assert_eq!(
        PolicyMode::Avoidance.policy().advance(&mover, &registry),
        Verdict::Permit
    );
}

#[test]
fn detection_never_denies() {
    let mut registry = ProcessRegistry::new();
    for direction in Direction::ALL {
        assert!(admit(&mut registry, PolicyMode::Detection, direction.route()).is_permit());
    }
    assert!(WaitForGraph::build(&registry).has_cycle());
}

// ─────────────────────────────────────────────────────────────────────────────
// Property Tests
// ─────────────────────────────────────────────────────────────────────────────

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn resource() -> impl Strategy<Value = Resource> {
        prop::sample::select(Resource::ALL.to_vec())
    }

    fn well_formed_route() -> impl Strategy<Value = Route> {
        (resource(), resource())
            .prop_filter("distinct resources", |(a, b)| a != b)
            .prop_map(|(a, b)| Route::new(a, b))
    }

    #[derive(Debug, Clone)]
    enum Op {
        Admit(Route),
        Advance(usize),
        Complete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => well_formed_route().prop_map(Op::Admit),
            2 => (0usize..8).prop_map(Op::Advance),
            1 => (0usize..8).prop_map(Op::Complete),
        ]
    }

    fn drive(registry: &mut ProcessRegistry, mode: PolicyMode, op: &Op) {
        match *op {
            Op::Admit(route) => {
                admit(registry, mode, route);
            }
            Op::Advance(k) => {
                let waiting: Vec<_> = registry.iter().filter(|p| p.is_waiting()).cloned().collect();
                if waiting.is_empty() {
                    return;
                }
                let process = &waiting[k % waiting.len()];
                let Some(next) = process.requested() else {
                    return;
                };
                if registry.is_free(next)
                    && mode.policy().advance(process, registry).is_permit()
                {
                    registry.transfer(process.id()).unwrap();
                }
            }
            Op::Complete(k) => {
                let running: Vec<_> = registry
                    .iter()
                    .filter(|p| !p.is_waiting())
                    .map(Process::id)
                    .collect();
                if !running.is_empty() {
                    registry.remove(running[k % running.len()]).unwrap();
                }
            }
        }
    }

    fn row() -> impl Strategy<Value = (Resource, Resource, bool)> {
        (resource(), resource(), any::<bool>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn safe_sequence_replays_to_completion(rows in prop::collection::vec(row(), 0..6)) {
            let rows: Vec<SafetyRow> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (held, wants, holds))| SafetyRow {
                    process: gridlock_model::ProcessId::new(i as u64 + 1),
                    allocation: if holds { ResourceVector::unit(held) } else { ResourceVector::zero() },
                    max: ResourceVector::of([held, wants]),
                })
                .collect();
            let state = SafetyState::from_rows(rows.clone());

            if let Some(sequence) = state.safe_sequence() {
                prop_assert_eq!(sequence.len(), rows.len());
                let mut work = state.available();
                for id in sequence {
                    let row = rows.iter().find(|r| r.process == id).unwrap();
                    prop_assert!(row.need().fits_within(&work));
                    work += row.allocation;
                }
            }
        }

        #[test]
        fn avoidance_never_deadlocks(ops in prop::collection::vec(op(), 0..40)) {
            let mut registry = ProcessRegistry::new();
            for op in &ops {
                drive(&mut registry, PolicyMode::Avoidance, op);
                prop_assert!(!WaitForGraph::build(&registry).has_cycle());
                prop_assert!(SafetyState::capture(&registry).is_safe());
            }
        }

        #[test]
        fn prevention_never_deadlocks(ops in prop::collection::vec(op(), 0..40)) {
            let mut registry = ProcessRegistry::new();
            for op in &ops {
                drive(&mut registry, PolicyMode::Prevention, op);
                prop_assert!(!WaitForGraph::build(&registry).has_cycle());
            }
        }
    }
}
