//! The admission controller.
//!
//! [`Engine`] owns the process registry and is the only way to mutate it.
//! Every mutating operation consults the active policy first, commits only
//! on a permit, and refreshes the deadlock flag afterwards.

use core::mem;

use gridlock_graph::{GraphSnapshot, Label, WaitForGraph};
use gridlock_model::{
    Direction, Process, ProcessId, ProcessRegistry, ProcessState, RegistryError, Route,
};
use gridlock_policy::{DenialReason, PolicyMode, SafetyAnalysis, SafetyState, Verdict};
use hashbrown::HashSet;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hooks::{DenialStage, EngineEvent, EngineHooks, EventLog};
use crate::outcome::{Admission, Advance, Completion};
use crate::report::{CoffmanConditions, DeadlockReport, Resolution};
use crate::stats::Statistics;

/// The single owner of all simulation state.
///
/// # Example
///
/// ```
/// use gridlock_engine::{Admission, Advance, Completion, Engine};
/// use gridlock_model::Direction;
///
/// let mut engine = Engine::default();
/// let Admission::Granted(id) = engine.create_process(Direction::North).unwrap() else {
///     unreachable!("intersection is empty");
/// };
///
/// assert_eq!(engine.advance(id).unwrap(), Advance::Advanced);
/// assert_eq!(engine.complete(id).unwrap(), Completion::Completed);
/// assert_eq!(engine.complete(id).unwrap(), Completion::AlreadyCompleted);
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: ProcessRegistry,
    policy: PolicyMode,
    deadlocked: bool,
    stats: Statistics,
    /// IDs of processes that completed, for idempotent `complete`.
    ///
    /// Holds at most one entry per ID the registry has issued and is
    /// emptied by `reset`, which also restarts IDs at `P1`.
    completed: HashSet<ProcessId>,
    hooks: EngineHooks,
    log: EventLog,
    clock: Clock,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: ProcessRegistry::new(),
            policy: config.policy,
            deadlocked: false,
            stats: Statistics::default(),
            completed: HashSet::new(),
            hooks: EngineHooks::new(),
            log: EventLog::with_capacity(config.event_log_capacity),
            clock: config.build_clock(),
            config,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers an `Approaching` process on `route` without granting
    /// anything.
    ///
    /// Returns [`Admission::Pending`] with the new ID, or
    /// [`Admission::Denied`] with [`DenialReason::InvalidRoute`] when both
    /// route resources are the same.
    pub fn spawn(&mut self, route: Route, direction: Option<Direction>) -> Admission {
        if !route.is_well_formed() {
            self.deny(None, DenialReason::InvalidRoute, DenialStage::Create);
            return Admission::Denied(DenialReason::InvalidRoute);
        }

        let id = self.registry.spawn(route, direction);
        self.stats.created += 1;
        tracing::info!(process = %id, route = %route, "process created");
        self.emit(EngineEvent::ProcessCreated {
            process: id,
            route,
            direction,
        });
        Admission::Pending(id)
    }

    /// Grants an `Approaching` process its first resource.
    ///
    /// - The first resource is busy: the process stays `Approaching` and
    ///   [`Admission::Pending`] is returned.
    /// - The policy denies: the process is discarded.
    /// - Otherwise the process becomes `Waiting`, holding its first resource
    ///   and requesting its second.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] / [`EngineError::AlreadyCompleted`] for
    ///   stale IDs
    /// - [`EngineError::InvalidTransition`] unless the process is `Approaching`
    pub fn grant_first(&mut self, id: ProcessId) -> Result<Admission, EngineError> {
        let candidate = self.expect_state(id, ProcessState::Approaching, "grant")?;
        let route = candidate.route();

        if let Some(holder) = self.registry.owner(route.first) {
            tracing::debug!(process = %id, resource = %route.first, holder = %holder, "first resource busy");
            self.emit(EngineEvent::AdmissionPending {
                process: id,
                resource: route.first,
                holder,
            });
            return Ok(Admission::Pending(id));
        }

        let verdict = self.policy.policy().admit(&candidate, &self.registry);
        tracing::debug!(process = %id, policy = %self.policy, ?verdict, "admission verdict");
        if let Verdict::Deny(reason) = verdict {
            self.registry.remove(id)?;
            self.deny(Some(id), reason, DenialStage::Admission);
            return Ok(Admission::Denied(reason));
        }

        self.registry.begin_waiting(id)?;
        self.stats.admitted += 1;
        tracing::info!(
            process = %id,
            allocated = %route.first,
            requesting = %route.second,
            "resource granted"
        );
        self.emit(EngineEvent::ResourceGranted {
            process: id,
            resource: route.first,
            requested: route.second,
        });
        self.refresh_deadlock();
        Ok(Admission::Granted(id))
    }

    /// Creates a process for `direction` and immediately asks for its first
    /// resource.
    ///
    /// # Errors
    ///
    /// See [`Engine::grant_first`].
    pub fn create_process(&mut self, direction: Direction) -> Result<Admission, EngineError> {
        self.create_process_with_route(direction.route(), Some(direction))
    }

    /// Creates a process on a custom route and immediately asks for its
    /// first resource.
    ///
    /// # Errors
    ///
    /// See [`Engine::grant_first`].
    pub fn create_process_with_route(
        &mut self,
        route: Route,
        direction: Option<Direction>,
    ) -> Result<Admission, EngineError> {
        match self.spawn(route, direction) {
            Admission::Pending(id) => self.grant_first(id),
            other => Ok(other),
        }
    }

    /// Moves a `Waiting` process onto its requested resource.
    ///
    /// Returns [`Advance::StillWaiting`] without touching state if the
    /// resource is held, and [`Advance::Denied`] if the policy refuses; the
    /// process then stays `Waiting`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] / [`EngineError::AlreadyCompleted`] for
    ///   stale IDs
    /// - [`EngineError::InvalidTransition`] unless the process is `Waiting`
    pub fn advance(&mut self, id: ProcessId) -> Result<Advance, EngineError> {
        let process = self.expect_state(id, ProcessState::Waiting, "advance")?;
        let (Some(held), Some(next)) = (process.held(), process.requested()) else {
            return Err(RegistryError::NothingRequested(id).into());
        };

        if !self.registry.is_free(next) {
            tracing::debug!(process = %id, resource = %next, "still waiting");
            return Ok(Advance::StillWaiting);
        }

        let verdict = self.policy.policy().advance(&process, &self.registry);
        tracing::debug!(process = %id, policy = %self.policy, ?verdict, "advance verdict");
        if let Verdict::Deny(reason) = verdict {
            self.deny(Some(id), reason, DenialStage::Advance);
            return Ok(Advance::Denied(reason));
        }

        self.registry.transfer(id)?;
        tracing::info!(process = %id, released = %held, acquired = %next, "process advanced");
        self.emit(EngineEvent::ProcessAdvanced {
            process: id,
            released: held,
            acquired: next,
        });
        self.refresh_deadlock();
        Ok(Advance::Advanced)
    }

    /// Completes a `Running` process: releases its resource and removes it.
    ///
    /// Completing an already completed process is a no-op.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotFound`] for unknown, denied or aborted IDs
    /// - [`EngineError::InvalidTransition`] unless the process is `Running`
    pub fn complete(&mut self, id: ProcessId) -> Result<Completion, EngineError> {
        if self.completed.contains(&id) {
            tracing::debug!(process = %id, "already completed");
            return Ok(Completion::AlreadyCompleted);
        }
        self.expect_state(id, ProcessState::Running, "complete")?;

        self.retire(id)?;
        self.refresh_deadlock();
        Ok(Completion::Completed)
    }

    /// Removes a live process at any stage, releasing what it holds.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] / [`EngineError::AlreadyCompleted`] for
    /// stale IDs.
    pub fn abort(&mut self, id: ProcessId) -> Result<Process, EngineError> {
        let released = self.lookup(id)?.held();
        let process = self.registry.remove(id)?;

        self.stats.aborted += 1;
        tracing::info!(process = %id, state = %process.state(), "process aborted");
        self.emit(EngineEvent::ProcessAborted {
            process: id,
            released,
        });
        self.refresh_deadlock();
        Ok(process)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Policy
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the active policy.
    #[must_use]
    pub fn policy(&self) -> PolicyMode {
        self.policy
    }

    /// Switches the policy. Only future decisions are affected.
    pub fn set_policy(&mut self, mode: PolicyMode) {
        if mode == self.policy {
            return;
        }
        let from = mem::replace(&mut self.policy, mode);
        tracing::info!(from = %from, to = %mode, "policy changed");
        self.emit(EngineEvent::PolicyChanged { from, to: mode });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Analysis
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs cycle detection and updates the deadlock flag.
    ///
    /// The detected-deadlock counter only moves when the flag goes from
    /// clear to set, so checking an existing deadlock again is harmless.
    pub fn check_deadlock(&mut self) -> DeadlockReport {
        let graph = WaitForGraph::build(&self.registry);
        let report = if graph.has_cycle() {
            DeadlockReport {
                deadlocked: true,
                cycle: graph.find_cycle(),
                processes: graph.deadlocked_processes(),
            }
        } else {
            DeadlockReport::default()
        };

        match (self.deadlocked, report.deadlocked) {
            (false, true) => {
                self.deadlocked = true;
                self.stats.deadlocks_detected += 1;
                tracing::warn!(cycle = %report.cycle_trace(), "deadlock detected");
                self.emit(EngineEvent::DeadlockDetected {
                    processes: report.processes.clone(),
                    cycle: report.cycle.clone(),
                });
            }
            (true, false) => {
                self.deadlocked = false;
                tracing::info!("deadlock cleared");
                self.emit(EngineEvent::DeadlockCleared);
            }
            _ => {}
        }
        report
    }

    /// Returns the deadlock flag as of the last check.
    #[must_use]
    pub fn is_deadlocked(&self) -> bool {
        self.deadlocked
    }

    /// Returns true if the wait-for graph currently has a cycle. Does not
    /// touch the deadlock flag.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        WaitForGraph::build(&self.registry).has_cycle()
    }

    /// Returns one current cycle as alternating labels, or an empty vector.
    #[must_use]
    pub fn find_cycle(&self) -> Vec<Label> {
        WaitForGraph::build(&self.registry).find_cycle()
    }

    /// Runs the Banker's safety check over the current state.
    #[must_use]
    pub fn run_safety_analysis(&self) -> SafetyAnalysis {
        SafetyState::capture(&self.registry).evaluate()
    }

    /// Retires every contending process in safe-sequence order.
    ///
    /// When the state is unsafe nothing changes and the partial sequence is
    /// reported. Approaching processes are left alone.
    ///
    /// # Errors
    ///
    /// Propagates registry errors, which indicate an internal inconsistency.
    pub fn resolve_safely(&mut self) -> Result<Resolution, EngineError> {
        let analysis = self.run_safety_analysis();
        if !analysis.safe {
            tracing::warn!(
                finished = analysis.sequence.len(),
                total = analysis.matrices.processes.len(),
                "no safe sequence exists"
            );
            return Ok(Resolution {
                safe: false,
                sequence: analysis.sequence,
                completed: Vec::new(),
            });
        }

        let mut completed = Vec::with_capacity(analysis.sequence.len());
        for &id in &analysis.sequence {
            self.retire(id)?;
            completed.push(id);
            self.refresh_deadlock();
        }
        tracing::info!(count = completed.len(), "safe sequence executed");
        Ok(Resolution {
            safe: true,
            sequence: analysis.sequence,
            completed,
        })
    }

    /// Reports which Coffman conditions hold right now.
    #[must_use]
    pub fn coffman_conditions(&self) -> CoffmanConditions {
        let contended = self.registry.in_state(ProcessState::Waiting).next().is_some();
        CoffmanConditions {
            mutual_exclusion: contended,
            hold_and_wait: contended,
            no_preemption: contended,
            circular_wait: self.has_cycle(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Captures the allocation graph for rendering.
    #[must_use]
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.registry)
    }

    /// Returns the counters, with `active` filled in.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics {
            active: self.registry.len(),
            ..self.stats
        }
    }

    /// Returns the process registry.
    #[must_use]
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Gets a live process by ID.
    #[must_use]
    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.registry.get(id)
    }

    /// Returns the IDs of processes still waiting for their first resource.
    #[must_use]
    pub fn pending(&self) -> Vec<ProcessId> {
        self.registry
            .in_state(ProcessState::Approaching)
            .map(Process::id)
            .collect()
    }

    /// Returns the observer registry.
    #[must_use]
    pub fn hooks(&self) -> &EngineHooks {
        &self.hooks
    }

    /// Returns the event log.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Returns the configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clears processes, counters, the deadlock flag and the event log.
    /// Process IDs restart at `P1`; observers stay registered.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.stats = Statistics::default();
        self.deadlocked = false;
        self.completed.clear();
        self.log.clear();
        if self.config.reset_policy {
            self.policy = self.config.policy;
        }
        tracing::info!(policy = %self.policy, "simulation reset");
        self.emit(EngineEvent::Reset);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn lookup(&self, id: ProcessId) -> Result<&Process, EngineError> {
        if let Some(process) = self.registry.get(id) {
            return Ok(process);
        }
        if self.completed.contains(&id) {
            Err(EngineError::AlreadyCompleted(id))
        } else {
            Err(EngineError::NotFound(id))
        }
    }

    fn expect_state(
        &self,
        id: ProcessId,
        expected: ProcessState,
        operation: &'static str,
    ) -> Result<Process, EngineError> {
        let process = self.lookup(id)?;
        if process.state() != expected {
            return Err(EngineError::InvalidTransition {
                process: id,
                state: process.state(),
                operation,
            });
        }
        Ok(process.clone())
    }

    fn retire(&mut self, id: ProcessId) -> Result<(), EngineError> {
        self.registry.remove(id)?;
        self.completed.insert(id);
        self.stats.completed += 1;
        tracing::info!(process = %id, "process completed");
        self.emit(EngineEvent::ProcessCompleted { process: id });
        Ok(())
    }

    fn deny(&mut self, process: Option<ProcessId>, reason: DenialReason, stage: DenialStage) {
        self.stats.record_denial(reason);
        tracing::warn!(?process, %reason, ?stage, "request denied");
        self.emit(EngineEvent::RequestDenied {
            process,
            reason,
            stage,
        });
    }

    fn refresh_deadlock(&mut self) {
        self.check_deadlock();
    }

    fn emit(&mut self, event: EngineEvent) {
        let at = self.clock.since_epoch();
        self.hooks.invoke(&event);
        self.log.push(at, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::hooks::{EventKind, Severity};
    use core::time::Duration;
    use gridlock_model::Resource;
    use std::sync::Arc;
    use std::time::Instant;

    fn granted(engine: &mut Engine, direction: Direction) -> ProcessId {
        match engine.create_process(direction).unwrap() {
            Admission::Granted(id) => id,
            other => panic!("expected grant, got {other:?}"),
        }
    }

    #[test]
    fn invalid_route_is_denied_before_creation() {
        let mut engine = Engine::default();

        let outcome = engine
            .create_process_with_route(Route::new(Resource::East, Resource::East), None)
            .unwrap();

        assert_eq!(outcome, Admission::Denied(DenialReason::InvalidRoute));
        assert!(engine.registry().is_empty());
        assert_eq!(engine.statistics().created, 0);
        assert_eq!(engine.statistics().denied_invalid_route, 1);
    }

    #[test]
    fn busy_first_resource_leaves_process_pending() {
        let mut engine = Engine::default();
        let first = granted(&mut engine, Direction::North);

        let outcome = engine.create_process(Direction::North).unwrap();
        let Admission::Pending(second) = outcome else {
            panic!("expected pending, got {outcome:?}");
        };
        assert_eq!(engine.pending(), vec![second]);

        engine.advance(first).unwrap();
        assert_eq!(engine.grant_first(second).unwrap(), Admission::Granted(second));
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn advance_into_held_resource_is_still_waiting() {
        let mut engine = Engine::default();
        let north = granted(&mut engine, Direction::North);
        granted(&mut engine, Direction::East);

        assert_eq!(engine.advance(north).unwrap(), Advance::StillWaiting);
        assert_eq!(
            engine.process(north).unwrap().state(),
            ProcessState::Waiting
        );
    }

    #[test]
    fn complete_requires_running() {
        let mut engine = Engine::default();
        let id = granted(&mut engine, Direction::South);

        assert_eq!(
            engine.complete(id),
            Err(EngineError::InvalidTransition {
                process: id,
                state: ProcessState::Waiting,
                operation: "complete",
            })
        );
    }

    #[test]
    fn stale_ids_are_reported() {
        let mut engine = Engine::default();
        let id = granted(&mut engine, Direction::West);
        engine.advance(id).unwrap();
        engine.complete(id).unwrap();

        assert_eq!(engine.advance(id), Err(EngineError::AlreadyCompleted(id)));
        assert_eq!(
            engine.advance(ProcessId::new(99)),
            Err(EngineError::NotFound(ProcessId::new(99)))
        );
    }

    #[test]
    fn reset_forgets_completed_ids() {
        let mut engine = Engine::default();
        let id = granted(&mut engine, Direction::West);
        engine.advance(id).unwrap();
        engine.complete(id).unwrap();
        assert_eq!(engine.complete(id), Ok(Completion::AlreadyCompleted));

        engine.reset();

        assert_eq!(engine.complete(id), Err(EngineError::NotFound(id)));
        let reused = granted(&mut engine, Direction::West);
        assert_eq!(reused, id);
        engine.advance(reused).unwrap();
        assert_eq!(engine.complete(reused), Ok(Completion::Completed));
    }

    #[test]
    fn abort_releases_and_clears_deadlock() {
        let mut engine = Engine::default();
        let ids: Vec<_> = Direction::ALL
            .into_iter()
            .map(|d| granted(&mut engine, d))
            .collect();
        assert!(engine.is_deadlocked());

        let aborted = engine.abort(ids[0]).unwrap();

        assert_eq!(aborted.id(), ids[0]);
        assert!(!engine.is_deadlocked());
        assert!(engine.registry().is_free(Resource::North));
        assert_eq!(engine.statistics().aborted, 1);
        assert_eq!(engine.abort(ids[0]).unwrap_err(), EngineError::NotFound(ids[0]));
    }

    #[test]
    fn set_policy_emits_only_on_change() {
        let mut engine = Engine::default();
        engine.set_policy(PolicyMode::Detection);
        assert!(engine.events().is_empty());

        engine.set_policy(PolicyMode::Prevention);
        assert_eq!(
            engine.events().latest().unwrap().event,
            EngineEvent::PolicyChanged {
                from: PolicyMode::Detection,
                to: PolicyMode::Prevention,
            }
        );
    }

    #[test]
    fn log_entries_use_injected_clock() {
        let mock = Arc::new(MockClock::new(Instant::now()));
        let mut engine = Engine::new(EngineConfig::new().with_clock(mock.clone()));

        mock.advance(Duration::from_millis(500));
        granted(&mut engine, Direction::North);

        let entries: Vec<_> = engine.events().iter().collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.at == Duration::from_millis(500)));
        assert_eq!(entries[1].severity, Severity::Info);
    }

    #[test]
    fn observers_survive_reset() {
        let mut engine = Engine::default();
        engine
            .hooks()
            .register_observer("noop", [EventKind::Reset], |_: &EngineEvent| {})
            .unwrap();

        engine.reset();

        assert_eq!(engine.hooks().hook_count(EventKind::Reset), 1);
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn reset_can_restore_initial_policy() {
        let config = EngineConfig::new()
            .with_policy(PolicyMode::Avoidance)
            .with_reset_policy(true);
        let mut engine = Engine::new(config);
        engine.set_policy(PolicyMode::Detection);

        engine.reset();

        assert_eq!(engine.policy(), PolicyMode::Avoidance);
    }
}
