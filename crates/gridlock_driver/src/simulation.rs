//! Paced vehicle runs over a shared engine.
//!
//! A [`Simulation`] plays each vehicle through create, grant, advance and
//! complete, sleeping between steps and retrying whatever the engine reports
//! as pending or still waiting. Every step takes the engine lock briefly and
//! releases it before the next `await`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use gridlock_engine::{
    Admission, Advance, CoffmanConditions, DeadlockReport, Engine, EngineError, Statistics,
};
use gridlock_model::{Direction, ProcessId, Route};
use gridlock_policy::{DenialReason, PolicyMode};
use parking_lot::Mutex;
use serde::Serialize;

/// An engine shared between concurrently running vehicles.
pub type SharedEngine = Arc<Mutex<Engine>>;

enum Step {
    Done,
    Blocked,
    Deadlocked,
}

// ─────────────────────────────────────────────────────────────────────────────
// SimulationConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Pacing for simulated vehicles.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gridlock_driver::SimulationConfig;
///
/// let config = SimulationConfig::new()
///     .with_transit_delay(Duration::from_millis(200))
///     .with_max_retries(10);
/// assert_eq!(config.max_retries, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Delay between consecutive vehicle arrivals in [`Simulation::run_all`].
    pub arrival_interval: Duration,
    /// Delay between acquiring the first resource and requesting the second.
    pub settle_delay: Duration,
    /// Time spent holding the second resource before completing.
    pub transit_delay: Duration,
    /// Delay before retrying a pending grant or a blocked advance.
    pub retry_interval: Duration,
    /// Retries per step before the vehicle gives up and is aborted.
    pub max_retries: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            arrival_interval: Duration::ZERO,
            settle_delay: Duration::from_millis(500),
            transit_delay: Duration::from_secs(1),
            retry_interval: Duration::from_millis(250),
            max_retries: 40,
        }
    }
}

impl SimulationConfig {
    /// Creates the default pacing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between arrivals.
    #[must_use]
    pub fn with_arrival_interval(mut self, interval: Duration) -> Self {
        self.arrival_interval = interval;
        self
    }

    /// Sets the delay before requesting the second resource.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the time spent crossing before completion.
    #[must_use]
    pub fn with_transit_delay(mut self, delay: Duration) -> Self {
        self.transit_delay = delay;
        self
    }

    /// Sets the retry interval.
    #[must_use]
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Sets the retry limit per step.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// How a single vehicle run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VehicleOutcome {
    /// The vehicle crossed and released everything.
    Completed {
        /// The vehicle's process.
        process: ProcessId,
    },
    /// The policy rejected the vehicle. `process` is `None` when the route
    /// itself was invalid.
    Denied {
        /// The discarded process, if one was created.
        process: Option<ProcessId>,
        /// Why the vehicle was rejected.
        reason: DenialReason,
    },
    /// The vehicle is part of a circular wait and was left in place.
    Deadlocked {
        /// The vehicle's process.
        process: ProcessId,
    },
    /// The retry budget ran out; the vehicle was aborted.
    GaveUp {
        /// The aborted process.
        process: ProcessId,
    },
}

impl VehicleOutcome {
    /// Returns true for [`VehicleOutcome::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, VehicleOutcome::Completed { .. })
    }
}

/// One vehicle's route and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VehicleRun {
    /// Approach direction, if the route came from one.
    pub direction: Option<Direction>,
    /// The route driven.
    pub route: Route,
    /// How the run ended.
    pub outcome: VehicleOutcome,
}

/// Final state of a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Policy active when the report was taken.
    pub policy: PolicyMode,
    /// Runs in arrival order.
    pub runs: Vec<VehicleRun>,
    /// Deadlock check at report time.
    pub deadlock: DeadlockReport,
    /// Coffman conditions at report time.
    pub coffman: CoffmanConditions,
    /// Engine counters.
    pub statistics: Statistics,
}

// ─────────────────────────────────────────────────────────────────────────────
// Simulation
// ─────────────────────────────────────────────────────────────────────────────

/// Drives vehicles through a shared [`Engine`].
///
/// # Example
///
/// ```
/// use gridlock_driver::{Simulation, SimulationConfig};
/// use gridlock_engine::{Engine, EngineConfig};
/// use gridlock_model::Direction;
/// use gridlock_policy::PolicyMode;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
/// let engine = Engine::new(EngineConfig::new().with_policy(PolicyMode::Prevention));
/// let simulation = Simulation::new(engine, SimulationConfig::default());
///
/// let report = simulation.run_all(&Direction::ALL).await.unwrap();
/// assert!(!report.deadlock.deadlocked);
/// assert_eq!(report.statistics.completed, 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    engine: SharedEngine,
    config: SimulationConfig,
}

impl Simulation {
    /// Wraps `engine` for shared use.
    #[must_use]
    pub fn new(engine: Engine, config: SimulationConfig) -> Self {
        Self::with_shared(Arc::new(Mutex::new(engine)), config)
    }

    /// Drives an engine that is already shared.
    #[must_use]
    pub fn with_shared(engine: SharedEngine, config: SimulationConfig) -> Self {
        Self { engine, config }
    }

    /// Returns the shared engine.
    #[must_use]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Returns the pacing.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.engine.lock())
    }

    /// Runs one vehicle approaching from `direction` to completion or
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if another driver retired the vehicle's
    /// process underneath it.
    pub async fn run_vehicle(&self, direction: Direction) -> Result<VehicleRun, EngineError> {
        self.run_route(direction.route(), Some(direction)).await
    }

    /// Runs one vehicle on a custom route.
    ///
    /// # Errors
    ///
    /// See [`Simulation::run_vehicle`].
    pub async fn run_route(
        &self,
        route: Route,
        direction: Option<Direction>,
    ) -> Result<VehicleRun, EngineError> {
        let outcome = self.drive(route, direction).await?;
        tracing::info!(route = %route, ?outcome, "vehicle finished");
        Ok(VehicleRun {
            direction,
            route,
            outcome,
        })
    }

    async fn drive(
        &self,
        route: Route,
        direction: Option<Direction>,
    ) -> Result<VehicleOutcome, EngineError> {
        let id = match self.with_engine(|engine| engine.spawn(route, direction)) {
            Admission::Pending(id) | Admission::Granted(id) => id,
            Admission::Denied(reason) => {
                return Ok(VehicleOutcome::Denied {
                    process: None,
                    reason,
                });
            }
        };

        if let Some(outcome) = self.acquire_first(id).await? {
            return Ok(outcome);
        }
        tokio::time::sleep(self.config.settle_delay).await;

        if let Some(outcome) = self.acquire_second(id).await? {
            return Ok(outcome);
        }
        tokio::time::sleep(self.config.transit_delay).await;

        self.with_engine(|engine| engine.complete(id))?;
        Ok(VehicleOutcome::Completed { process: id })
    }

    /// Retries `grant_first` until granted. Returns an outcome only if the
    /// run ends here.
    async fn acquire_first(&self, id: ProcessId) -> Result<Option<VehicleOutcome>, EngineError> {
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_interval).await;
            }
            match self.with_engine(|engine| engine.grant_first(id))? {
                Admission::Granted(_) => return Ok(None),
                Admission::Pending(_) => {
                    tracing::debug!(process = %id, attempt, "first resource busy, retrying");
                }
                Admission::Denied(reason) => {
                    return Ok(Some(VehicleOutcome::Denied {
                        process: Some(id),
                        reason,
                    }));
                }
            }
        }
        self.give_up(id).map(Some)
    }

    /// Retries `advance` until the vehicle holds its second resource.
    /// A vehicle found on a wait-for cycle stops retrying.
    async fn acquire_second(&self, id: ProcessId) -> Result<Option<VehicleOutcome>, EngineError> {
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_interval).await;
            }
            let step = self.with_engine(|engine| -> Result<Step, EngineError> {
                match engine.advance(id)? {
                    Advance::Advanced => Ok(Step::Done),
                    Advance::StillWaiting | Advance::Denied(_)
                        if engine.check_deadlock().processes.contains(&id) =>
                    {
                        Ok(Step::Deadlocked)
                    }
                    Advance::StillWaiting | Advance::Denied(_) => Ok(Step::Blocked),
                }
            })?;

            match step {
                Step::Done => return Ok(None),
                Step::Deadlocked => {
                    tracing::warn!(process = %id, "vehicle is deadlocked");
                    return Ok(Some(VehicleOutcome::Deadlocked { process: id }));
                }
                Step::Blocked => {}
            }
            tracing::debug!(process = %id, attempt, "second resource unavailable, retrying");
        }
        self.give_up(id).map(Some)
    }

    fn give_up(&self, id: ProcessId) -> Result<VehicleOutcome, EngineError> {
        tracing::warn!(process = %id, retries = self.config.max_retries, "retry budget exhausted");
        self.with_engine(|engine| engine.abort(id))?;
        Ok(VehicleOutcome::GaveUp { process: id })
    }

    /// Runs one vehicle per direction concurrently, arriving
    /// `arrival_interval` apart, then reports.
    ///
    /// # Errors
    ///
    /// Returns the first [`EngineError`] raised by any vehicle.
    pub async fn run_all(&self, directions: &[Direction]) -> Result<SimulationReport, EngineError> {
        let vehicles = directions.iter().enumerate().map(|(index, &direction)| {
            let delay = self.config.arrival_interval * u32::try_from(index).unwrap_or(u32::MAX);
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.run_vehicle(direction).await
            }
        });

        let runs = try_join_all(vehicles).await?;
        Ok(self.report(runs))
    }

    /// Builds a report from finished runs and the engine's current state.
    pub fn report(&self, runs: Vec<VehicleRun>) -> SimulationReport {
        self.with_engine(|engine| SimulationReport {
            policy: engine.policy(),
            runs,
            deadlock: engine.check_deadlock(),
            coffman: engine.coffman_conditions(),
            statistics: engine.statistics(),
        })
    }
}
