//! Async driver for gridlock.
//!
//! The engine is synchronous; this crate adds time. [`Simulation`] shares
//! one [`Engine`](gridlock_engine::Engine) between concurrently running
//! vehicles and paces each through its lifecycle with `tokio::time`.
//! [`TracingConfig`] installs the `tracing` subscriber that renders the
//! engine's log output.
//!
//! # Example
//!
//! ```
//! use gridlock_driver::{Simulation, SimulationConfig, VehicleOutcome};
//! use gridlock_engine::Engine;
//! use gridlock_model::Direction;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap().block_on(async {
//! let simulation = Simulation::new(Engine::default(), SimulationConfig::default());
//!
//! let report = simulation.run_all(&Direction::ALL).await.unwrap();
//! assert!(report.deadlock.deadlocked);
//! assert!(report
//!     .runs
//!     .iter()
//!     .all(|run| matches!(run.outcome, VehicleOutcome::Deadlocked { .. })));
//! # });
//! ```

mod simulation;
mod tracing_setup;

pub use simulation::{
    SharedEngine, Simulation, SimulationConfig, SimulationReport, VehicleOutcome, VehicleRun,
};
pub use tracing_setup::{TracingConfig, TracingFormat, UnknownFormat};
