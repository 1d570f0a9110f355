//! Admission controller for gridlock (Layer 3).
//!
//! `gridlock_engine` ties the data model, the graph engine and the policies
//! together behind one owned aggregate, [`Engine`]:
//!
//! - Lifecycle: [`Engine::create_process`], [`Engine::grant_first`],
//!   [`Engine::advance`], [`Engine::complete`], [`Engine::abort`]
//! - Policy: [`Engine::set_policy`], [`Engine::policy`]
//! - Analysis: [`Engine::check_deadlock`], [`Engine::run_safety_analysis`],
//!   [`Engine::resolve_safely`], [`Engine::coffman_conditions`]
//! - Observation: [`Engine::graph_snapshot`], [`Engine::statistics`],
//!   [`Engine::hooks`], [`Engine::events`]
//!
//! The engine is synchronous and never blocks. Timing belongs to the
//! caller, which drives transitions one call at a time.
//!
//! # Example
//!
//! ```
//! use gridlock_engine::{Admission, Engine, EngineConfig};
//! use gridlock_model::Direction;
//! use gridlock_policy::{DenialReason, PolicyMode};
//!
//! let mut engine = Engine::new(EngineConfig::new().with_policy(PolicyMode::Avoidance));
//! for direction in [Direction::North, Direction::East, Direction::South] {
//!     assert!(engine.create_process(direction).unwrap().is_granted());
//! }
//!
//! let outcome = engine.create_process(Direction::West).unwrap();
//! assert_eq!(outcome, Admission::Denied(DenialReason::UnsafeAllocation));
//! assert!(!engine.check_deadlock().deadlocked);
//! ```

mod clock;
mod config;
mod engine;
mod error;
mod outcome;
mod report;
mod stats;

/// Engine events, observers and the event log.
pub mod hooks;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
pub use clock::{Clock, ClockProvider, SystemClock};
pub use config::{DEFAULT_EVENT_LOG_CAPACITY, EngineConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use outcome::{Admission, Advance, Completion};
pub use report::{CoffmanConditions, DeadlockReport, Resolution};
pub use stats::Statistics;
