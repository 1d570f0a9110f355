//! # Gridlock Internal Library
//!
//! Re-exports the gridlock crates for convenience.

/// Layer 1: resources, routes and the process registry.
pub use gridlock_model;

/// Layer 2: resource allocation graph and cycle detection.
pub use gridlock_graph;

/// Layer 2: admission policies and the safety algorithm.
pub use gridlock_policy;

/// Layer 3: the admission controller.
pub use gridlock_engine;

/// Async pacing and tracing setup.
pub use gridlock_driver;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use gridlock_driver::{
        Simulation, SimulationConfig, SimulationReport, TracingConfig, TracingFormat,
        VehicleOutcome,
    };
    pub use gridlock_engine::hooks::{EngineEvent, EventKind};
    pub use gridlock_engine::{
        Admission, Advance, Completion, DeadlockReport, Engine, EngineConfig, EngineError,
    };
    pub use gridlock_graph::{GraphSnapshot, Label};
    pub use gridlock_model::{Direction, ProcessId, ProcessState, Resource, Route};
    pub use gridlock_policy::{DenialReason, PolicyMode};
}
