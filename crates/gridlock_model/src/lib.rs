//! Resource and process registries for gridlock (Layer 1).
//!
//! `gridlock_model` is the shared data model every deadlock strategy reads:
//!
//! - [`Resource`] - The fixed catalog of single-unit resources and their ranks
//! - [`Route`] / [`Direction`] - The ordered pair of resources a process acquires
//! - [`Process`] - A contending process and its lifecycle state
//! - [`ResourceVector`] - Per-resource counts (allocation, demand, need)
//! - [`ProcessRegistry`] - Live processes plus the resource owner table
//!
//! # Architecture
//!
//! - **Layer 1** (`gridlock_model`): Shared data model (this crate)
//! - **Layer 2** (`gridlock_graph`, `gridlock_policy`): Detection, avoidance and prevention
//! - **Layer 3** (`gridlock_engine`): Admission controller
//! - **Layer 4** (`gridlock_driver`): Timing, tracing and the async simulation
//!
//! # Example
//!
//! ```
//! use gridlock_model::{Direction, ProcessRegistry, ProcessState, Resource};
//!
//! let mut registry = ProcessRegistry::new();
//! let p1 = registry.spawn(Direction::North.route(), Some(Direction::North));
//! registry.begin_waiting(p1).unwrap();
//!
//! assert_eq!(registry.owner(Resource::North), Some(p1));
//! assert_eq!(registry.get(p1).unwrap().state(), ProcessState::Waiting);
//! ```

/// Per-process lifecycle types.
pub mod process;

/// Process registry and resource ownership table.
pub mod registry;

/// Resource catalog, routes and directions.
pub mod resource;

/// Per-resource count vectors.
pub mod vector;

pub use process::{Process, ProcessId, ProcessState};
pub use registry::{ProcessRegistry, RegistryError};
pub use resource::{Direction, ParseError, Resource, Route};
pub use vector::ResourceVector;
