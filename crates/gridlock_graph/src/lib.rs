//! Resource allocation graph and deadlock detection for gridlock (Layer 2).
//!
//! `gridlock_graph` derives two views from a [`ProcessRegistry`](gridlock_model::ProcessRegistry):
//!
//! - [`GraphSnapshot`] - The bipartite allocation graph, for rendering
//! - [`WaitForGraph`] - Its projection onto processes, for cycle detection
//!
//! # Example
//!
//! ```
//! use gridlock_graph::WaitForGraph;
//! use gridlock_model::{Direction, ProcessRegistry};
//!
//! let mut registry = ProcessRegistry::new();
//! for direction in Direction::ALL {
//!     let id = registry.spawn(direction.route(), Some(direction));
//!     registry.begin_waiting(id).unwrap();
//! }
//!
//! let graph = WaitForGraph::build(&registry);
//! assert!(graph.has_cycle());
//! assert_eq!(graph.deadlocked_processes().len(), 4);
//! ```

/// Wait-for graph and cycle detection.
pub mod cycle;

/// Allocation graph snapshots and vertex labels.
pub mod rag;

pub use cycle::WaitForGraph;
pub use rag::{AllocationEdge, GraphSnapshot, Label, ProcessNode, RequestEdge, ResourceNode};
