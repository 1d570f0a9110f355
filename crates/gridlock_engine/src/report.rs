//! Read-only reports returned by the engine.

use gridlock_graph::Label;
use gridlock_model::ProcessId;
use serde::{Deserialize, Serialize};

/// Result of a deadlock check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockReport {
    /// Whether the wait-for graph has a cycle.
    pub deadlocked: bool,
    /// One cycle as alternating process and resource labels, starting and
    /// ending on the same process. Empty when not deadlocked.
    pub cycle: Vec<Label>,
    /// Every process on any cycle, in insertion order.
    pub processes: Vec<ProcessId>,
}

impl DeadlockReport {
    /// Renders the cycle as `P1 → R_East → … → P1`.
    #[must_use]
    pub fn cycle_trace(&self) -> String {
        self.cycle
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// The four Coffman conditions for the current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffmanConditions {
    /// Resources are held exclusively.
    pub mutual_exclusion: bool,
    /// Some process holds a resource while requesting another.
    pub hold_and_wait: bool,
    /// Held resources are never taken away.
    pub no_preemption: bool,
    /// The wait-for graph has a cycle.
    pub circular_wait: bool,
}

impl CoffmanConditions {
    /// Returns true when all four hold.
    #[must_use]
    pub fn all_hold(&self) -> bool {
        self.mutual_exclusion && self.hold_and_wait && self.no_preemption && self.circular_wait
    }
}

/// Result of [`Engine::resolve_safely`](crate::Engine::resolve_safely).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Whether a full safe sequence existed.
    pub safe: bool,
    /// The safe sequence, or the partial one when unsafe.
    pub sequence: Vec<ProcessId>,
    /// The processes actually retired, in order. Empty when unsafe.
    pub completed: Vec<ProcessId>,
}
