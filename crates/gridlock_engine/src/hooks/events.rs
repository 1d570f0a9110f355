//! Unified event enum for engine observers.
//!
//! All observers receive `&EngineEvent` and match on variants for typed
//! access.
//!
//! # Example
//!
//! ```
//! use gridlock_engine::hooks::EngineEvent;
//!
//! fn handle_event(event: &EngineEvent) {
//!     match event {
//!         EngineEvent::DeadlockDetected { processes, .. } => {
//!             eprintln!("{} processes deadlocked", processes.len());
//!         }
//!         EngineEvent::RequestDenied { reason, .. } => {
//!             eprintln!("denied: {reason}");
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use core::fmt;

use gridlock_graph::Label;
use gridlock_model::{Direction, ProcessId, Resource, Route};
use gridlock_policy::{DenialReason, PolicyMode};
use serde::{Deserialize, Serialize};

/// Where in the lifecycle a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialStage {
    /// Creating the process.
    Create,
    /// Granting its first resource.
    Admission,
    /// Moving onto its second resource.
    Advance,
}

/// Every observable engine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// A process was registered as `Approaching`.
    ProcessCreated {
        /// The new process.
        process: ProcessId,
        /// Its route.
        route: Route,
        /// The direction it came from, if any.
        direction: Option<Direction>,
    },

    /// A process was granted its first resource.
    ResourceGranted {
        /// The process.
        process: ProcessId,
        /// The resource it now holds.
        resource: Resource,
        /// The resource it now requests.
        requested: Resource,
    },

    /// A process's first resource is busy; it stays `Approaching`.
    AdmissionPending {
        /// The process.
        process: ProcessId,
        /// The busy resource.
        resource: Resource,
        /// Its holder.
        holder: ProcessId,
    },

    /// A policy or route check rejected a request.
    RequestDenied {
        /// The process, unless it was rejected before creation.
        process: Option<ProcessId>,
        /// Why.
        reason: DenialReason,
        /// At which step.
        stage: DenialStage,
    },

    /// A process moved onto its second resource.
    ProcessAdvanced {
        /// The process.
        process: ProcessId,
        /// The resource released.
        released: Resource,
        /// The resource acquired.
        acquired: Resource,
    },

    /// A running process finished and was removed.
    ProcessCompleted {
        /// The process.
        process: ProcessId,
    },

    /// A process was removed early.
    ProcessAborted {
        /// The process.
        process: ProcessId,
        /// The resource it held, now free.
        released: Option<Resource>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Deadlock
    // ─────────────────────────────────────────────────────────────────────────
    /// A cycle appeared in the wait-for graph.
    DeadlockDetected {
        /// Every process on a cycle.
        processes: Vec<ProcessId>,
        /// One cycle as alternating labels.
        cycle: Vec<Label>,
    },

    /// The previously detected deadlock no longer exists.
    DeadlockCleared,

    // ─────────────────────────────────────────────────────────────────────────
    // Control
    // ─────────────────────────────────────────────────────────────────────────
    /// The active policy changed.
    PolicyChanged {
        /// The old mode.
        from: PolicyMode,
        /// The new mode.
        to: PolicyMode,
    },

    /// The engine was reset.
    Reset,
}

/// Discriminant of [`EngineEvent`], used to subscribe to a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// [`EngineEvent::ProcessCreated`]
    ProcessCreated,
    /// [`EngineEvent::ResourceGranted`]
    ResourceGranted,
    /// [`EngineEvent::AdmissionPending`]
    AdmissionPending,
    /// [`EngineEvent::RequestDenied`]
    RequestDenied,
    /// [`EngineEvent::ProcessAdvanced`]
    ProcessAdvanced,
    /// [`EngineEvent::ProcessCompleted`]
    ProcessCompleted,
    /// [`EngineEvent::ProcessAborted`]
    ProcessAborted,
    /// [`EngineEvent::DeadlockDetected`]
    DeadlockDetected,
    /// [`EngineEvent::DeadlockCleared`]
    DeadlockCleared,
    /// [`EngineEvent::PolicyChanged`]
    PolicyChanged,
    /// [`EngineEvent::Reset`]
    Reset,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 11] = [
        EventKind::ProcessCreated,
        EventKind::ResourceGranted,
        EventKind::AdmissionPending,
        EventKind::RequestDenied,
        EventKind::ProcessAdvanced,
        EventKind::ProcessCompleted,
        EventKind::ProcessAborted,
        EventKind::DeadlockDetected,
        EventKind::DeadlockCleared,
        EventKind::PolicyChanged,
        EventKind::Reset,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How an event is presented in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine progress.
    Info,
    /// A process finished or a deadlock cleared.
    Success,
    /// A request was held back.
    Warning,
    /// A deadlock.
    Error,
}

impl EngineEvent {
    /// Returns the event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::ProcessCreated { .. } => EventKind::ProcessCreated,
            EngineEvent::ResourceGranted { .. } => EventKind::ResourceGranted,
            EngineEvent::AdmissionPending { .. } => EventKind::AdmissionPending,
            EngineEvent::RequestDenied { .. } => EventKind::RequestDenied,
            EngineEvent::ProcessAdvanced { .. } => EventKind::ProcessAdvanced,
            EngineEvent::ProcessCompleted { .. } => EventKind::ProcessCompleted,
            EngineEvent::ProcessAborted { .. } => EventKind::ProcessAborted,
            EngineEvent::DeadlockDetected { .. } => EventKind::DeadlockDetected,
            EngineEvent::DeadlockCleared => EventKind::DeadlockCleared,
            EngineEvent::PolicyChanged { .. } => EventKind::PolicyChanged,
            EngineEvent::Reset => EventKind::Reset,
        }
    }

    /// Returns how the event should be presented.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self.kind() {
            EventKind::ProcessCompleted | EventKind::DeadlockCleared => Severity::Success,
            EventKind::AdmissionPending | EventKind::RequestDenied | EventKind::ProcessAborted => {
                Severity::Warning
            }
            EventKind::DeadlockDetected => Severity::Error,
            EventKind::ProcessCreated
            | EventKind::ResourceGranted
            | EventKind::ProcessAdvanced
            | EventKind::PolicyChanged
            | EventKind::Reset => Severity::Info,
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::ProcessCreated { process, route, .. } => {
                write!(f, "{process} created on route {route}")
            }
            EngineEvent::ResourceGranted {
                process,
                resource,
                requested,
            } => write!(f, "{process} allocated {resource}, requesting {requested}"),
            EngineEvent::AdmissionPending {
                process,
                resource,
                holder,
            } => write!(f, "{process} queued: {resource} held by {holder}"),
            EngineEvent::RequestDenied {
                process: Some(process),
                reason,
                ..
            } => write!(f, "{process} denied: {reason}"),
            EngineEvent::RequestDenied {
                process: None,
                reason,
                ..
            } => write!(f, "request denied: {reason}"),
            EngineEvent::ProcessAdvanced {
                process,
                released,
                acquired,
            } => write!(f, "{process} released {released}, acquired {acquired}"),
            EngineEvent::ProcessCompleted { process } => write!(f, "{process} completed"),
            EngineEvent::ProcessAborted { process, .. } => write!(f, "{process} aborted"),
            EngineEvent::DeadlockDetected { cycle, .. } => {
                f.write_str("deadlock detected: ")?;
                for (i, label) in cycle.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" → ")?;
                    }
                    write!(f, "{label}")?;
                }
                Ok(())
            }
            EngineEvent::DeadlockCleared => f.write_str("deadlock cleared"),
            EngineEvent::PolicyChanged { from, to } => write!(f, "policy {from} -> {to}"),
            EngineEvent::Reset => f.write_str("simulation reset"),
        }
    }
}
