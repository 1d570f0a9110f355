//! Typed results of engine operations.

use gridlock_model::ProcessId;
use gridlock_policy::DenialReason;
use serde::{Deserialize, Serialize};

/// Result of creating a process or granting its first resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// The process holds its first resource and is `Waiting`.
    Granted(ProcessId),
    /// The process is `Approaching`; its first resource is held by someone
    /// else (or has not been asked for yet). Retry with
    /// [`Engine::grant_first`](crate::Engine::grant_first).
    Pending(ProcessId),
    /// The process was rejected and discarded.
    Denied(DenialReason),
}

impl Admission {
    /// Returns the process ID unless the admission was denied.
    #[must_use]
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            Admission::Granted(id) | Admission::Pending(id) => Some(*id),
            Admission::Denied(_) => None,
        }
    }

    /// Returns true for [`Admission::Granted`].
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted(_))
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Admission::Denied(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result of asking a waiting process to move onto its requested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    /// The process now holds its second resource and is `Running`.
    Advanced,
    /// The requested resource is held; nothing changed.
    StillWaiting,
    /// The policy rejected the grant; the process stays `Waiting`.
    Denied(DenialReason),
}

/// Result of completing a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The process released its resource and was removed.
    Completed,
    /// The process had already completed; nothing changed.
    AlreadyCompleted,
}
