//! Engine errors.

use gridlock_model::{ProcessId, ProcessState, RegistryError};

/// Errors returned by [`Engine`](crate::Engine) operations.
///
/// These report caller misuse: stale IDs or an operation issued in the
/// wrong lifecycle state. Policy denials are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The process was never issued, or was denied or aborted.
    #[error("process {0} not found")]
    NotFound(ProcessId),

    /// The process has already completed.
    #[error("process {0} has already completed")]
    AlreadyCompleted(ProcessId),

    /// The process is not in a state that allows the operation.
    #[error("cannot {operation} process {process} while it is {state}")]
    InvalidTransition {
        /// The process.
        process: ProcessId,
        /// Its current state.
        state: ProcessState,
        /// The attempted operation.
        operation: &'static str,
    },

    /// The registry rejected a mutation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
