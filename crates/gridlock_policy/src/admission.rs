//! The [`AdmissionPolicy`] trait and its three strategies.

use gridlock_model::{Process, ProcessRegistry};

use crate::mode::{DenialReason, PolicyMode, Verdict};
use crate::ordering::OrderingPolicy;
use crate::safety::SafetyState;

/// A deadlock-handling strategy consulted before a grant is committed.
///
/// Policies read the registry and never mutate it. The admission
/// controller commits the grant only on [`Verdict::Permit`].
///
/// # Example
///
/// ```
/// use gridlock_model::{Direction, Process, ProcessId, ProcessRegistry};
/// use gridlock_policy::{AdmissionPolicy, DenialReason, PolicyMode, Verdict};
///
/// let registry = ProcessRegistry::new();
/// let candidate = Process::new(ProcessId::new(1), Direction::West.route());
///
/// let verdict = PolicyMode::Prevention.policy().admit(&candidate, &registry);
/// assert_eq!(verdict, Verdict::Deny(DenialReason::OrderingViolation));
/// ```
pub trait AdmissionPolicy: Send + Sync + 'static {
    /// The mode this policy implements.
    fn mode(&self) -> PolicyMode;

    /// Decides whether `candidate` may be granted its first resource.
    ///
    /// `candidate` is still `Approaching`; its first resource is free.
    fn admit(&self, candidate: &Process, registry: &ProcessRegistry) -> Verdict;

    /// Decides whether a waiting `process` may move onto its requested
    /// resource, which is free. Permits by default.
    fn advance(&self, _process: &Process, _registry: &ProcessRegistry) -> Verdict {
        Verdict::Permit
    }
}

/// Admits everything. Deadlock is found afterwards by cycle detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionPolicy;

impl AdmissionPolicy for DetectionPolicy {
    fn mode(&self) -> PolicyMode {
        PolicyMode::Detection
    }

    fn admit(&self, _candidate: &Process, _registry: &ProcessRegistry) -> Verdict {
        Verdict::Permit
    }
}

/// Banker's algorithm: denies any grant whose hypothetical state is unsafe.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvoidancePolicy;

impl AdmissionPolicy for AvoidancePolicy {
    fn mode(&self) -> PolicyMode {
        PolicyMode::Avoidance
    }

    fn admit(&self, candidate: &Process, registry: &ProcessRegistry) -> Verdict {
        let hypothetical = SafetyState::capture(registry).with_admission(candidate);
        safe_or_deny(&hypothetical)
    }

    /// Denies only a move that turns a safe state unsafe.
    ///
    /// A state can already be unsafe when the policy was switched on over
    /// processes admitted without a check. Moving onto a free resource
    /// leaves the mover needing nothing and removes one wait edge, so it
    /// never makes such a state worse and is permitted.
    fn advance(&self, process: &Process, registry: &ProcessRegistry) -> Verdict {
        let Some(requested) = process.requested() else {
            return Verdict::Permit;
        };
        let current = SafetyState::capture(registry);
        if !current.is_safe() {
            return Verdict::Permit;
        }
        safe_or_deny(&current.with_advance(process.id(), requested))
    }
}

fn safe_or_deny(state: &SafetyState) -> Verdict {
    if state.is_safe() {
        Verdict::Permit
    } else {
        Verdict::Deny(DenialReason::UnsafeAllocation)
    }
}

/// Resource ordering: denies routes that could take part in a circular wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreventionPolicy {
    ordering: OrderingPolicy,
}

impl AdmissionPolicy for PreventionPolicy {
    fn mode(&self) -> PolicyMode {
        PolicyMode::Prevention
    }

    fn admit(&self, candidate: &Process, registry: &ProcessRegistry) -> Verdict {
        if self.ordering.permits(candidate.route(), registry) {
            Verdict::Permit
        } else {
            Verdict::Deny(DenialReason::OrderingViolation)
        }
    }
}

static DETECTION: DetectionPolicy = DetectionPolicy;
static AVOIDANCE: AvoidancePolicy = AvoidancePolicy;
static PREVENTION: PreventionPolicy = PreventionPolicy {
    ordering: OrderingPolicy,
};

impl PolicyMode {
    /// Returns the policy implementing this mode.
    #[must_use]
    pub fn policy(self) -> &'static dyn AdmissionPolicy {
        match self {
            PolicyMode::Detection => &DETECTION,
            PolicyMode::Avoidance => &AVOIDANCE,
            PolicyMode::Prevention => &PREVENTION,
        }
    }
}
