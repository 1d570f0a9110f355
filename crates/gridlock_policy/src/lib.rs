//! Deadlock avoidance and prevention policies for gridlock (Layer 2).
//!
//! `gridlock_policy` decides, before anything is committed, whether a grant
//! may go ahead:
//!
//! - [`SafetyState`] - Banker's safety check over a hypothetical allocation
//! - [`OrderingPolicy`] - Static resource-ordering rules
//! - [`AdmissionPolicy`] - The seam the admission controller dispatches
//!   through, one implementation per [`PolicyMode`]
//!
//! Every check is a pure function of a registry snapshot plus a delta; a
//! denial never touches the registry.

/// The admission trait and its implementations.
pub mod admission;

/// Policy modes and verdicts.
pub mod mode;

/// Resource-ordering rules.
pub mod ordering;

/// Banker's safety check.
pub mod safety;

pub use admission::{AdmissionPolicy, AvoidancePolicy, DetectionPolicy, PreventionPolicy};
pub use mode::{DenialReason, PolicyMode, UnknownPolicy, Verdict};
pub use ordering::{OrderingPolicy, OrderingRule, OrderingViolation};
pub use safety::{SafetyAnalysis, SafetyMatrices, SafetyRow, SafetyState};
