//! Policy modes, denial reasons and verdicts.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// The active deadlock-handling strategy.
///
/// Changing the mode affects only future admission decisions; processes
/// already admitted keep what they hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Admit everything; discover deadlock after the fact.
    #[default]
    Detection,
    /// Deny any grant that would leave the system unsafe (Banker's).
    Avoidance,
    /// Deny any route that breaks the resource ordering.
    Prevention,
}

impl PolicyMode {
    /// All modes in declaration order.
    pub const ALL: [PolicyMode; 3] = [
        PolicyMode::Detection,
        PolicyMode::Avoidance,
        PolicyMode::Prevention,
    ];

    /// Returns the lowercase mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PolicyMode::Detection => "detection",
            PolicyMode::Avoidance => "avoidance",
            PolicyMode::Prevention => "prevention",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown [`PolicyMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown policy mode: '{0}'")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyMode {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detection" | "detect" => Ok(PolicyMode::Detection),
            "avoidance" | "avoid" | "banker" | "bankers" => Ok(PolicyMode::Avoidance),
            "prevention" | "prevent" | "ordering" => Ok(PolicyMode::Prevention),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

/// Why a request was denied.
///
/// Denials are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Granting would leave no safe completion sequence.
    UnsafeAllocation,
    /// The route violates the resource ordering.
    OrderingViolation,
    /// The route's two resources are the same.
    InvalidRoute,
}

impl DenialReason {
    /// All reasons in declaration order.
    pub const ALL: [DenialReason; 3] = [
        DenialReason::UnsafeAllocation,
        DenialReason::OrderingViolation,
        DenialReason::InvalidRoute,
    ];
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::UnsafeAllocation => f.write_str("unsafe allocation"),
            DenialReason::OrderingViolation => f.write_str("ordering violation"),
            DenialReason::InvalidRoute => f.write_str("invalid route"),
        }
    }
}

/// A policy's answer to an admission or advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The request may be committed.
    Permit,
    /// The request must be rejected without touching state.
    Deny(DenialReason),
}

impl Verdict {
    /// Returns true for [`Verdict::Permit`].
    #[must_use]
    pub fn is_permit(&self) -> bool {
        matches!(self, Verdict::Permit)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Verdict::Permit => None,
            Verdict::Deny(reason) => Some(*reason),
        }
    }
}
