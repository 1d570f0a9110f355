//! Running counters.

use gridlock_policy::DenialReason;
use serde::{Deserialize, Serialize};

/// Counters accumulated since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Processes registered, including those later denied.
    pub created: u64,
    /// Processes granted their first resource.
    pub admitted: u64,
    /// Processes that completed.
    pub completed: u64,
    /// Processes removed early.
    pub aborted: u64,
    /// Denials for [`DenialReason::UnsafeAllocation`].
    pub denied_unsafe: u64,
    /// Denials for [`DenialReason::OrderingViolation`].
    pub denied_ordering: u64,
    /// Denials for [`DenialReason::InvalidRoute`].
    pub denied_invalid_route: u64,
    /// Distinct deadlocks detected.
    pub deadlocks_detected: u64,
    /// Live processes at the time of the query.
    pub active: usize,
}

impl Statistics {
    /// Returns the denial count for `reason`.
    #[must_use]
    pub fn denials(&self, reason: DenialReason) -> u64 {
        match reason {
            DenialReason::UnsafeAllocation => self.denied_unsafe,
            DenialReason::OrderingViolation => self.denied_ordering,
            DenialReason::InvalidRoute => self.denied_invalid_route,
        }
    }

    /// Returns the total number of denials.
    #[must_use]
    pub fn total_denials(&self) -> u64 {
        DenialReason::ALL.into_iter().map(|r| self.denials(r)).sum()
    }

    pub(crate) fn record_denial(&mut self, reason: DenialReason) {
        let slot = match reason {
            DenialReason::UnsafeAllocation => &mut self.denied_unsafe,
            DenialReason::OrderingViolation => &mut self.denied_ordering,
            DenialReason::InvalidRoute => &mut self.denied_invalid_route,
        };
        *slot += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_are_tallied_per_reason() {
        let mut stats = Statistics::default();
        stats.record_denial(DenialReason::UnsafeAllocation);
        stats.record_denial(DenialReason::UnsafeAllocation);
        stats.record_denial(DenialReason::InvalidRoute);

        assert_eq!(stats.denials(DenialReason::UnsafeAllocation), 2);
        assert_eq!(stats.denials(DenialReason::OrderingViolation), 0);
        assert_eq!(stats.total_denials(), 3);
    }
}
