//! Resource-ordering rules for deadlock prevention.
//!
//! Resources are ranked `R_North < R_East < R_South < R_West`. A route is
//! checked once, when its first resource would be granted, against three
//! rules applied in order:
//!
//! 1. The route must not decrease in rank.
//! 2. It must not close a loop with a process already holding rank `a` and
//!    requesting rank `b`. For an anomalous holder (`a > b`) any route whose
//!    rank interval overlaps `[b, a]` is rejected; for a compliant holder
//!    only the exact mirror route `a -> b` is.
//! 3. It must not straddle a held rank `h` (`s < h < f`) whose holder
//!    requests one of the route's own resources.
//!
//! Rule 1 alone makes a circular wait impossible among processes admitted
//! under this policy. Rules 2 and 3 are conservative extra guards for
//! processes admitted under another mode before the switch; rule 3 can
//! only fire on routes that rule 1 already rejects.

use core::fmt;

use gridlock_model::{ProcessId, ProcessRegistry, Route};
use serde::{Deserialize, Serialize};

/// Which ordering rule rejected a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingRule {
    /// The route decreases in rank.
    RankOrder,
    /// The route could close a loop with a waiting process.
    LoopClosure,
    /// The route straddles a held resource whose holder wants the route.
    Straddle,
}

impl fmt::Display for OrderingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingRule::RankOrder => f.write_str("route decreases in rank"),
            OrderingRule::LoopClosure => f.write_str("route could close a wait loop"),
            OrderingRule::Straddle => f.write_str("route straddles a contended resource"),
        }
    }
}

/// A rejected route: the rule and, for rules 2 and 3, the process it
/// conflicts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingViolation {
    /// The rule that fired.
    pub rule: OrderingRule,
    /// The existing process the route conflicts with.
    pub conflict: Option<ProcessId>,
}

impl fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conflict {
            Some(id) => write!(f, "{} (conflicts with {id})", self.rule),
            None => write!(f, "{}", self.rule),
        }
    }
}

/// The static resource-ordering check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderingPolicy;

impl OrderingPolicy {
    /// Returns true if `route` passes every rule against `registry`.
    #[must_use]
    pub fn permits(&self, route: Route, registry: &ProcessRegistry) -> bool {
        self.check(route, registry).is_ok()
    }

    /// Applies the rules in order and reports the first one that fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderingViolation`] found.
    pub fn check(&self, route: Route, registry: &ProcessRegistry) -> Result<(), OrderingViolation> {
        check_rank_order(route)?;
        check_loop_closure(route, registry)?;
        check_straddle(route, registry)
    }
}

/// Rule 1: the route must be non-decreasing in rank.
///
/// # Errors
///
/// Returns [`OrderingRule::RankOrder`] for a decreasing route.
pub fn check_rank_order(route: Route) -> Result<(), OrderingViolation> {
    if route.is_rank_ordered() {
        Ok(())
    } else {
        Err(OrderingViolation {
            rule: OrderingRule::RankOrder,
            conflict: None,
        })
    }
}

/// Rule 2: the route must not close a loop with any waiting process.
///
/// # Errors
///
/// Returns [`OrderingRule::LoopClosure`] naming the first conflicting
/// process in insertion order.
pub fn check_loop_closure(route: Route, registry: &ProcessRegistry) -> Result<(), OrderingViolation> {
    let f = route.first.rank();
    let s = route.second.rank();

    for process in registry.iter().filter(|p| p.is_contending()) {
        let (Some(held), Some(requested)) = (process.held(), process.requested()) else {
            continue;
        };
        let a = held.rank();
        let b = requested.rank();

        let closes = if a > b {
            f <= a && b <= s
        } else {
            s == a && f == b
        };
        if closes {
            return Err(OrderingViolation {
                rule: OrderingRule::LoopClosure,
                conflict: Some(process.id()),
            });
        }
    }
    Ok(())
}

/// Rule 3: the route must not straddle a held rank whose holder requests
/// one of the route's resources.
///
/// # Errors
///
/// Returns [`OrderingRule::Straddle`] naming the first conflicting holder.
pub fn check_straddle(route: Route, registry: &ProcessRegistry) -> Result<(), OrderingViolation> {
    let f = route.first.rank();
    let s = route.second.rank();

    for process in registry.iter().filter(|p| p.is_contending()) {
        let (Some(held), Some(requested)) = (process.held(), process.requested()) else {
            continue;
        };
        let h = held.rank();
        let r = requested.rank();

        if s < h && h < f && (r == f || r == s) {
            return Err(OrderingViolation {
                rule: OrderingRule::Straddle,
                conflict: Some(process.id()),
            });
        }
    }
    Ok(())
}
