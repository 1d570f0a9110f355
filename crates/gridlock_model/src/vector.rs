//! Per-resource demand vectors.

use core::fmt;
use core::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A count per resource type, indexed by [`Resource::index`].
///
/// Used for allocation, maximum demand, need and availability in the
/// Banker's safety check. Every resource has a single unit, so entries are
/// 0 or 1 for any single process; sums over processes may be larger only
/// when the mutual exclusion invariant is broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceVector([u8; Resource::COUNT]);

impl ResourceVector {
    /// All zeros.
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; Resource::COUNT])
    }

    /// One unit of every resource: the total inventory.
    #[must_use]
    pub const fn ones() -> Self {
        Self([1; Resource::COUNT])
    }

    /// A single unit of `resource`.
    #[must_use]
    pub fn unit(resource: Resource) -> Self {
        let mut v = Self::zero();
        v.0[resource.index()] = 1;
        v
    }

    /// A single unit of each listed resource.
    #[must_use]
    pub fn of(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut v = Self::zero();
        for resource in resources {
            v.0[resource.index()] = 1;
        }
        v
    }

    /// Returns the count for `resource`.
    #[must_use]
    pub fn get(&self, resource: Resource) -> u8 {
        self.0[resource.index()]
    }

    /// Sets the count for `resource`.
    pub fn set(&mut self, resource: Resource, count: u8) {
        self.0[resource.index()] = count;
    }

    /// Componentwise `self <= other`.
    #[must_use]
    pub fn fits_within(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    /// Componentwise subtraction, clamped at zero.
    #[must_use]
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let mut out = *self;
        for (slot, rhs) in out.0.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_sub(*rhs);
        }
        out
    }

    /// Returns true if every entry is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// Iterates `(resource, count)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u8)> + '_ {
        Resource::ALL.into_iter().map(|r| (r, self.0[r.index()]))
    }
}

impl Add for ResourceVector {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for ResourceVector {
    fn add_assign(&mut self, rhs: Self) {
        for (slot, add) in self.0.iter_mut().zip(rhs.0.iter()) {
            *slot = slot.saturating_add(*add);
        }
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (resource, count)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {count}", resource.short_label())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_within_is_componentwise() {
        let need = ResourceVector::unit(Resource::East);
        let work = ResourceVector::of([Resource::East, Resource::West]);
        assert!(need.fits_within(&work));
        assert!(!work.fits_within(&need));
    }

    #[test]
    fn saturating_sub_clamps() {
        let max = ResourceVector::of([Resource::North, Resource::East]);
        let alloc = ResourceVector::of([Resource::North, Resource::South]);
        assert_eq!(max.saturating_sub(&alloc), ResourceVector::unit(Resource::East));
    }

    #[test]
    fn display_uses_short_labels() {
        let v = ResourceVector::unit(Resource::South);
        assert_eq!(v.to_string(), "{R_N: 0, R_E: 0, R_S: 1, R_W: 0}");
    }
}
