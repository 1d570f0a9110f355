//! Deadlock simulation for a four-way intersection.
//!
//! Vehicles are processes and intersection quadrants are resources. The
//! engine detects circular waits, avoids them with a safety check, or
//! prevents them with resource ordering.

pub use gridlock_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use gridlock_internal::prelude::*;
}
