//! Engine event hooks.
//!
//! Every engine transition produces an [`EngineEvent`]. Events are delivered
//! to observers registered on [`EngineHooks`] and appended to a bounded
//! [`EventLog`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use gridlock_engine::Engine;
//! use gridlock_engine::hooks::{EngineEvent, EventKind};
//! use gridlock_model::Direction;
//!
//! let mut engine = Engine::default();
//! let deadlocks = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&deadlocks);
//! engine
//!     .hooks()
//!     .register_observer("alarm", [EventKind::DeadlockDetected], move |_: &EngineEvent| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//!
//! for direction in Direction::ALL {
//!     engine.create_process(direction).unwrap();
//! }
//! assert_eq!(deadlocks.load(Ordering::SeqCst), 1);
//! ```

mod api;
mod events;
mod log;

pub use api::{EngineHooks, HookRegistrationError};
pub use events::{DenialStage, EngineEvent, EventKind, Severity};
pub use log::{EventLog, LogEntry};
