//! Observer registration for engine events.
//!
//! [`EngineHooks`] keeps named observers per [`EventKind`]. An observer
//! registered for several kinds gets one entry per kind, named
//! `name@Kind`, so each entry can be looked up individually.
//!
//! # Example
//!
//! ```
//! use gridlock_engine::hooks::{EngineEvent, EngineHooks, EventKind};
//!
//! let hooks = EngineHooks::new();
//! hooks
//!     .register_observer("deadlock-alarm", [EventKind::DeadlockDetected], |event: &EngineEvent| {
//!         eprintln!("{event}");
//!     })
//!     .unwrap();
//!
//! assert_eq!(hooks.hook_count(EventKind::DeadlockDetected), 1);
//! ```

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use super::events::{EngineEvent, EventKind};

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistrationError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during hook registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookRegistrationError {
    /// An observer with this name already exists for the event kind.
    #[error("hook '{name}' already registered for {kind}")]
    DuplicateName {
        /// The kind where the duplicate was found.
        kind: EventKind,
        /// The duplicate name.
        name: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// EngineHooks
// ─────────────────────────────────────────────────────────────────────────────

type Observer = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

struct HookEntry {
    name: String,
    observer: Observer,
}

/// Registry of event observers.
///
/// Uses interior mutability so observers can be added through a shared
/// reference, including while the engine sits behind a lock.
#[derive(Default)]
pub struct EngineHooks {
    hooks: RwLock<HashMap<EventKind, Vec<HookEntry>>>,
}

impl EngineHooks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an observer for one or more event kinds.
    ///
    /// Pass [`EventKind::ALL`] to observe everything.
    ///
    /// # Errors
    ///
    /// Returns [`HookRegistrationError::DuplicateName`] if the name is taken
    /// for any of the kinds. Kinds before the duplicate stay registered.
    pub fn register_observer<F>(
        &self,
        name: impl Into<String>,
        kinds: impl IntoIterator<Item = EventKind>,
        observer: F,
    ) -> Result<&Self, HookRegistrationError>
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let kinds: Vec<EventKind> = kinds.into_iter().collect();
        let name = name.into();
        let observer: Observer = Arc::new(observer);

        for &kind in &kinds {
            let entry_name = if kinds.len() > 1 {
                format!("{name}@{kind}")
            } else {
                name.clone()
            };
            self.register_entry(kind, entry_name, Arc::clone(&observer))?;
        }
        Ok(self)
    }

    fn register_entry(
        &self,
        kind: EventKind,
        name: String,
        observer: Observer,
    ) -> Result<(), HookRegistrationError> {
        let mut hooks = self.hooks.write();
        let entries = hooks.entry(kind).or_default();

        if entries.iter().any(|entry| entry.name == name) {
            return Err(HookRegistrationError::DuplicateName { kind, name });
        }

        entries.push(HookEntry { name, observer });
        Ok(())
    }

    /// Invokes every observer for the event's kind, in registration order.
    pub fn invoke(&self, event: &EngineEvent) {
        let observers: Vec<Observer> = {
            let hooks = self.hooks.read();
            hooks
                .get(&event.kind())
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.observer)).collect())
                .unwrap_or_default()
        };
        for observer in observers {
            observer(event);
        }
    }

    /// Returns the number of observers for the kind.
    #[must_use]
    pub fn hook_count(&self, kind: EventKind) -> usize {
        let hooks = self.hooks.read();
        hooks.get(&kind).map_or(0, Vec::len)
    }

    /// Returns true if an observer with the given name exists for the kind.
    #[must_use]
    pub fn contains_hook(&self, kind: EventKind, name: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(&kind)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }

    /// Removes every observer whose name is `name` or starts with `name@`.
    /// Returns how many entries were removed.
    pub fn remove_observer(&self, name: &str) -> usize {
        let prefix = format!("{name}@");
        let mut hooks = self.hooks.write();
        let mut removed = 0;
        for entries in hooks.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.name != name && !entry.name.starts_with(&prefix));
            removed += before - entries.len();
        }
        removed
    }
}

impl fmt::Debug for EngineHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        let mut map = f.debug_map();
        for (kind, entries) in hooks.iter() {
            let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
            map.entry(kind, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_model::ProcessId;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn completed(id: u64) -> EngineEvent {
        EngineEvent::ProcessCompleted {
            process: ProcessId::new(id),
        }
    }

    #[test]
    fn register_increments_count() {
        let hooks = EngineHooks::new();

        hooks
            .register_observer("first", [EventKind::ProcessCompleted], |_: &EngineEvent| {})
            .expect("registration should succeed");
        hooks
            .register_observer("second", [EventKind::ProcessCompleted], |_: &EngineEvent| {})
            .expect("registration should succeed");

        assert_eq!(hooks.hook_count(EventKind::ProcessCompleted), 2);
        assert_eq!(hooks.hook_count(EventKind::Reset), 0);
    }

    #[test]
    fn invoke_calls_only_matching_kind() {
        let hooks = EngineHooks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        hooks
            .register_observer("counter", [EventKind::ProcessCompleted], move |_: &EngineEvent| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })
            .expect("registration should succeed");

        hooks.invoke(&completed(1));
        hooks.invoke(&EngineEvent::Reset);
        hooks.invoke(&completed(2));

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invoke_calls_all_hooks_in_order() {
        let hooks = EngineHooks::new();
        let execution_order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order_clone = Arc::clone(&execution_order);
            let name_owned = name.to_owned();
            hooks
                .register_observer(name, [EventKind::Reset], move |_: &EngineEvent| {
                    order_clone.lock().unwrap().push(name_owned.clone());
                })
                .expect("registration should succeed");
        }

        hooks.invoke(&EngineEvent::Reset);

        let order = execution_order.lock().unwrap();
        assert_eq!(
            *order,
            vec!["first", "second", "third"],
            "hooks should execute in registration order"
        );
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let hooks = EngineHooks::new();
        hooks
            .register_observer("dup", [EventKind::Reset], |_: &EngineEvent| {})
            .unwrap();

        let err = hooks
            .register_observer("dup", [EventKind::Reset], |_: &EngineEvent| {})
            .unwrap_err();

        assert_eq!(
            err,
            HookRegistrationError::DuplicateName {
                kind: EventKind::Reset,
                name: "dup".into(),
            }
        );
        assert_eq!(err.to_string(), "hook 'dup' already registered for Reset");
    }

    #[test]
    fn multi_kind_registration_suffixes_names() {
        let hooks = EngineHooks::new();
        hooks
            .register_observer(
                "tracker",
                [EventKind::ProcessCreated, EventKind::ProcessCompleted],
                |_: &EngineEvent| {},
            )
            .unwrap();

        assert!(hooks.contains_hook(EventKind::ProcessCreated, "tracker@ProcessCreated"));
        assert!(hooks.contains_hook(EventKind::ProcessCompleted, "tracker@ProcessCompleted"));
        assert!(!hooks.contains_hook(EventKind::ProcessCreated, "tracker"));

        assert_eq!(hooks.remove_observer("tracker"), 2);
        assert_eq!(hooks.hook_count(EventKind::ProcessCreated), 0);
    }

    #[test]
    fn observer_may_register_another_during_invoke() {
        let hooks = Arc::new(EngineHooks::new());
        let inner = Arc::clone(&hooks);

        hooks
            .register_observer("spawner", [EventKind::Reset], move |_: &EngineEvent| {
                let _ = inner.register_observer("late", [EventKind::Reset], |_: &EngineEvent| {});
            })
            .unwrap();

        hooks.invoke(&EngineEvent::Reset);
        assert!(hooks.contains_hook(EventKind::Reset, "late"));
    }
}
