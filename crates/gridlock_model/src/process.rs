//! Processes contending for resources.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resource::{Direction, ParseError, Resource, Route};
use crate::vector::ResourceVector;

/// Unique, monotonically assigned process identifier.
///
/// Displayed and serialized as `P1`, `P2`, ... so cycle traces read the
/// same in logs and JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ProcessId(pub(crate) u64);

impl ProcessId {
    /// Creates a process ID from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('P')
            .or_else(|| s.strip_prefix('p'))
            .and_then(|digits| digits.parse().ok())
            .map(ProcessId)
            .ok_or_else(|| ParseError::new("process id", s))
    }
}

impl From<ProcessId> for String {
    fn from(id: ProcessId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ProcessId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle of a process.
///
/// ```text
/// Approaching ──grant──▶ Waiting ──advance──▶ Running ──complete──▶ Completed
/// ```
///
/// `Completed` processes are removed from the registry; the state exists so
/// reports and events can name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Created, holds nothing, not yet contending.
    Approaching,
    /// Holds its first resource and requests its second.
    Waiting,
    /// Holds its second resource and is in transit.
    Running,
    /// Released everything.
    Completed,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Approaching => "approaching",
            ProcessState::Waiting => "waiting",
            ProcessState::Running => "running",
            ProcessState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// A process in the registry.
///
/// Fields are read-only from outside the crate: every mutation goes through
/// [`ProcessRegistry`](crate::registry::ProcessRegistry), which maintains the
/// resource ownership table alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub(crate) id: ProcessId,
    pub(crate) route: Route,
    pub(crate) direction: Option<Direction>,
    pub(crate) state: ProcessState,
    pub(crate) held: Option<Resource>,
    pub(crate) requested: Option<Resource>,
    pub(crate) max_demand: ResourceVector,
}

impl Process {
    /// Creates an approaching process that declares both route resources as
    /// its maximum demand.
    #[must_use]
    pub fn new(id: ProcessId, route: Route) -> Self {
        Self {
            id,
            route,
            direction: None,
            state: ProcessState::Approaching,
            held: None,
            requested: None,
            max_demand: ResourceVector::of([route.first, route.second]),
        }
    }

    /// Records the approach direction this process was created from.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Returns the process ID.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Returns the acquisition route.
    #[must_use]
    pub fn route(&self) -> Route {
        self.route
    }

    /// Returns the approach direction, if the process was created from one.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Returns the held resource, if any.
    #[must_use]
    pub fn held(&self) -> Option<Resource> {
        self.held
    }

    /// Returns the requested resource, if any.
    #[must_use]
    pub fn requested(&self) -> Option<Resource> {
        self.requested
    }

    /// Returns the remaining declared maximum demand.
    ///
    /// Both route resources at creation; only the second once the process
    /// has advanced past its first.
    #[must_use]
    pub fn max_demand(&self) -> ResourceVector {
        self.max_demand
    }

    /// Returns the allocation vector derived from the held resource.
    #[must_use]
    pub fn allocation(&self) -> ResourceVector {
        self.held.map_or_else(ResourceVector::zero, ResourceVector::unit)
    }

    /// Returns `max_demand - allocation`.
    #[must_use]
    pub fn need(&self) -> ResourceVector {
        self.max_demand.saturating_sub(&self.allocation())
    }

    /// Returns true if the process is in the `Waiting` state.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.state == ProcessState::Waiting
    }

    /// Returns true if the process takes part in the allocation graph,
    /// i.e. it is `Waiting` or `Running`.
    #[must_use]
    pub fn is_contending(&self) -> bool {
        matches!(self.state, ProcessState::Waiting | ProcessState::Running)
    }
}
