//! The fixed resource catalog and the routes processes take through it.
//!
//! Resources are the four lanes entering the intersection. Each one is a
//! single unit: at most one process holds it at any instant. Resources also
//! carry a rank, a fixed total order used by the prevention policy.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Resource
// ─────────────────────────────────────────────────────────────────────────────

/// A single-unit resource.
///
/// The declaration order defines the rank: `North < East < South < West`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    /// The northern lane.
    #[serde(rename = "R_North")]
    North,
    /// The eastern lane.
    #[serde(rename = "R_East")]
    East,
    /// The southern lane.
    #[serde(rename = "R_South")]
    South,
    /// The western lane.
    #[serde(rename = "R_West")]
    West,
}

impl Resource {
    /// Number of resource types in the catalog.
    pub const COUNT: usize = 4;

    /// Every resource, in rank order.
    pub const ALL: [Resource; Self::COUNT] = [
        Resource::North,
        Resource::East,
        Resource::South,
        Resource::West,
    ];

    /// Returns the position of this resource in [`Resource::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the acquisition rank used by the ordering policy.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Returns the canonical label, e.g. `R_North`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Resource::North => "R_North",
            Resource::East => "R_East",
            Resource::South => "R_South",
            Resource::West => "R_West",
        }
    }

    /// Returns the abbreviated label used in matrix headers, e.g. `R_N`.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Resource::North => "R_N",
            Resource::East => "R_E",
            Resource::South => "R_S",
            Resource::West => "R_W",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing a [`Resource`], [`Direction`] or
/// [`ProcessId`](crate::ProcessId) from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{input}'")]
pub struct ParseError {
    kind: &'static str,
    input: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, input: &str) -> Self {
        Self {
            kind,
            input: input.to_owned(),
        }
    }
}

impl FromStr for Resource {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("R_").unwrap_or(s);
        match name.to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Resource::North),
            "east" | "e" => Ok(Resource::East),
            "south" | "s" => Ok(Resource::South),
            "west" | "w" => Ok(Resource::West),
            _ => Err(ParseError {
                kind: "resource",
                input: s.to_owned(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Route
// ─────────────────────────────────────────────────────────────────────────────

/// The ordered pair of resources a process acquires in sequence.
///
/// A route is only well-formed when its two resources differ; the admission
/// controller denies malformed routes before a process is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Resource acquired when the process is admitted.
    pub first: Resource,
    /// Resource requested while holding `first`.
    pub second: Resource,
}

impl Route {
    /// Creates a route. Use [`Route::is_well_formed`] to validate it.
    #[must_use]
    pub const fn new(first: Resource, second: Resource) -> Self {
        Self { first, second }
    }

    /// Returns true if the two resources differ.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.first != self.second
    }

    /// Returns true if the route acquires resources in non-decreasing rank.
    #[must_use]
    pub fn is_rank_ordered(&self) -> bool {
        self.first.rank() <= self.second.rank()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.first, self.second)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Direction
// ─────────────────────────────────────────────────────────────────────────────

/// The approach a vehicle takes into the intersection.
///
/// Every direction occupies its own lane first, then turns into the lane
/// clockwise from it. Four vehicles, one per direction, form the classic
/// circular wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Enters through the northern lane.
    North,
    /// Enters through the eastern lane.
    East,
    /// Enters through the southern lane.
    South,
    /// Enters through the western lane.
    West,
}

impl Direction {
    /// Every direction.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Returns the fixed route for this direction.
    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Direction::North => Route::new(Resource::North, Resource::East),
            Direction::East => Route::new(Resource::East, Resource::South),
            Direction::South => Route::new(Resource::South, Resource::West),
            Direction::West => Route::new(Resource::West, Resource::North),
        }
    }

    /// Returns the lowercase name of this direction.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "east" | "e" => Ok(Direction::East),
            "south" | "s" => Ok(Direction::South),
            "west" | "w" => Ok(Direction::West),
            _ => Err(ParseError {
                kind: "direction",
                input: s.to_owned(),
            }),
        }
    }
}

impl From<Direction> for Route {
    fn from(direction: Direction) -> Self {
        direction.route()
    }
}
