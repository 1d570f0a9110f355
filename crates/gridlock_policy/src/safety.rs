//! Banker's safety check for single-unit resources.
//!
//! A [`SafetyState`] is an immutable table of `(allocation, max)` rows, one
//! per contending process, in registry insertion order. Hypothetical grants
//! are built with [`SafetyState::with_admission`] and
//! [`SafetyState::with_advance`], which return a new state and leave the
//! original (and the registry it was captured from) untouched.
//!
//! The scan is the textbook one: `work = available`; find the first
//! unfinished process whose need fits in `work`, release its allocation
//! into `work`, and restart from the top. The state is safe iff every
//! process finishes.

use gridlock_model::{Process, ProcessId, ProcessRegistry, Resource, ResourceVector};
use serde::{Deserialize, Serialize};

/// One process's row in the safety table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyRow {
    /// The process.
    pub process: ProcessId,
    /// Units currently held.
    pub allocation: ResourceVector,
    /// Declared maximum demand.
    pub max: ResourceVector,
}

impl SafetyRow {
    /// Builds the row for a live process.
    #[must_use]
    pub fn of(process: &Process) -> Self {
        Self {
            process: process.id(),
            allocation: process.allocation(),
            max: process.max_demand(),
        }
    }

    /// Returns `max - allocation`.
    #[must_use]
    pub fn need(&self) -> ResourceVector {
        self.max.saturating_sub(&self.allocation)
    }
}

/// An immutable allocation state for the safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyState {
    rows: Vec<SafetyRow>,
    total: ResourceVector,
}

impl SafetyState {
    /// Builds a state from explicit rows over the full single-unit inventory.
    #[must_use]
    pub fn from_rows(rows: Vec<SafetyRow>) -> Self {
        Self {
            rows,
            total: ResourceVector::ones(),
        }
    }

    /// Captures the waiting and running processes of the registry.
    #[must_use]
    pub fn capture(registry: &ProcessRegistry) -> Self {
        Self::from_rows(
            registry
                .iter()
                .filter(|p| p.is_contending())
                .map(SafetyRow::of)
                .collect(),
        )
    }

    /// Returns the rows in scan order.
    #[must_use]
    pub fn rows(&self) -> &[SafetyRow] {
        &self.rows
    }

    /// Returns the state after granting `candidate` its first resource.
    ///
    /// The candidate is appended as a process holding its first route
    /// resource and declaring both route resources. Any existing row for the
    /// same ID is replaced in place.
    #[must_use]
    pub fn with_admission(&self, candidate: &Process) -> Self {
        let route = candidate.route();
        let row = SafetyRow {
            process: candidate.id(),
            allocation: ResourceVector::unit(route.first),
            max: candidate.max_demand(),
        };

        let mut next = self.clone();
        match next.rows.iter_mut().find(|r| r.process == row.process) {
            Some(existing) => *existing = row,
            None => next.rows.push(row),
        }
        next
    }

    /// Returns the state after `process` moves onto `requested`.
    ///
    /// The process's allocation becomes the requested resource and its
    /// remaining demand shrinks to it. Unknown IDs leave the state as is.
    #[must_use]
    pub fn with_advance(&self, process: ProcessId, requested: Resource) -> Self {
        let mut next = self.clone();
        if let Some(row) = next.rows.iter_mut().find(|r| r.process == process) {
            row.allocation = ResourceVector::unit(requested);
            row.max = ResourceVector::unit(requested);
        }
        next
    }

    /// Returns `total - Σ allocation`.
    #[must_use]
    pub fn available(&self) -> ResourceVector {
        let allocated = self
            .rows
            .iter()
            .fold(ResourceVector::zero(), |acc, row| acc + row.allocation);
        self.total.saturating_sub(&allocated)
    }

    /// Returns a safe completion order, or `None` if the state is unsafe.
    #[must_use]
    pub fn safe_sequence(&self) -> Option<Vec<ProcessId>> {
        let (sequence, complete) = self.scan();
        complete.then_some(sequence)
    }

    /// Returns true if every process can finish in some order.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.scan().1
    }

    /// Runs the full analysis: verdict, the (possibly partial) sequence and
    /// the matrices.
    #[must_use]
    pub fn evaluate(&self) -> SafetyAnalysis {
        let (sequence, safe) = self.scan();
        SafetyAnalysis {
            safe,
            sequence,
            matrices: self.matrices(),
        }
    }

    /// Returns the allocation, max and need matrices plus availability.
    #[must_use]
    pub fn matrices(&self) -> SafetyMatrices {
        SafetyMatrices {
            processes: self.rows.iter().map(|r| r.process).collect(),
            resources: Resource::ALL.to_vec(),
            allocation: self.rows.iter().map(|r| r.allocation).collect(),
            max: self.rows.iter().map(|r| r.max).collect(),
            need: self.rows.iter().map(SafetyRow::need).collect(),
            available: self.available(),
        }
    }

    /// Returns the finish order reached and whether every row finished.
    fn scan(&self) -> (Vec<ProcessId>, bool) {
        let n = self.rows.len();
        let needs: Vec<ResourceVector> = self.rows.iter().map(SafetyRow::need).collect();
        let mut work = self.available();
        let mut finished = vec![false; n];
        let mut sequence = Vec::with_capacity(n);

        let cap = n * n;
        let mut passes = 0;
        while sequence.len() < n && passes <= cap {
            passes += 1;

            let next = (0..n).find(|&i| !finished[i] && needs[i].fits_within(&work));
            let Some(i) = next else {
                break;
            };
            work += self.rows[i].allocation;
            finished[i] = true;
            sequence.push(self.rows[i].process);
        }

        let complete = sequence.len() == n;
        (sequence, complete)
    }
}

/// The Banker's tables for display.
///
/// Row `i` of each matrix belongs to `processes[i]`; columns follow
/// `resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMatrices {
    /// Row labels.
    pub processes: Vec<ProcessId>,
    /// Column labels.
    pub resources: Vec<Resource>,
    /// Units held.
    pub allocation: Vec<ResourceVector>,
    /// Declared maximum demand.
    pub max: Vec<ResourceVector>,
    /// `max - allocation`.
    pub need: Vec<ResourceVector>,
    /// Free units.
    pub available: ResourceVector,
}

/// Result of a safety analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAnalysis {
    /// Whether a complete safe sequence exists.
    pub safe: bool,
    /// The safe sequence, or the processes that could finish before the
    /// scan got stuck.
    pub sequence: Vec<ProcessId>,
    /// The tables the verdict was computed from.
    pub matrices: SafetyMatrices,
}
