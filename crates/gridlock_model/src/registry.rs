//! The process registry and resource ownership table.
//!
//! [`ProcessRegistry`] is the only place that mutates held and requested
//! resources. It keeps processes in insertion order (the scan order of the
//! safety check) and a per-resource owner table that enforces mutual
//! exclusion on every acquisition.

use core::slice;

use crate::process::{Process, ProcessId, ProcessState};
use crate::resource::{Direction, Resource, Route};
use crate::vector::ResourceVector;

/// Errors raised by registry mutations.
///
/// These indicate a caller bug (stale ID, wrong lifecycle state) or an
/// attempted violation of mutual exclusion. Policy denials are not
/// registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No process with this ID is registered.
    #[error("process {0} is not registered")]
    UnknownProcess(ProcessId),

    /// The resource is already held by another process.
    #[error("{resource} is already held by {holder}")]
    ResourceBusy {
        /// The contended resource.
        resource: Resource,
        /// The current holder.
        holder: ProcessId,
    },

    /// The process is not in the state the mutation requires.
    #[error("process {process} is {actual}, expected {expected}")]
    InvalidState {
        /// The process.
        process: ProcessId,
        /// Its current state.
        actual: ProcessState,
        /// The state the mutation requires.
        expected: ProcessState,
    },

    /// A waiting process has no outstanding request.
    #[error("process {0} has no outstanding request")]
    NothingRequested(ProcessId),

    /// The ownership table disagrees with the processes' held resources.
    #[error("ownership table is inconsistent for {0}")]
    OwnershipMismatch(Resource),
}

/// Registry of live processes plus the resource owner table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRegistry {
    /// Live processes in insertion order.
    processes: Vec<Process>,
    /// `owners[r.index()]` is the holder of `r`.
    owners: [Option<ProcessId>; Resource::COUNT],
    /// Next ID to hand out.
    next_id: u64,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self {
            processes: Vec::new(),
            owners: [None; Resource::COUNT],
            next_id: 1,
        }
    }
}

impl ProcessRegistry {
    /// Creates an empty registry. The first process gets ID `P1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the number of live processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Returns true if no process is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Iterates live processes in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, Process> {
        self.processes.iter()
    }

    /// Returns live processes in insertion order.
    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Gets a process by ID.
    #[must_use]
    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == id)
    }

    /// Returns the insertion index of a process.
    #[must_use]
    pub fn position(&self, id: ProcessId) -> Option<usize> {
        self.processes.iter().position(|p| p.id == id)
    }

    /// Returns true if the process is live.
    #[must_use]
    pub fn contains(&self, id: ProcessId) -> bool {
        self.position(id).is_some()
    }

    /// Returns true if the ID was issued by this registry but the process
    /// has since been removed.
    #[must_use]
    pub fn is_retired(&self, id: ProcessId) -> bool {
        id.0 >= 1 && id.0 < self.next_id && !self.contains(id)
    }

    /// Returns the current holder of `resource`.
    #[must_use]
    pub fn owner(&self, resource: Resource) -> Option<ProcessId> {
        self.owners[resource.index()]
    }

    /// Returns true if nobody holds `resource`.
    #[must_use]
    pub fn is_free(&self, resource: Resource) -> bool {
        self.owner(resource).is_none()
    }

    /// Iterates `(resource, holder)` for every held resource, in rank order.
    pub fn held_resources(&self) -> impl Iterator<Item = (Resource, ProcessId)> + '_ {
        Resource::ALL
            .into_iter()
            .filter_map(|r| self.owner(r).map(|holder| (r, holder)))
    }

    /// Returns the vector of units currently free.
    #[must_use]
    pub fn available(&self) -> ResourceVector {
        let mut available = ResourceVector::ones();
        for (resource, _) in self.held_resources() {
            available.set(resource, 0);
        }
        available
    }

    /// Iterates processes in the given state, in insertion order.
    pub fn in_state(&self, state: ProcessState) -> impl Iterator<Item = &Process> + '_ {
        self.processes.iter().filter(move |p| p.state == state)
    }

    /// Returns the ID the next spawned process will receive.
    #[must_use]
    pub fn peek_next_id(&self) -> ProcessId {
        ProcessId(self.next_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a new `Approaching` process and returns its ID.
    ///
    /// The caller is responsible for rejecting malformed routes first.
    pub fn spawn(&mut self, route: Route, direction: Option<Direction>) -> ProcessId {
        let id = ProcessId(self.next_id);
        self.next_id += 1;

        let mut process = Process::new(id, route);
        process.direction = direction;
        self.processes.push(process);
        id
    }

    /// Grants the first route resource: `Approaching -> Waiting`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownProcess`] if `id` is not live
    /// - [`RegistryError::InvalidState`] unless the process is `Approaching`
    /// - [`RegistryError::ResourceBusy`] if the first resource is held
    pub fn begin_waiting(&mut self, id: ProcessId) -> Result<(), RegistryError> {
        let index = self.expect_state(id, ProcessState::Approaching)?;
        let route = self.processes[index].route;
        if let Some(holder) = self.owner(route.first) {
            return Err(RegistryError::ResourceBusy {
                resource: route.first,
                holder,
            });
        }

        self.acquire(index, route.first)?;

        let process = &mut self.processes[index];
        process.requested = Some(route.second);
        process.state = ProcessState::Waiting;
        Ok(())
    }

    /// Hands the process over to its requested resource:
    /// `Waiting -> Running`.
    ///
    /// The first resource is released and the requested one acquired. The
    /// first resource is retired from the declared demand.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownProcess`] if `id` is not live
    /// - [`RegistryError::InvalidState`] unless the process is `Waiting`
    /// - [`RegistryError::ResourceBusy`] if the requested resource is held
    pub fn transfer(&mut self, id: ProcessId) -> Result<(), RegistryError> {
        let index = self.expect_state(id, ProcessState::Waiting)?;
        let Some(next) = self.processes[index].requested else {
            return Err(RegistryError::NothingRequested(id));
        };
        if let Some(holder) = self.owner(next) {
            return Err(RegistryError::ResourceBusy {
                resource: next,
                holder,
            });
        }

        self.release(index);
        self.acquire(index, next)?;

        let process = &mut self.processes[index];
        process.requested = None;
        process.state = ProcessState::Running;
        process.max_demand = ResourceVector::unit(next);
        Ok(())
    }

    /// Removes a process at any lifecycle stage, releasing what it holds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProcess`] if `id` is not live.
    pub fn remove(&mut self, id: ProcessId) -> Result<Process, RegistryError> {
        let index = self
            .position(id)
            .ok_or(RegistryError::UnknownProcess(id))?;
        self.release(index);
        let mut process = self.processes.remove(index);
        process.requested = None;
        Ok(process)
    }

    /// Removes every process and restarts ID assignment at `P1`.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Verifies that the owner table matches the processes' held resources,
    /// that no resource has two holders and that no process requests what it
    /// holds.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::OwnershipMismatch`] naming the first
    /// inconsistent resource.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        for resource in Resource::ALL {
            let mut holders = self
                .processes
                .iter()
                .filter(|p| p.held == Some(resource))
                .map(|p| p.id);
            let first = holders.next();
            if holders.next().is_some() || first != self.owner(resource) {
                return Err(RegistryError::OwnershipMismatch(resource));
            }
        }
        for process in &self.processes {
            if let Some(resource) = process.held
                && process.requested == Some(resource)
            {
                return Err(RegistryError::OwnershipMismatch(resource));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn expect_state(
        &self,
        id: ProcessId,
        expected: ProcessState,
    ) -> Result<usize, RegistryError> {
        let index = self
            .position(id)
            .ok_or(RegistryError::UnknownProcess(id))?;
        let actual = self.processes[index].state;
        if actual != expected {
            return Err(RegistryError::InvalidState {
                process: id,
                actual,
                expected,
            });
        }
        Ok(index)
    }

    /// Single choke point for ownership changes.
    fn acquire(&mut self, index: usize, resource: Resource) -> Result<(), RegistryError> {
        let id = self.processes[index].id;
        let slot = &mut self.owners[resource.index()];
        if let Some(holder) = *slot {
            debug_assert!(
                holder == id,
                "mutual exclusion violated: {resource} held by {holder}, acquired by {id}"
            );
            if holder != id {
                return Err(RegistryError::ResourceBusy { resource, holder });
            }
        }
        *slot = Some(id);
        self.processes[index].held = Some(resource);
        Ok(())
    }

    fn release(&mut self, index: usize) {
        let process = &mut self.processes[index];
        if let Some(resource) = process.held.take() {
            let slot = &mut self.owners[resource.index()];
            if *slot == Some(process.id) {
                *slot = None;
            }
        }
    }
}

impl<'a> IntoIterator for &'a ProcessRegistry {
    type Item = &'a Process;
    type IntoIter = slice::Iter<'a, Process>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
