//! Wait-for graph and cycle detection.
//!
//! Process *A* waits for process *B* iff *A* requests a resource held by *B*.
//! Each process requests at most one resource and each resource has at most
//! one holder, so every process has out-degree ≤ 1: the wait-for graph is a
//! functional graph. Detection walks successor chains until it reaches a
//! dead end, a process finished by an earlier walk, or a process already on
//! the current walk (a cycle). No process is walked twice, so a full scan is
//! O(P).
//!
//! Traversal is iterative over index-addressed marks sized to the registry;
//! there is no recursion and no shared state between scans.

use gridlock_model::{ProcessId, ProcessRegistry, ProcessState, Resource};
use hashbrown::HashMap;

use crate::rag::Label;

/// Traversal mark for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// The wait-for projection of the allocation graph.
///
/// Built from a registry snapshot; holds no references into it.
#[derive(Debug, Clone)]
pub struct WaitForGraph {
    /// Process ID by registry index.
    ids: Vec<ProcessId>,
    /// Requested resource by registry index (waiting processes only).
    requests: Vec<Option<Resource>>,
    /// Registry index of each resource's holder, among waiting/running processes.
    owners: [Option<usize>; Resource::COUNT],
    /// Registry indices of waiting processes, in insertion order.
    waiting: Vec<usize>,
    /// Registry index by process ID.
    index: HashMap<ProcessId, usize>,
}

impl WaitForGraph {
    /// Builds the wait-for graph from the registry.
    #[must_use]
    pub fn build(registry: &ProcessRegistry) -> Self {
        let len = registry.len();
        let mut ids = Vec::with_capacity(len);
        let mut requests = Vec::with_capacity(len);
        let mut owners = [None; Resource::COUNT];
        let mut waiting = Vec::new();
        let mut index = HashMap::with_capacity(len);

        for (i, process) in registry.iter().enumerate() {
            ids.push(process.id());
            index.insert(process.id(), i);

            if process.is_contending()
                && let Some(held) = process.held()
            {
                owners[held.index()] = Some(i);
            }

            if process.state() == ProcessState::Waiting {
                waiting.push(i);
                requests.push(process.requested());
            } else {
                requests.push(None);
            }
        }

        Self {
            ids,
            requests,
            owners,
            waiting,
            index,
        }
    }

    /// Returns the process `id` waits for, if any.
    #[must_use]
    pub fn waits_for(&self, id: ProcessId) -> Option<ProcessId> {
        let i = *self.index.get(&id)?;
        self.successor(i).map(|next| self.ids[next])
    }

    /// Iterates every wait-for edge `(waiter, holder)`.
    pub fn edges(&self) -> impl Iterator<Item = (ProcessId, ProcessId)> + '_ {
        self.waiting
            .iter()
            .filter_map(|&i| self.successor(i).map(|next| (self.ids[i], self.ids[next])))
    }

    /// Returns true if the wait-for graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        !self.scan(true).is_empty()
    }

    /// Returns every process that lies on a cycle, in insertion order.
    #[must_use]
    pub fn deadlocked_processes(&self) -> Vec<ProcessId> {
        let mut members: Vec<usize> = self.scan(false).into_iter().flatten().collect();
        members.sort_unstable();
        members.into_iter().map(|i| self.ids[i]).collect()
    }

    /// Reconstructs one cycle as an alternating label sequence
    /// `P1 → R1 → P2 → R2 → … → P1`, or returns an empty vector.
    ///
    /// Each waiting process is tried as a starting point in insertion order
    /// with a fresh trace, since the same edges can be reached from several
    /// entry points. A lead-in path that runs into a cycle is trimmed so the
    /// result starts and ends on the same process.
    #[must_use]
    pub fn find_cycle(&self) -> Vec<Label> {
        if self.waiting.len() < 2 {
            return Vec::new();
        }

        let mut seen_at: Vec<Option<usize>> = vec![None; self.ids.len()];
        let mut trace: Vec<usize> = Vec::new();

        for &start in &self.waiting {
            seen_at.fill(None);
            trace.clear();

            let mut current = start;
            loop {
                if let Some(pos) = seen_at[current] {
                    return self.ring_labels(&trace[pos..]);
                }
                seen_at[current] = Some(trace.len());
                trace.push(current);

                match self.successor(current) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }

        Vec::new()
    }

    fn successor(&self, i: usize) -> Option<usize> {
        let resource = self.requests[i]?;
        self.owners[resource.index()]
    }

    /// Walks successor chains from every unvisited waiting process and
    /// returns the cycles found, as registry indices.
    fn scan(&self, stop_at_first: bool) -> Vec<Vec<usize>> {
        let mut cycles = Vec::new();
        if self.waiting.len() < 2 {
            return cycles;
        }

        let mut marks = vec![Mark::Unvisited; self.ids.len()];
        let mut path: Vec<usize> = Vec::new();

        for &start in &self.waiting {
            if marks[start] != Mark::Unvisited {
                continue;
            }

            path.clear();
            let mut current = start;
            loop {
                marks[current] = Mark::OnStack;
                path.push(current);

                let Some(next) = self.successor(current) else {
                    break;
                };
                match marks[next] {
                    Mark::Unvisited => current = next,
                    Mark::Done => break,
                    Mark::OnStack => {
                        if let Some(pos) = path.iter().position(|&i| i == next) {
                            cycles.push(path[pos..].to_vec());
                        }
                        break;
                    }
                }
            }

            if stop_at_first && !cycles.is_empty() {
                return cycles;
            }
            for &i in &path {
                marks[i] = Mark::Done;
            }
        }

        cycles
    }

    fn ring_labels(&self, ring: &[usize]) -> Vec<Label> {
        let mut labels = Vec::with_capacity(ring.len() * 2 + 1);
        for &i in ring {
            labels.push(Label::Process(self.ids[i]));
            if let Some(resource) = self.requests[i] {
                labels.push(Label::Resource(resource));
            }
        }
        if let Some(&first) = ring.first() {
            labels.push(Label::Process(self.ids[first]));
        }
        labels
    }
}
