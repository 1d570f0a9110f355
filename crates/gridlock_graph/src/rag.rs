//! Resource allocation graph snapshots.
//!
//! A [`GraphSnapshot`] is the read-only view a renderer consumes: process
//! and resource vertices plus allocation edges (resource → holder) and
//! request edges (process → requested resource).

use core::fmt;

use gridlock_model::{Direction, ProcessId, ProcessRegistry, ProcessState, Resource};
use serde::{Deserialize, Serialize};

/// A vertex label in the allocation graph.
///
/// Cycle traces alternate process and resource labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// A process vertex.
    Process(ProcessId),
    /// A resource vertex.
    Resource(Resource),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Process(id) => write!(f, "{id}"),
            Label::Resource(r) => write!(f, "{r}"),
        }
    }
}

impl From<ProcessId> for Label {
    fn from(id: ProcessId) -> Self {
        Label::Process(id)
    }
}

impl From<Resource> for Label {
    fn from(resource: Resource) -> Self {
        Label::Resource(resource)
    }
}

/// A process vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessNode {
    /// The process ID.
    pub id: ProcessId,
    /// The approach direction, if any.
    pub direction: Option<Direction>,
    /// The lifecycle state.
    pub state: ProcessState,
    /// The held resource, if any.
    pub held: Option<Resource>,
    /// The requested resource, if any.
    pub requested: Option<Resource>,
}

/// A resource vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// The resource.
    pub resource: Resource,
    /// The current holder, if any.
    pub holder: Option<ProcessId>,
}

/// Allocation edge: `resource → holder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEdge {
    /// The held resource.
    pub resource: Resource,
    /// The holding process.
    pub holder: ProcessId,
}

/// Request edge: `process → resource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEdge {
    /// The requesting process.
    pub process: ProcessId,
    /// The requested resource.
    pub resource: Resource,
}

/// Read-only view of the allocation graph at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Every live process, in insertion order.
    pub processes: Vec<ProcessNode>,
    /// Every resource, in rank order.
    pub resources: Vec<ResourceNode>,
    /// Resource → holder edges.
    pub allocation_edges: Vec<AllocationEdge>,
    /// Process → requested resource edges.
    pub request_edges: Vec<RequestEdge>,
}

impl GraphSnapshot {
    /// Captures the allocation graph from the registry.
    #[must_use]
    pub fn capture(registry: &ProcessRegistry) -> Self {
        let processes = registry
            .iter()
            .map(|p| ProcessNode {
                id: p.id(),
                direction: p.direction(),
                state: p.state(),
                held: p.held(),
                requested: p.requested(),
            })
            .collect();

        let resources = Resource::ALL
            .into_iter()
            .map(|resource| ResourceNode {
                resource,
                holder: registry.owner(resource),
            })
            .collect();

        let allocation_edges = registry
            .held_resources()
            .map(|(resource, holder)| AllocationEdge { resource, holder })
            .collect();

        let request_edges = registry
            .iter()
            .filter_map(|p| {
                p.requested().map(|resource| RequestEdge {
                    process: p.id(),
                    resource,
                })
            })
            .collect();

        Self {
            processes,
            resources,
            allocation_edges,
            request_edges,
        }
    }

    /// Returns true if the snapshot has no processes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_lists_edges_for_waiting_process() {
        let mut registry = ProcessRegistry::new();
        let id = registry.spawn(Direction::East.route(), Some(Direction::East));
        registry.begin_waiting(id).unwrap();

        let snapshot = GraphSnapshot::capture(&registry);

        assert_eq!(snapshot.processes.len(), 1);
        assert_eq!(snapshot.resources.len(), Resource::COUNT);
        assert_eq!(
            snapshot.allocation_edges,
            vec![AllocationEdge {
                resource: Resource::East,
                holder: id,
            }]
        );
        assert_eq!(
            snapshot.request_edges,
            vec![RequestEdge {
                process: id,
                resource: Resource::South,
            }]
        );
    }

    #[test]
    fn label_serializes_untagged() {
        let labels = vec![
            Label::Process(ProcessId::new(1)),
            Label::Resource(Resource::West),
        ];
        let json = serde_json::to_string(&labels).unwrap();
        assert_eq!(json, r#"["P1","R_West"]"#);
        assert_eq!(serde_json::from_str::<Vec<Label>>(&json).unwrap(), labels);
    }
}
