//! Dirty-Set Tracker
//!
//! Collects what must be recomputed on the next pass. Topology events are
//! recorded as they are drained from the topology; producer strength changes
//! are recorded as producers and resolved to networks only when the pass
//! starts, so a producer that moves between networks before the pass still
//! dirties the right ones.

use indexmap::IndexSet;
use tracing::trace;

use crate::host::ConnectionCondition;
use crate::network::{NetworkId, Node, Topology, TopologyEvent};

/// Pending recomputation work.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    networks_to_recalculate: IndexSet<NetworkId>,
    consumers_to_recalculate: IndexSet<Node>,
    modified_producers: IndexSet<Node>,
}

/// Work taken out of the tracker for one pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirtySet {
    pub networks: IndexSet<NetworkId>,
    pub consumers: IndexSet<Node>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a topology event into dirty state.
    pub fn record(&mut self, event: &TopologyEvent) {
        match event {
            TopologyEvent::NetworkAdded { network, .. }
            | TopologyEvent::NetworkingNodesAdded { network, .. }
            | TopologyEvent::NetworkingNodesRemoved { network, .. }
            | TopologyEvent::LeafNodesAdded { network, .. } => {
                self.networks_to_recalculate.insert(*network);
            }
            TopologyEvent::LeafNodesRemoved { network, nodes, .. } => {
                for node in nodes {
                    if node.is_producer() {
                        self.networks_to_recalculate.insert(*network);
                    } else if node.is_consumer() {
                        self.consumers_to_recalculate.insert(*node);
                    }
                }
            }
            TopologyEvent::NetworkRemoved { network, leaves, .. } => {
                self.networks_to_recalculate.shift_remove(network);
                self.consumers_to_recalculate
                    .extend(leaves.iter().filter(|leaf| leaf.is_consumer()).copied());
            }
        }
    }

    pub fn mark_network(&mut self, network: NetworkId) {
        self.networks_to_recalculate.insert(network);
    }

    /// A consumer's faces or mode changed.
    pub fn mark_consumer(&mut self, consumer: Node) {
        self.consumers_to_recalculate.insert(consumer);
    }

    /// A producer's strength changed.
    pub fn mark_producer(&mut self, producer: Node) {
        self.modified_producers.insert(producer);
    }

    /// Whether the next pass would have nothing to do.
    pub fn is_clean(&self) -> bool {
        self.networks_to_recalculate.is_empty()
            && self.consumers_to_recalculate.is_empty()
            && self.modified_producers.is_empty()
    }

    /// Take all pending work, resolving modified producers to the networks
    /// that currently contain them.
    pub fn drain<C: ConnectionCondition>(&mut self, topology: &Topology<C>) -> DirtySet {
        let mut networks = std::mem::take(&mut self.networks_to_recalculate);
        for producer in self.modified_producers.drain(..) {
            networks.extend(topology.networks_with_leaf(&producer));
        }
        networks.retain(|id| topology.network(*id).is_some());
        let consumers = std::mem::take(&mut self.consumers_to_recalculate);
        trace!(
            networks = networks.len(),
            consumers = consumers.len(),
            "drained dirty set"
        );
        DirtySet {
            networks,
            consumers,
        }
    }
}
