//! Topology Manager
//!
//! The topology owns every registered node and partitions them into
//! networks: connected components of conductors, plus the leaves touching
//! them. Leaves never relay, so a leaf touching two separate conductor
//! groups is a member of two networks, and two leaves touching each other
//! directly form a network of their own.
//!
//! # Algorithm
//!
//! Every mutation is local:
//!
//! 1. Adding a conductor looks at its six neighbours. No neighbouring
//!    network means a new one; one means the conductor joins it; several
//!    means they merge into the largest.
//! 2. Removing a conductor re-scans reachability, but only across the
//!    conductors of the network it belonged to. One component keeps the
//!    network; more than one dissolves it into fresh networks.
//! 3. Adding or removing a leaf only touches the networks of the adjacent
//!    conductors, plus any direct leaf-to-leaf contacts.
//!
//! Every change is appended to an event queue that the owner drains after
//! the call, instead of invoking listeners in the middle of a mutation.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::face::{Face, FaceSet, Location};
use super::node::{Node, NodeRole};
use crate::host::{AlwaysConnect, ConnectionCondition};

/// Identifier of a network. Never reused within one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(u64);

impl NetworkId {
    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Why the topology changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    /// An explicit edit: a cell was placed, broken or reconfigured.
    WorldChange,
    /// Bulk loading or unloading of a region.
    ChunkEvent,
}

/// A change notification produced by a topology mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyEvent {
    NetworkAdded {
        network: NetworkId,
        reason: ChangeReason,
    },
    /// The network no longer exists. `leaves` lists its former leaf
    /// members, since they can no longer be looked up.
    NetworkRemoved {
        network: NetworkId,
        leaves: Vec<Node>,
        reason: ChangeReason,
    },
    NetworkingNodesAdded {
        network: NetworkId,
        nodes: Vec<Node>,
        reason: ChangeReason,
    },
    NetworkingNodesRemoved {
        network: NetworkId,
        nodes: Vec<Node>,
        reason: ChangeReason,
    },
    LeafNodesAdded {
        network: NetworkId,
        nodes: Vec<Node>,
        reason: ChangeReason,
    },
    LeafNodesRemoved {
        network: NetworkId,
        nodes: Vec<Node>,
        reason: ChangeReason,
    },
}

impl TopologyEvent {
    /// The network the event refers to.
    pub fn network(&self) -> NetworkId {
        match self {
            TopologyEvent::NetworkAdded { network, .. }
            | TopologyEvent::NetworkRemoved { network, .. }
            | TopologyEvent::NetworkingNodesAdded { network, .. }
            | TopologyEvent::NetworkingNodesRemoved { network, .. }
            | TopologyEvent::LeafNodesAdded { network, .. }
            | TopologyEvent::LeafNodesRemoved { network, .. } => *network,
        }
    }

    pub fn reason(&self) -> ChangeReason {
        match self {
            TopologyEvent::NetworkAdded { reason, .. }
            | TopologyEvent::NetworkRemoved { reason, .. }
            | TopologyEvent::NetworkingNodesAdded { reason, .. }
            | TopologyEvent::NetworkingNodesRemoved { reason, .. }
            | TopologyEvent::LeafNodesAdded { reason, .. }
            | TopologyEvent::LeafNodesRemoved { reason, .. } => *reason,
        }
    }
}

/// A maximal connected set of nodes.
#[derive(Debug, Clone)]
pub struct Network {
    id: NetworkId,

    /// Conductors of the component.
    conductors: IndexSet<Node>,

    /// Leaf members, with the faces through which each leaf is wired into
    /// this network.
    leaves: IndexMap<Node, FaceSet>,
}

impl Network {
    fn new(id: NetworkId) -> Self {
        Self {
            id,
            conductors: IndexSet::new(),
            leaves: IndexMap::new(),
        }
    }

    /// Identifier of this network.
    pub fn id(&self) -> NetworkId {
        self.id
    }

    /// Conductors in the order they joined.
    pub fn conductors(&self) -> impl Iterator<Item = &Node> {
        self.conductors.iter()
    }

    /// Every leaf attached to this network.
    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.leaves.keys()
    }

    /// Attached leaves that emit signal.
    pub fn producers(&self) -> impl Iterator<Item = &Node> {
        self.leaves.keys().filter(|leaf| leaf.role() == NodeRole::Producer)
    }

    /// Attached leaves that read signal.
    pub fn consumers(&self) -> impl Iterator<Item = &Node> {
        self.leaves.keys().filter(|leaf| leaf.role() == NodeRole::Consumer)
    }

    /// Whether `leaf` is attached on any face.
    pub fn has_leaf(&self, leaf: &Node) -> bool {
        self.leaves.contains_key(leaf)
    }

    /// Whether `conductor` belongs to this network.
    pub fn has_conductor(&self, conductor: &Node) -> bool {
        self.conductors.contains(conductor)
    }

    /// Faces of `leaf` wired into this network; empty if it is not a member.
    pub fn leaf_faces(&self, leaf: &Node) -> FaceSet {
        self.leaves.get(leaf).copied().unwrap_or_default()
    }

    /// Number of conductors.
    pub fn conductor_count(&self) -> usize {
        self.conductors.len()
    }

    /// Number of attached leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// A network carries signal if it has a conductor, or at least two
    /// leaves in direct contact.
    pub fn is_active(&self) -> bool {
        !self.conductors.is_empty() || self.leaves.len() >= 2
    }

    fn member_count(&self) -> usize {
        self.conductors.len() + self.leaves.len()
    }
}

type Links = SmallVec<[(Face, Node); 6]>;

/// Owner of all registered nodes and of their partition into networks.
pub struct Topology<C = AlwaysConnect> {
    condition: C,

    /// Location-indexed stores. Several nodes can share a cell: conductor
    /// connection groups, or a producer and a consumer of one gate.
    conductors_at: HashMap<Location, SmallVec<[Node; 2]>>,
    leaves_at: HashMap<Location, SmallVec<[Node; 2]>>,

    /// Registered conductors and the network each belongs to.
    conductor_network: HashMap<Node, NetworkId>,

    /// Registered leaves and the networks each is a member of.
    leaf_networks: HashMap<Node, IndexSet<NetworkId>>,

    networks: IndexMap<NetworkId, Network>,
    next_network_id: u64,

    events: Vec<TopologyEvent>,
}

impl Topology<AlwaysConnect> {
    /// Create an empty topology where every face pairing connects.
    pub fn new() -> Self {
        Self::with_condition(AlwaysConnect)
    }
}

impl Default for Topology<AlwaysConnect> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConnectionCondition> Topology<C> {
    /// Create an empty topology consulting `condition` for every edge.
    pub fn with_condition(condition: C) -> Self {
        Self {
            condition,
            conductors_at: HashMap::new(),
            leaves_at: HashMap::new(),
            conductor_network: HashMap::new(),
            leaf_networks: HashMap::new(),
            networks: IndexMap::new(),
            next_network_id: 0,
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Register a conductor. No-op if it is already registered.
    pub fn add_conductor(&mut self, node: Node, reason: ChangeReason) {
        debug_assert_eq!(node.role(), NodeRole::Conductor);
        if self.conductor_network.contains_key(&node) {
            trace!(location = %node.location(), "conductor already registered");
            return;
        }
        self.conductors_at
            .entry(node.location())
            .or_default()
            .push(node);

        let touching: IndexSet<NetworkId> = self
            .linked_conductors(&node)
            .iter()
            .filter_map(|(_, neighbour)| self.conductor_network.get(neighbour).copied())
            .collect();

        let (network_id, created) = match touching.len() {
            0 => (self.allocate_network(), true),
            1 => (touching[0], false),
            _ => (self.merge_networks(touching, reason), false),
        };

        self.conductor_network.insert(node, network_id);
        let joined = self.attach_leaves_of(&node, network_id);
        if let Some(network) = self.networks.get_mut(&network_id) {
            network.conductors.insert(node);
        }

        if created {
            debug!(network = network_id.raw(), location = %node.location(), "network created");
            self.events.push(TopologyEvent::NetworkAdded {
                network: network_id,
                reason,
            });
        } else {
            self.events.push(TopologyEvent::NetworkingNodesAdded {
                network: network_id,
                nodes: vec![node],
                reason,
            });
            if !joined.is_empty() {
                self.events.push(TopologyEvent::LeafNodesAdded {
                    network: network_id,
                    nodes: joined,
                    reason,
                });
            }
        }
    }

    /// Unregister a conductor. No-op if it is not registered.
    pub fn remove_conductor(&mut self, node: Node, reason: ChangeReason) {
        let Some(network_id) = self.conductor_network.remove(&node) else {
            trace!(location = %node.location(), "conductor not registered");
            return;
        };
        remove_from_cell(&mut self.conductors_at, &node);

        let remaining = match self.networks.get_mut(&network_id) {
            Some(network) => {
                network.conductors.shift_remove(&node);
                network.conductors.len()
            }
            None => return,
        };

        if remaining == 0 {
            self.dissolve(network_id, reason);
            return;
        }

        let components = self.components_of(network_id);
        if components.len() == 1 {
            let detached = self.refresh_leaves(network_id);
            self.events.push(TopologyEvent::NetworkingNodesRemoved {
                network: network_id,
                nodes: vec![node],
                reason,
            });
            if !detached.is_empty() {
                self.events.push(TopologyEvent::LeafNodesRemoved {
                    network: network_id,
                    nodes: detached,
                    reason,
                });
            }
        } else {
            debug!(
                network = network_id.raw(),
                parts = components.len(),
                "network split"
            );
            self.dissolve(network_id, reason);
            for component in components {
                self.build_network(component, reason);
            }
        }
    }

    /// Register a producer or consumer. No-op if it is already registered.
    pub fn add_leaf(&mut self, node: Node, reason: ChangeReason) {
        debug_assert!(node.is_leaf());
        if self.leaf_networks.contains_key(&node) {
            trace!(location = %node.location(), "leaf already registered");
            return;
        }
        self.leaves_at.entry(node.location()).or_default().push(node);
        self.leaf_networks.insert(node, IndexSet::new());

        let mut joined: IndexMap<NetworkId, FaceSet> = IndexMap::new();
        for (face, conductor) in self.linked_conductors(&node) {
            if let Some(&network_id) = self.conductor_network.get(&conductor) {
                *joined.entry(network_id).or_default() |= FaceSet::single(face);
            }
        }

        for (network_id, faces) in joined {
            if let Some(network) = self.networks.get_mut(&network_id) {
                network.leaves.insert(node, faces);
            }
            if let Some(memberships) = self.leaf_networks.get_mut(&node) {
                memberships.insert(network_id);
            }
            self.events.push(TopologyEvent::LeafNodesAdded {
                network: network_id,
                nodes: vec![node],
                reason,
            });
        }

        for (face, other) in self.linked_leaves(&node) {
            let network_id = self.allocate_network();
            if let Some(network) = self.networks.get_mut(&network_id) {
                network.leaves.insert(other, FaceSet::single(face.opposite()));
                network.leaves.insert(node, FaceSet::single(face));
            }
            for leaf in [other, node] {
                if let Some(memberships) = self.leaf_networks.get_mut(&leaf) {
                    memberships.insert(network_id);
                }
            }
            debug!(network = network_id.raw(), location = %node.location(), "leaf contact network created");
            self.events.push(TopologyEvent::NetworkAdded {
                network: network_id,
                reason,
            });
        }
    }

    /// Unregister a producer or consumer. No-op if it is not registered.
    pub fn remove_leaf(&mut self, node: Node, reason: ChangeReason) {
        let Some(memberships) = self.leaf_networks.remove(&node) else {
            trace!(location = %node.location(), "leaf not registered");
            return;
        };
        remove_from_cell(&mut self.leaves_at, &node);

        for network_id in memberships {
            let contact_only = match self.networks.get(&network_id) {
                Some(network) => network.conductors.is_empty(),
                None => continue,
            };
            if contact_only {
                // The remaining leaf alone does not carry signal.
                self.dissolve(network_id, reason);
            } else {
                if let Some(network) = self.networks.get_mut(&network_id) {
                    network.leaves.shift_remove(&node);
                }
                self.events.push(TopologyEvent::LeafNodesRemoved {
                    network: network_id,
                    nodes: vec![node],
                    reason,
                });
            }
        }
    }

    pub fn add_conductors<I>(&mut self, nodes: I, reason: ChangeReason)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.add_conductor(node, reason);
        }
    }

    pub fn remove_conductors<I>(&mut self, nodes: I, reason: ChangeReason)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.remove_conductor(node, reason);
        }
    }

    pub fn add_leaves<I>(&mut self, nodes: I, reason: ChangeReason)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.add_leaf(node, reason);
        }
    }

    pub fn remove_leaves<I>(&mut self, nodes: I, reason: ChangeReason)
    where
        I: IntoIterator<Item = Node>,
    {
        for node in nodes {
            self.remove_leaf(node, reason);
        }
    }

    /// Replace a leaf with a reconfigured version of itself.
    pub fn update_leaf(&mut self, old: Node, new: Node, reason: ChangeReason) {
        if old == new {
            return;
        }
        self.remove_leaf(old, reason);
        self.add_leaf(new, reason);
    }

    /// Replace a conductor with a reconfigured version of itself.
    pub fn update_conductor(&mut self, old: Node, new: Node, reason: ChangeReason) {
        if old == new {
            return;
        }
        self.remove_conductor(old, reason);
        self.add_conductor(new, reason);
    }

    /// Take every event recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<TopologyEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// All live networks.
    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    /// Look up a network by id.
    pub fn network(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(&id)
    }

    /// Number of live networks.
    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// Whether `id` still exists and carries signal.
    pub fn is_network_active(&self, id: NetworkId) -> bool {
        self.networks.get(&id).is_some_and(Network::is_active)
    }

    /// Whether `node` is registered as a leaf.
    pub fn contains_leaf(&self, node: &Node) -> bool {
        self.leaf_networks.contains_key(node)
    }

    /// Whether `node` is registered as a conductor.
    pub fn contains_conductor(&self, node: &Node) -> bool {
        self.conductor_network.contains_key(node)
    }

    /// Leaves registered at `location`.
    pub fn leaf_nodes_at(&self, location: Location) -> &[Node] {
        self.leaves_at
            .get(&location)
            .map(|nodes| nodes.as_slice())
            .unwrap_or(&[])
    }

    /// Conductors registered at `location`.
    pub fn conductor_nodes_at(&self, location: Location) -> &[Node] {
        self.conductors_at
            .get(&location)
            .map(|nodes| nodes.as_slice())
            .unwrap_or(&[])
    }

    /// Networks that currently contain `leaf`.
    pub fn networks_with_leaf(&self, leaf: &Node) -> impl Iterator<Item = NetworkId> + '_ {
        self.leaf_networks
            .get(leaf)
            .into_iter()
            .flat_map(|memberships| memberships.iter().copied())
    }

    /// Network owning `conductor`, if registered.
    pub fn network_of_conductor(&self, conductor: &Node) -> Option<NetworkId> {
        self.conductor_network.get(conductor).copied()
    }

    // ------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------

    /// Whether `from` connects to `to` across `face`, with both cells
    /// agreeing to the connection.
    pub(crate) fn connects(&self, from: &Node, face: Face, to: &Node) -> bool {
        from.faces_pair_with(face, to)
            && self.condition.connects(from.location(), face, to.location())
            && self
                .condition
                .connects(to.location(), face.opposite(), from.location())
    }

    /// Registered conductors connected to `node`, keyed by the face of `node`.
    pub(crate) fn linked_conductors(&self, node: &Node) -> Links {
        self.linked_in(&self.conductors_at, node)
    }

    /// Registered leaves connected to `node`, keyed by the face of `node`.
    pub(crate) fn linked_leaves(&self, node: &Node) -> Links {
        self.linked_in(&self.leaves_at, node)
    }

    fn linked_in(&self, cells: &HashMap<Location, SmallVec<[Node; 2]>>, node: &Node) -> Links {
        let mut links = Links::new();
        for face in node.connecting_faces().iter() {
            let Some(neighbours) = cells.get(&node.location().offset(face)) else {
                continue;
            };
            for neighbour in neighbours {
                if self.connects(node, face, neighbour) {
                    links.push((face, *neighbour));
                }
            }
        }
        links
    }

    // ------------------------------------------------------------------
    // Network bookkeeping
    // ------------------------------------------------------------------

    fn allocate_network(&mut self) -> NetworkId {
        let id = NetworkId(self.next_network_id);
        self.next_network_id += 1;
        self.networks.insert(id, Network::new(id));
        id
    }

    /// Add the leaves touching `conductor` to `network_id`. Returns the
    /// leaves that were not members before.
    fn attach_leaves_of(&mut self, conductor: &Node, network_id: NetworkId) -> Vec<Node> {
        let mut joined = Vec::new();
        let links = self.linked_leaves(conductor);
        let Some(network) = self.networks.get_mut(&network_id) else {
            return joined;
        };
        for (face, leaf) in links {
            let faces = network.leaves.entry(leaf).or_default();
            if faces.is_empty() {
                joined.push(leaf);
            }
            faces.insert(face.opposite());
            if let Some(memberships) = self.leaf_networks.get_mut(&leaf) {
                memberships.insert(network_id);
            }
        }
        joined
    }

    /// Fold every network in `ids` into the largest of them.
    fn merge_networks(&mut self, ids: IndexSet<NetworkId>, reason: ChangeReason) -> NetworkId {
        let survivor = ids
            .iter()
            .copied()
            .max_by_key(|id| {
                let size = self.networks.get(id).map_or(0, Network::member_count);
                // Prefer the oldest network on ties.
                (size, std::cmp::Reverse(id.raw()))
            })
            .unwrap_or(ids[0]);

        let mut moved_conductors = Vec::new();
        let mut joined_leaves = Vec::new();

        for absorbed_id in ids.iter().copied().filter(|id| *id != survivor) {
            let Some(absorbed) = self.networks.shift_remove(&absorbed_id) else {
                continue;
            };
            self.events.push(TopologyEvent::NetworkRemoved {
                network: absorbed_id,
                leaves: absorbed.leaves.keys().copied().collect(),
                reason,
            });

            let Some(target) = self.networks.get_mut(&survivor) else {
                continue;
            };
            for conductor in absorbed.conductors {
                self.conductor_network.insert(conductor, survivor);
                target.conductors.insert(conductor);
                moved_conductors.push(conductor);
            }
            for (leaf, faces) in absorbed.leaves {
                let existing = target.leaves.entry(leaf).or_default();
                if existing.is_empty() {
                    joined_leaves.push(leaf);
                }
                *existing |= faces;
                if let Some(memberships) = self.leaf_networks.get_mut(&leaf) {
                    memberships.shift_remove(&absorbed_id);
                    memberships.insert(survivor);
                }
            }
        }

        debug!(
            network = survivor.raw(),
            absorbed = ids.len() - 1,
            "networks merged"
        );
        if !moved_conductors.is_empty() {
            self.events.push(TopologyEvent::NetworkingNodesAdded {
                network: survivor,
                nodes: moved_conductors,
                reason,
            });
        }
        if !joined_leaves.is_empty() {
            self.events.push(TopologyEvent::LeafNodesAdded {
                network: survivor,
                nodes: joined_leaves,
                reason,
            });
        }
        survivor
    }

    /// Connected components of the conductors currently in `network_id`.
    fn components_of(&self, network_id: NetworkId) -> Vec<IndexSet<Node>> {
        let Some(network) = self.networks.get(&network_id) else {
            return Vec::new();
        };
        let mut components = Vec::new();
        let mut seen: IndexSet<Node> = IndexSet::new();

        for start in network.conductors.iter() {
            if seen.contains(start) {
                continue;
            }
            let mut component = IndexSet::new();
            let mut stack = vec![*start];
            seen.insert(*start);
            while let Some(current) = stack.pop() {
                component.insert(current);
                for (_, neighbour) in self.linked_conductors(&current) {
                    if network.conductors.contains(&neighbour) && seen.insert(neighbour) {
                        stack.push(neighbour);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Leaf membership derived from a set of conductors.
    fn leaves_touching(&self, conductors: &IndexSet<Node>) -> IndexMap<Node, FaceSet> {
        let mut leaves: IndexMap<Node, FaceSet> = IndexMap::new();
        for conductor in conductors {
            for (face, leaf) in self.linked_leaves(conductor) {
                leaves.entry(leaf).or_default().insert(face.opposite());
            }
        }
        leaves
    }

    /// Recompute the leaf members of a network after it lost a conductor.
    /// Returns the leaves that are no longer members.
    fn refresh_leaves(&mut self, network_id: NetworkId) -> Vec<Node> {
        let Some(network) = self.networks.get(&network_id) else {
            return Vec::new();
        };
        let fresh = self.leaves_touching(&network.conductors);
        let detached: Vec<Node> = network
            .leaves
            .keys()
            .filter(|leaf| !fresh.contains_key(*leaf))
            .copied()
            .collect();

        for leaf in &detached {
            if let Some(memberships) = self.leaf_networks.get_mut(leaf) {
                memberships.shift_remove(&network_id);
            }
        }
        if let Some(network) = self.networks.get_mut(&network_id) {
            network.leaves = fresh;
        }
        detached
    }

    /// Create a network from a connected set of conductors.
    fn build_network(&mut self, conductors: IndexSet<Node>, reason: ChangeReason) -> NetworkId {
        let network_id = self.allocate_network();
        let leaves = self.leaves_touching(&conductors);

        for conductor in &conductors {
            self.conductor_network.insert(*conductor, network_id);
        }
        for leaf in leaves.keys() {
            if let Some(memberships) = self.leaf_networks.get_mut(leaf) {
                memberships.insert(network_id);
            }
        }
        if let Some(network) = self.networks.get_mut(&network_id) {
            network.conductors = conductors;
            network.leaves = leaves;
        }

        debug!(network = network_id.raw(), "network created");
        self.events.push(TopologyEvent::NetworkAdded {
            network: network_id,
            reason,
        });
        network_id
    }

    /// Drop a network, detaching its leaves.
    fn dissolve(&mut self, network_id: NetworkId, reason: ChangeReason) {
        let Some(network) = self.networks.shift_remove(&network_id) else {
            return;
        };
        for leaf in network.leaves.keys() {
            if let Some(memberships) = self.leaf_networks.get_mut(leaf) {
                memberships.shift_remove(&network_id);
            }
        }
        debug!(network = network_id.raw(), "network removed");
        self.events.push(TopologyEvent::NetworkRemoved {
            network: network_id,
            leaves: network.leaves.into_keys().collect(),
            reason,
        });
    }
}

fn remove_from_cell(cells: &mut HashMap<Location, SmallVec<[Node; 2]>>, node: &Node) {
    if let Some(nodes) = cells.get_mut(&node.location()) {
        nodes.retain(|existing| existing != node);
        if nodes.is_empty() {
            cells.remove(&node.location());
        }
    }
}
