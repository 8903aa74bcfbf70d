//! Distance Oracle
//!
//! Face-constrained shortest paths inside one network. A search starts at
//! a leaf's face, steps into the conductor touching that face, and walks
//! conductor to conductor, counting one hop per conductor. A leaf found
//! touching a conductor at depth `d` is `d` hops away.
//!
//! The search runs against the flow of signal: from a conductor it only
//! steps to neighbours that output towards it, so a one-way connection
//! group never carries signal out of its input faces.
//!
//! A two-leaf contact network has no conductors; its leaves are one hop
//! apart.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::face::{Face, FaceSet};
use super::node::Node;
use super::topology::{NetworkId, Topology};
use crate::host::ConnectionCondition;

impl<C: ConnectionCondition> Topology<C> {
    /// Which faces of `leaf` are wired into `network`.
    pub fn leaf_faces_in_network(&self, network: NetworkId, leaf: &Node) -> FaceSet {
        self.network(network)
            .map(|network| network.leaf_faces(leaf))
            .unwrap_or_default()
    }

    /// Hop count from `source` to `target`, entering the network through
    /// `face` of `target`.
    ///
    /// Returns `None` when `source` cannot be reached within `budget` hops.
    /// A `None` budget searches the whole network.
    pub fn distance_with_face(
        &self,
        network: NetworkId,
        source: &Node,
        target: &Node,
        face: Face,
        budget: Option<u32>,
    ) -> Option<u32> {
        self.scan_from_face(network, target, face, budget, Some(source))
            .get(source)
            .copied()
    }

    /// Minimum hop count to every leaf whose signal reaches `face` of
    /// `target` within `budget`.
    pub fn leaf_distances_with_face(
        &self,
        network: NetworkId,
        target: &Node,
        face: Face,
        budget: Option<u32>,
    ) -> IndexMap<Node, u32> {
        self.scan_from_face(network, target, face, budget, None)
    }

    fn scan_from_face(
        &self,
        network_id: NetworkId,
        target: &Node,
        face: Face,
        budget: Option<u32>,
        stop_at: Option<&Node>,
    ) -> IndexMap<Node, u32> {
        let mut found = IndexMap::new();
        let Some(network) = self.network(network_id) else {
            return found;
        };
        if !network.leaf_faces(target).contains(face) {
            return found;
        }
        let within = |depth: u32| budget.map_or(true, |limit| depth <= limit);
        if !within(1) {
            return found;
        }

        let neighbour = target.location().offset(face);
        let inward = face.opposite();

        if network.conductor_count() == 0 {
            for leaf in network.leaves() {
                if leaf != target
                    && leaf.location() == neighbour
                    && self.feeds(leaf, inward, target)
                {
                    found.insert(*leaf, 1);
                }
            }
            return found;
        }

        let mut frontier: Vec<Node> = self
            .conductor_nodes_at(neighbour)
            .iter()
            .filter(|conductor| {
                network.has_conductor(conductor) && self.feeds(conductor, inward, target)
            })
            .copied()
            .collect();
        let mut visited: HashSet<Node> = frontier.iter().copied().collect();
        let mut depth = 1;

        while !frontier.is_empty() && within(depth) {
            let mut next = Vec::new();
            for conductor in &frontier {
                for (side, leaf) in self.linked_leaves(conductor) {
                    if leaf == *target
                        || !network.has_leaf(&leaf)
                        || !self.feeds(&leaf, side.opposite(), conductor)
                    {
                        continue;
                    }
                    found.entry(leaf).or_insert(depth);
                    if stop_at == Some(&leaf) {
                        return found;
                    }
                }
                for (side, upstream) in self.linked_conductors(conductor) {
                    if network.has_conductor(&upstream)
                        && self.feeds(&upstream, side.opposite(), conductor)
                        && visited.insert(upstream)
                    {
                        next.push(upstream);
                    }
                }
            }
            frontier = next;
            depth += 1;
        }
        found
    }

    /// Whether signal leaves `from` through `face` and enters `to`.
    fn feeds(&self, from: &Node, face: Face, to: &Node) -> bool {
        from.output_faces().contains(face)
            && to.input_faces().contains(face.opposite())
            && self.connects(from, face, to)
    }
}
