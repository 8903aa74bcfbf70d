//! Network Topology
//!
//! This module maintains the partition of registered cells into signal
//! networks, and answers distance queries inside a network.
//!
//! # Overview
//!
//! The grid is an undirected graph where:
//!
//! - Nodes are producers, consumers (leaves) and conductors
//! - Edges join two nodes in adjacent cells whose facing sides pair up:
//!   an output face against an input face
//!
//! A network is a connected component of conductors together with the
//! leaves touching it. Leaves do not relay, so they never join two
//! components together.
//!
//! # Design Decisions
//!
//! 1. Nodes live in location-indexed stores owned by the `Topology`, not in
//!    process-wide registries, so independent topologies can coexist.
//!
//! 2. Network identity is a counter that is never reused. A split or merge
//!    retires the old ids, which makes stale caches easy to detect.
//!
//! 3. Mutations record `TopologyEvent`s in a queue instead of calling
//!    listeners, so nothing re-enters the topology mid-update.

mod distance;
mod face;
mod node;
mod topology;

pub use face::{Face, FaceSet, Location};
pub use node::{Node, NodeRole};
pub use topology::{ChangeReason, Network, NetworkId, Topology, TopologyEvent};
