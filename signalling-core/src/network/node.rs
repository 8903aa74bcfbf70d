//! Network Nodes
//!
//! This module defines the node values that live in the topology.
//!
//! A node never changes once registered. Reconfiguring a cell means
//! removing the old node and registering a new one, which is why nodes are
//! plain values keyed by their full identity rather than handles.

use serde::{Deserialize, Serialize};

use super::face::{Face, FaceSet, Location};

/// The role a node plays in a signal network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeRole {
    /// Emits a signal. A leaf of the network; output faces only.
    Producer,

    /// Receives signals. A leaf of the network; input faces only.
    Consumer,

    /// Relays signals between its faces. The interior of a network.
    Conductor,
}

/// A registered cell (or one connection group of a cell).
///
/// Identity is the full value: role, location, and both face sets. Two
/// connection groups of one conductor cell are two distinct nodes at the
/// same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    location: Location,
    input_faces: FaceSet,
    output_faces: FaceSet,
    role: NodeRole,
}

impl Node {
    /// Create a producer emitting through `faces`.
    pub fn producer(location: Location, faces: FaceSet) -> Self {
        Self {
            location,
            input_faces: FaceSet::EMPTY,
            output_faces: faces,
            role: NodeRole::Producer,
        }
    }

    /// Create a consumer listening on `faces`.
    pub fn consumer(location: Location, faces: FaceSet) -> Self {
        Self {
            location,
            input_faces: faces,
            output_faces: FaceSet::EMPTY,
            role: NodeRole::Consumer,
        }
    }

    /// Create a conductor for one connection group.
    pub fn conductor(location: Location, inputs: FaceSet, outputs: FaceSet) -> Self {
        Self {
            location,
            input_faces: inputs,
            output_faces: outputs,
            role: NodeRole::Conductor,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn input_faces(&self) -> FaceSet {
        self.input_faces
    }

    pub fn output_faces(&self) -> FaceSet {
        self.output_faces
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Every face this node may connect through, in either direction.
    pub fn connecting_faces(&self) -> FaceSet {
        self.input_faces | self.output_faces
    }

    pub fn is_leaf(&self) -> bool {
        self.role != NodeRole::Conductor
    }

    pub fn is_producer(&self) -> bool {
        self.role == NodeRole::Producer
    }

    pub fn is_consumer(&self) -> bool {
        self.role == NodeRole::Consumer
    }

    /// Whether the faces of `self` and `other` pair up across `face`.
    ///
    /// `other` must sit at `self.location().offset(face)`. A connection needs
    /// an output on one side facing an input on the other.
    pub fn faces_pair_with(&self, face: Face, other: &Node) -> bool {
        if self.location.offset(face) != other.location {
            return false;
        }
        let back = face.opposite();
        (self.output_faces.contains(face) && other.input_faces.contains(back))
            || (self.input_faces.contains(face) && other.output_faces.contains(back))
    }
}
