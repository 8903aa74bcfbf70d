//! Cell Definitions
//!
//! What a host knows about a signalling cell before it is placed: declared
//! faces (before rotation) plus role-specific settings. These are serde
//! types so they can be loaded straight from content files.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::aggregate::ConsumerMode;
use super::strength::Strength;
use crate::network::FaceSet;

/// A cell that emits a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerDef {
    pub connection_faces: FaceSet,
    #[serde(default)]
    pub strength: Strength,
}

impl ProducerDef {
    pub fn new(connection_faces: FaceSet, strength: Strength) -> Self {
        Self {
            connection_faces,
            strength,
        }
    }
}

/// A cell that receives signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerDef {
    pub connection_faces: FaceSet,
    #[serde(default = "default_mode")]
    pub mode: ConsumerMode,
}

fn default_mode() -> ConsumerMode {
    ConsumerMode::AtLeastOne
}

impl ConsumerDef {
    pub fn new(connection_faces: FaceSet, mode: ConsumerMode) -> Self {
        Self {
            connection_faces,
            mode,
        }
    }
}

/// One independent path through a conductor cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionGroup {
    pub inputs: FaceSet,
    pub outputs: FaceSet,
}

impl ConnectionGroup {
    pub fn new(inputs: FaceSet, outputs: FaceSet) -> Self {
        Self { inputs, outputs }
    }

    /// A group that conducts both ways on `faces`.
    pub fn bidirectional(faces: FaceSet) -> Self {
        Self::new(faces, faces)
    }
}

/// A cell that relays signals. Each group becomes its own conductor node,
/// so groups sharing a cell never exchange signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductorDef {
    pub groups: SmallVec<[ConnectionGroup; 2]>,
}

impl ConductorDef {
    pub fn new(groups: impl IntoIterator<Item = ConnectionGroup>) -> Self {
        Self {
            groups: groups.into_iter().collect(),
        }
    }

    /// A plain cable connecting on every face.
    pub fn cable() -> Self {
        Self::bidirectional(FaceSet::ALL)
    }

    /// A single two-way group on `faces`.
    pub fn bidirectional(faces: FaceSet) -> Self {
        Self {
            groups: smallvec![ConnectionGroup::bidirectional(faces)],
        }
    }
}
