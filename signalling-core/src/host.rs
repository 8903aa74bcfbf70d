//! Host Collaborators
//!
//! The engine does not own the world. It asks the host three narrow
//! questions (how are a cell's declared faces oriented, is the cell loaded,
//! do two cells agree to connect) and tells it one thing: a consumer's
//! visible result changed.

use crate::network::{Face, FaceSet, Location, Node};
use crate::signal::ConsumerOutput;

/// Read access to the grid the network lives in.
pub trait Grid {
    /// Map faces declared in a cell's definition to world faces, applying
    /// whatever rotation the cell was placed with.
    fn resolve_faces(&self, location: Location, declared: FaceSet) -> FaceSet;

    /// Whether the cell is loaded and should take part in the network.
    fn is_relevant(&self, _location: Location) -> bool {
        true
    }
}

/// A grid where no cell is rotated.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrotatedGrid;

impl Grid for UnrotatedGrid {
    fn resolve_faces(&self, _location: Location, declared: FaceSet) -> FaceSet {
        declared
    }
}

/// Per-pair predicate supplied by content definitions.
///
/// Consulted in both directions before the topology accepts an edge, so
/// either cell can veto the connection.
pub trait ConnectionCondition {
    fn connects(&self, from: Location, face: Face, to: Location) -> bool;
}

/// Accepts every face pairing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConnect;

impl ConnectionCondition for AlwaysConnect {
    fn connects(&self, _from: Location, _face: Face, _to: Location) -> bool {
        true
    }
}

impl<F> ConnectionCondition for F
where
    F: Fn(Location, Face, Location) -> bool,
{
    fn connects(&self, from: Location, face: Face, to: Location) -> bool {
        self(from, face, to)
    }
}

/// A consumer result that differs from the previously written one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChange {
    pub consumer: Node,
    pub output: ConsumerOutput,
}

/// Destination for consumer results.
///
/// Only called when a result actually changed.
pub trait OutputSink {
    fn write(&mut self, consumer: &Node, output: &ConsumerOutput);
}

impl OutputSink for Vec<OutputChange> {
    fn write(&mut self, consumer: &Node, output: &ConsumerOutput) {
        self.push(OutputChange {
            consumer: *consumer,
            output: output.clone(),
        });
    }
}

impl<F> OutputSink for F
where
    F: FnMut(&Node, &ConsumerOutput),
{
    fn write(&mut self, consumer: &Node, output: &ConsumerOutput) {
        self(consumer, output)
    }
}

/// Discards every write. Results stay readable through the system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _consumer: &Node, _output: &ConsumerOutput) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_condition() {
        let only_horizontal = |_: Location, face: Face, _: Location| {
            !matches!(face, Face::Top | Face::Bottom)
        };
        let origin = Location::new(0, 0, 0);
        assert!(only_horizontal.connects(origin, Face::Left, origin.offset(Face::Left)));
        assert!(!only_horizontal.connects(origin, Face::Top, origin.offset(Face::Top)));
    }

    #[test]
    fn vec_sink_records_writes() {
        let consumer = Node::consumer(Location::new(0, 0, 0), FaceSet::ALL);
        let mut sink: Vec<OutputChange> = Vec::new();
        sink.write(&consumer, &ConsumerOutput::Simple(true));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].output, ConsumerOutput::Simple(true));
    }

    #[test]
    fn unrotated_grid_is_identity() {
        let faces = FaceSet::of(&[Face::Left, Face::Top]);
        assert_eq!(UnrotatedGrid.resolve_faces(Location::new(1, 2, 3), faces), faces);
        assert!(UnrotatedGrid.is_relevant(Location::new(1, 2, 3)));
    }
}
