//! Signal Propagation
//!
//! Strengths, consumer aggregation, dirty tracking and the engine that ties
//! them to the topology.
//!
//! # Overview
//!
//! Producers hold a [`Strength`] in a side table; it is not part of the
//! node, so changing it never touches the topology. Consumers hold a
//! [`ConsumerMode`] and the last [`ConsumerOutput`] reported to the host.
//! The [`SignalSystem`] keeps both in step with the topology, and recomputes
//! consumers only when the [`DirtyTracker`] says their inputs changed.

mod aggregate;
mod component;
mod state;
mod strength;
mod system;

pub use aggregate::{ConsumerMode, ConsumerOutput, NetworkSignals};
pub use component::{ConductorDef, ConnectionGroup, ConsumerDef, ProducerDef};
pub use state::{DirtySet, DirtyTracker};
pub use strength::Strength;
pub use system::{SignalSystem, TickReport};
