//! Signalling Core
//!
//! This crate provides the engine behind redstone-like signal networks laid
//! out on a 3-D grid of cells. It implements:
//!
//! - Incremental maintenance of connected networks as cells come and go
//! - Face-aware distance queries inside a network
//! - Distance-attenuated signal propagation with dirty tracking
//! - Consumer aggregation modes (OR, AND, XOR and raw per-face strengths)
//! - Gate and interactive producer behaviours
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `network`: Node model, topology manager and distance oracle
//! - `signal`: Strengths, aggregation, dirty tracking and the `SignalSystem`
//! - `gate`: Logic gates, timed gates, latches and producer devices
//! - `host`: Traits through which the engine consults the host world
//! - `config`, `error`: Engine configuration and the crate error type
//!
//! # Example
//!
//! ```rust
//! use signalling_core::{
//!     ConductorDef, ConsumerDef, ConsumerMode, FaceSet, Location, NullSink, ProducerDef,
//!     SignalConfig, SignalSystem, Strength,
//! };
//!
//! let mut system = SignalSystem::new(SignalConfig::default());
//! let at = |x| Location::new(x, 0, 0);
//!
//! system.place_producer(at(0), &ProducerDef::new(FaceSet::ALL, Strength::Finite(3)));
//! system.place_conductor(at(1), &ConductorDef::cable());
//! system.place_conductor(at(2), &ConductorDef::cable());
//! system.place_consumer(at(3), &ConsumerDef::new(FaceSet::ALL, ConsumerMode::AtLeastOne));
//!
//! system.tick(0, &mut NullSink);
//! assert!(system.consumer_output(at(3)).unwrap().has_signal());
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod host;
pub mod network;
pub mod signal;

pub use config::SignalConfig;
pub use error::{Result, SignalError};
pub use gate::{GateAction, GateController, GateDef, GateKind, ProducerDevice};
pub use host::{
    AlwaysConnect, ConnectionCondition, Grid, NullSink, OutputChange, OutputSink, UnrotatedGrid,
};
pub use network::{
    ChangeReason, Face, FaceSet, Location, Network, NetworkId, Node, NodeRole, Topology,
    TopologyEvent,
};
pub use signal::{
    ConductorDef, ConnectionGroup, ConsumerDef, ConsumerMode, ConsumerOutput, NetworkSignals,
    ProducerDef, SignalSystem, Strength, TickReport,
};
