//! Signal Propagation Engine
//!
//! # Overview
//!
//! [`SignalSystem`] is what a host talks to. It turns cell lifecycle calls
//! (placed, broken, loaded, unloaded, reconfigured) into topology
//! mutations, remembers producer strengths and consumer results, and once
//! per tick recomputes only what the dirty tracker says changed.
//!
//! # Algorithm
//!
//! A pass runs in three steps:
//!
//! 1. Every dirty network recomputes the signal reaching each of its
//!    consumers.
//! 2. Every dirty consumer recomputes its signal in the networks that step
//!    one did not already cover.
//! 3. Every consumer touched by steps one and two drops cached signals from
//!    networks it has left, folds the rest through its mode, and reports
//!    the result to the host only when it differs from the last one.
//!
//! Within one network the signal on a consumer face is the best attenuated
//! strength among the producers reachable through that face. One unbounded
//! producer lights every connected face without any distance search.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::aggregate::{ConsumerMode, ConsumerOutput, NetworkSignals};
use super::component::{ConductorDef, ConsumerDef, ProducerDef};
use super::state::DirtyTracker;
use super::strength::Strength;
use crate::config::SignalConfig;
use crate::host::{AlwaysConnect, ConnectionCondition, Grid, OutputSink, UnrotatedGrid};
use crate::network::{ChangeReason, Location, NetworkId, Node, Topology};

/// Counters for one recompute pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Dirty networks whose consumers were recomputed.
    pub networks_recalculated: usize,
    /// Consumers whose result was re-aggregated.
    pub consumers_evaluated: usize,
    /// Results handed to the output sink.
    pub outputs_changed: usize,
}

#[derive(Debug, Clone)]
struct ConsumerState {
    mode: ConsumerMode,
    /// Last signal received from each network the consumer belongs to.
    signals: IndexMap<NetworkId, NetworkSignals>,
    /// Last result reported to the host.
    output: ConsumerOutput,
}

impl ConsumerState {
    fn new(mode: ConsumerMode) -> Self {
        Self {
            mode,
            signals: IndexMap::new(),
            output: mode.initial_output(),
        }
    }
}

/// The signalling engine.
///
/// `G` resolves declared faces against the grid, `C` vetoes individual
/// connections. Both default to the permissive host.
pub struct SignalSystem<G = UnrotatedGrid, C = AlwaysConnect> {
    config: SignalConfig,
    grid: G,
    topology: Topology<C>,
    tracker: DirtyTracker,
    producer_strengths: HashMap<Node, Strength>,
    consumers: HashMap<Node, ConsumerState>,
    /// Time of the last pass that ran, in host milliseconds.
    last_update: Option<u64>,
}

impl SignalSystem {
    pub fn new(config: SignalConfig) -> Self {
        Self::with_host(config, UnrotatedGrid, AlwaysConnect)
    }
}

impl Default for SignalSystem {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

impl<G: Grid, C: ConnectionCondition> SignalSystem<G, C> {
    pub fn with_host(config: SignalConfig, grid: G, condition: C) -> Self {
        Self {
            config,
            grid,
            topology: Topology::with_condition(condition),
            tracker: DirtyTracker::new(),
            producer_strengths: HashMap::new(),
            consumers: HashMap::new(),
            last_update: None,
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology<C> {
        &self.topology
    }

    /// Whether the next pass has anything to recompute.
    pub fn is_dirty(&self) -> bool {
        !self.tracker.is_clean()
    }

    // ------------------------------------------------------------------
    // Producers
    // ------------------------------------------------------------------

    /// A producer cell was placed. Returns the registered node, or `None`
    /// if the grid reports the cell as not loaded.
    pub fn place_producer(&mut self, location: Location, def: &ProducerDef) -> Option<Node> {
        self.register_producer(location, def, ChangeReason::WorldChange)
    }

    /// A producer cell was broken.
    pub fn remove_producer(&mut self, location: Location) {
        self.unregister_producers(location, ChangeReason::WorldChange);
    }

    /// Producer cells became available with a loaded region.
    pub fn load_producers<I>(&mut self, locations: I, def: &ProducerDef)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.register_producer(location, def, ChangeReason::ChunkEvent);
        }
    }

    /// Producer cells went away with an unloaded region.
    pub fn unload_producers<I>(&mut self, locations: I)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.unregister_producers(location, ChangeReason::ChunkEvent);
        }
    }

    /// A producer cell was reconfigured: faces, strength or both.
    pub fn update_producer(&mut self, location: Location, def: &ProducerDef) -> Option<Node> {
        let node = self.producer_node(location, def);
        let existing = self.producers_at(location);
        if existing.as_slice() == [node] {
            self.set_strength_of(node, def.strength);
            return Some(node);
        }
        self.unregister_producers(location, ChangeReason::WorldChange);
        let node = self.register_producer(location, def, ChangeReason::WorldChange)?;
        self.tracker.mark_producer(node);
        Some(node)
    }

    /// Change the strength of every producer at `location` without touching
    /// the topology. Returns whether anything changed.
    pub fn set_producer_strength(&mut self, location: Location, strength: Strength) -> bool {
        let mut changed = false;
        for node in self.producers_at(location) {
            changed |= self.set_strength_of(node, strength);
        }
        changed
    }

    pub fn producer_strength(&self, location: Location) -> Option<Strength> {
        self.producers_at(location)
            .first()
            .and_then(|node| self.producer_strengths.get(node))
            .copied()
    }

    fn producer_node(&self, location: Location, def: &ProducerDef) -> Node {
        Node::producer(location, self.grid.resolve_faces(location, def.connection_faces))
    }

    fn producers_at(&self, location: Location) -> SmallVec<[Node; 2]> {
        self.topology
            .leaf_nodes_at(location)
            .iter()
            .filter(|node| node.is_producer())
            .copied()
            .collect()
    }

    fn set_strength_of(&mut self, node: Node, strength: Strength) -> bool {
        match self.producer_strengths.get_mut(&node) {
            Some(current) if *current != strength => {
                trace!(location = %node.location(), %strength, "producer strength changed");
                *current = strength;
                self.tracker.mark_producer(node);
                true
            }
            _ => false,
        }
    }

    fn register_producer(
        &mut self,
        location: Location,
        def: &ProducerDef,
        reason: ChangeReason,
    ) -> Option<Node> {
        if !self.grid.is_relevant(location) {
            trace!(%location, "producer cell not relevant");
            return None;
        }
        let node = self.producer_node(location, def);
        self.producer_strengths.insert(node, def.strength);
        self.topology.add_leaf(node, reason);
        self.absorb_events();
        Some(node)
    }

    fn unregister_producers(&mut self, location: Location, reason: ChangeReason) {
        for node in self.producers_at(location) {
            self.topology.remove_leaf(node, reason);
            self.producer_strengths.remove(&node);
        }
        self.absorb_events();
    }

    // ------------------------------------------------------------------
    // Consumers
    // ------------------------------------------------------------------

    /// A consumer cell was placed. Returns the registered node, or `None`
    /// if the grid reports the cell as not loaded.
    pub fn place_consumer(&mut self, location: Location, def: &ConsumerDef) -> Option<Node> {
        self.register_consumer(location, def, ChangeReason::WorldChange)
    }

    /// A consumer cell was broken.
    pub fn remove_consumer(&mut self, location: Location) {
        self.unregister_consumers(location, ChangeReason::WorldChange);
    }

    pub fn load_consumers<I>(&mut self, locations: I, def: &ConsumerDef)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.register_consumer(location, def, ChangeReason::ChunkEvent);
        }
    }

    pub fn unload_consumers<I>(&mut self, locations: I)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.unregister_consumers(location, ChangeReason::ChunkEvent);
        }
    }

    /// A consumer cell was reconfigured. Its cached signals are dropped and
    /// it is re-evaluated on the next pass; the last reported result is
    /// kept so the host only hears about an actual change.
    pub fn update_consumer(&mut self, location: Location, def: &ConsumerDef) -> Option<Node> {
        let previous = self
            .consumers_at(location)
            .first()
            .and_then(|node| self.consumers.get(node))
            .map(|state| state.output.clone());

        self.unregister_consumers(location, ChangeReason::WorldChange);
        let node = self.register_consumer(location, def, ChangeReason::WorldChange)?;
        if let (Some(output), Some(state)) = (previous, self.consumers.get_mut(&node)) {
            state.output = output;
        }
        self.tracker.mark_consumer(node);
        Some(node)
    }

    /// Last result reported for the consumer at `location`.
    pub fn consumer_output(&self, location: Location) -> Option<&ConsumerOutput> {
        self.consumers_at(location)
            .first()
            .and_then(|node| self.consumer_output_of(node))
    }

    pub fn consumer_output_of(&self, consumer: &Node) -> Option<&ConsumerOutput> {
        self.consumers.get(consumer).map(|state| &state.output)
    }

    fn consumers_at(&self, location: Location) -> SmallVec<[Node; 2]> {
        self.topology
            .leaf_nodes_at(location)
            .iter()
            .filter(|node| node.is_consumer())
            .copied()
            .collect()
    }

    fn register_consumer(
        &mut self,
        location: Location,
        def: &ConsumerDef,
        reason: ChangeReason,
    ) -> Option<Node> {
        if !self.grid.is_relevant(location) {
            trace!(%location, "consumer cell not relevant");
            return None;
        }
        let faces = self.grid.resolve_faces(location, def.connection_faces);
        let node = Node::consumer(location, faces);
        self.consumers.insert(node, ConsumerState::new(def.mode));
        self.topology.add_leaf(node, reason);
        self.absorb_events();
        Some(node)
    }

    fn unregister_consumers(&mut self, location: Location, reason: ChangeReason) {
        for node in self.consumers_at(location) {
            self.topology.remove_leaf(node, reason);
            self.consumers.remove(&node);
        }
        self.absorb_events();
    }

    // ------------------------------------------------------------------
    // Conductors
    // ------------------------------------------------------------------

    /// A conductor cell was placed. Returns one node per connection group.
    pub fn place_conductor(
        &mut self,
        location: Location,
        def: &ConductorDef,
    ) -> SmallVec<[Node; 2]> {
        self.register_conductor(location, def, ChangeReason::WorldChange)
    }

    /// A conductor cell was broken. Removes every connection group.
    pub fn remove_conductor(&mut self, location: Location) {
        self.unregister_conductors(location, ChangeReason::WorldChange);
    }

    pub fn load_conductors<I>(&mut self, locations: I, def: &ConductorDef)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.register_conductor(location, def, ChangeReason::ChunkEvent);
        }
    }

    pub fn unload_conductors<I>(&mut self, locations: I)
    where
        I: IntoIterator<Item = Location>,
    {
        for location in locations {
            self.unregister_conductors(location, ChangeReason::ChunkEvent);
        }
    }

    /// A conductor cell was reconfigured.
    pub fn update_conductor(
        &mut self,
        location: Location,
        def: &ConductorDef,
    ) -> SmallVec<[Node; 2]> {
        self.unregister_conductors(location, ChangeReason::WorldChange);
        self.register_conductor(location, def, ChangeReason::WorldChange)
    }

    fn register_conductor(
        &mut self,
        location: Location,
        def: &ConductorDef,
        reason: ChangeReason,
    ) -> SmallVec<[Node; 2]> {
        if !self.grid.is_relevant(location) {
            trace!(%location, "conductor cell not relevant");
            return SmallVec::new();
        }
        let nodes: SmallVec<[Node; 2]> = def
            .groups
            .iter()
            .map(|group| {
                Node::conductor(
                    location,
                    self.grid.resolve_faces(location, group.inputs),
                    self.grid.resolve_faces(location, group.outputs),
                )
            })
            .collect();
        for node in &nodes {
            self.topology.add_conductor(*node, reason);
        }
        self.absorb_events();
        nodes
    }

    fn unregister_conductors(&mut self, location: Location, reason: ChangeReason) {
        let nodes: SmallVec<[Node; 2]> = self.topology.conductor_nodes_at(location).into();
        self.topology.remove_conductors(nodes, reason);
        self.absorb_events();
    }

    fn absorb_events(&mut self) {
        for event in self.topology.drain_events() {
            self.tracker.record(&event);
        }
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Run a pass once strictly more than the minimum interval has passed
    /// since the last one. An interval of zero never throttles.
    ///
    /// Returns `None` when throttled; dirty state then carries over to the
    /// next tick.
    pub fn tick<S: OutputSink>(&mut self, now_ms: u64, sink: &mut S) -> Option<TickReport> {
        let interval = self.config.processing_minimum_interval;
        if let Some(last) = self.last_update.filter(|_| interval > 0) {
            if now_ms.saturating_sub(last) <= interval {
                trace!(now_ms, last, "pass throttled");
                return None;
            }
        }
        self.last_update = Some(now_ms);
        Some(self.recalculate(sink))
    }

    /// Run a pass now, ignoring the throttle.
    pub fn recalculate<S: OutputSink>(&mut self, sink: &mut S) -> TickReport {
        let dirty = self.tracker.drain(&self.topology);
        let mut report = TickReport::default();
        let mut pending: IndexSet<Node> = IndexSet::new();

        for &network_id in &dirty.networks {
            let Some(network) = self.topology.network(network_id) else {
                continue;
            };
            if !network.is_active() {
                continue;
            }
            let consumers: Vec<Node> = network.consumers().copied().collect();
            report.networks_recalculated += 1;
            for consumer in consumers {
                self.refresh_signal(network_id, consumer);
                pending.insert(consumer);
            }
        }

        for consumer in dirty.consumers {
            let networks: Vec<NetworkId> = self
                .topology
                .networks_with_leaf(&consumer)
                .filter(|id| !dirty.networks.contains(id))
                .collect();
            for network_id in networks {
                self.refresh_signal(network_id, consumer);
            }
            pending.insert(consumer);
        }

        for consumer in pending {
            if !self.topology.contains_leaf(&consumer) {
                continue;
            }
            let topology = &self.topology;
            let Some(state) = self.consumers.get_mut(&consumer) else {
                continue;
            };
            state.signals.retain(|id, _| {
                topology
                    .network(*id)
                    .is_some_and(|network| network.is_active() && network.has_leaf(&consumer))
            });
            let output = state.mode.aggregate(state.signals.values());
            report.consumers_evaluated += 1;
            if output != state.output {
                debug!(
                    location = %consumer.location(),
                    mode = %state.mode,
                    on = output.has_signal(),
                    "consumer output changed"
                );
                state.output = output;
                sink.write(&consumer, &state.output);
                report.outputs_changed += 1;
            }
        }

        trace!(
            networks = report.networks_recalculated,
            consumers = report.consumers_evaluated,
            changed = report.outputs_changed,
            "signal pass finished"
        );
        report
    }

    fn refresh_signal(&mut self, network_id: NetworkId, consumer: Node) {
        let signals = self.signal_in_network(network_id, &consumer);
        if let Some(state) = self.consumers.get_mut(&consumer) {
            state.signals.insert(network_id, signals);
        }
    }

    /// Signal reaching each face `consumer` has wired into `network_id`.
    fn signal_in_network(&self, network_id: NetworkId, consumer: &Node) -> NetworkSignals {
        let mut signals = NetworkSignals::new();
        let Some(network) = self.topology.network(network_id) else {
            return signals;
        };
        let faces = network.leaf_faces(consumer);

        let producers: Vec<(Node, Strength)> = network
            .producers()
            .filter(|producer| {
                self.config.consumer_can_power_itself
                    || producer.location() != consumer.location()
            })
            .map(|producer| {
                let strength = self
                    .producer_strengths
                    .get(producer)
                    .copied()
                    .unwrap_or_default();
                (*producer, strength)
            })
            .collect();

        // Unbounded signal does not decay: search the whole network.
        let budget = if producers.iter().any(|(_, strength)| strength.is_unbounded()) {
            None
        } else {
            let strongest = producers
                .iter()
                .filter_map(|(_, strength)| strength.finite())
                .max()
                .unwrap_or(0);
            Some(strongest)
        };

        for face in faces.iter() {
            let mut best = Strength::OFF;
            if budget != Some(0) {
                let distances =
                    self.topology
                        .leaf_distances_with_face(network_id, consumer, face, budget);
                for (producer, strength) in &producers {
                    if let Some(&distance) = distances.get(producer) {
                        best = best.max(strength.attenuate(distance));
                    }
                }
            }
            signals.add_signal(face, best);
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NullSink, OutputChange};
    use crate::network::{Face, FaceSet};

    fn at(x: i32) -> Location {
        Location::new(x, 0, 0)
    }

    fn lamp() -> ConsumerDef {
        ConsumerDef::new(FaceSet::ALL, ConsumerMode::AtLeastOne)
    }

    fn source(strength: Strength) -> ProducerDef {
        ProducerDef::new(FaceSet::ALL, strength)
    }

    fn lit<G: Grid, C: ConnectionCondition>(system: &SignalSystem<G, C>, x: i32) -> bool {
        system
            .consumer_output(at(x))
            .is_some_and(ConsumerOutput::has_signal)
    }

    #[test]
    fn clean_pass_does_nothing() {
        let mut system = SignalSystem::default();
        assert!(!system.is_dirty());
        let report = system.recalculate(&mut NullSink);
        assert_eq!(report, TickReport::default());
    }

    #[test]
    fn throttle_keeps_dirty_state() {
        let config = SignalConfig::default().with_processing_minimum_interval(100);
        let mut system = SignalSystem::new(config);
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_consumer(at(2), &lamp());
        assert!(system.tick(1_000, &mut NullSink).is_some());

        system.place_producer(at(0), &source(Strength::Finite(4)));
        assert!(system.tick(1_050, &mut NullSink).is_none());
        assert!(system.is_dirty());
        assert!(!lit(&system, 2));

        assert!(system.tick(1_100, &mut NullSink).is_none());
        assert!(system.tick(1_101, &mut NullSink).is_some());
        assert!(lit(&system, 2));
    }

    #[test]
    fn zero_interval_runs_every_tick() {
        let mut system = SignalSystem::default();
        system.place_consumer(at(2), &lamp());
        assert!(system.tick(5, &mut NullSink).is_some());
        assert!(system.tick(5, &mut NullSink).is_some());
        assert!(system.tick(6, &mut NullSink).is_some());
    }

    #[test]
    fn largest_finite_strength_reaches_consumer() {
        let mut system = SignalSystem::default();
        let strongest = Strength::from_raw(i64::from(u32::MAX)).unwrap();
        system.place_producer(at(0), &source(strongest));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_conductor(at(2), &ConductorDef::cable());
        system.place_consumer(at(3), &lamp());
        system.recalculate(&mut NullSink);
        assert!(lit(&system, 3));
    }

    #[test]
    fn update_conductor_reroutes_signal() {
        let mut system = SignalSystem::default();
        system.place_producer(at(0), &source(Strength::Finite(5)));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_conductor(at(2), &ConductorDef::cable());
        system.place_consumer(at(3), &lamp());
        system.recalculate(&mut NullSink);
        assert!(lit(&system, 3));

        let vertical = FaceSet::of(&[Face::Top, Face::Bottom]);
        let nodes = system.update_conductor(at(1), &ConductorDef::bidirectional(vertical));
        assert_eq!(nodes.len(), 1);
        assert_eq!(system.topology().network_count(), 2);
        let mut writes: Vec<OutputChange> = Vec::new();
        system.recalculate(&mut writes);
        assert_eq!(writes.len(), 1);
        assert!(!lit(&system, 3));

        system.update_conductor(at(1), &ConductorDef::cable());
        assert_eq!(system.topology().network_count(), 1);
        system.recalculate(&mut NullSink);
        assert!(lit(&system, 3));
    }

    #[test]
    fn strength_change_without_topology_change() {
        let mut system = SignalSystem::default();
        system.place_producer(at(0), &source(Strength::OFF));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_consumer(at(2), &lamp());
        system.recalculate(&mut NullSink);
        assert!(!lit(&system, 2));

        assert!(system.set_producer_strength(at(0), Strength::Finite(1)));
        assert!(!system.set_producer_strength(at(0), Strength::Finite(1)));
        let mut writes: Vec<OutputChange> = Vec::new();
        system.recalculate(&mut writes);
        assert_eq!(writes.len(), 1);
        assert!(lit(&system, 2));
        assert_eq!(system.producer_strength(at(0)), Some(Strength::Finite(1)));
    }

    #[test]
    fn update_consumer_switches_mode() {
        let mut system = SignalSystem::default();
        system.place_producer(at(0), &source(Strength::Finite(5)));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_consumer(at(2), &lamp());
        system.recalculate(&mut NullSink);
        assert_eq!(system.consumer_output(at(2)), Some(&ConsumerOutput::Simple(true)));

        let special = ConsumerDef::new(FaceSet::ALL, ConsumerMode::Special);
        system.update_consumer(at(2), &special);
        let mut writes: Vec<OutputChange> = Vec::new();
        system.recalculate(&mut writes);
        assert_eq!(writes.len(), 1);
        let output = system.consumer_output(at(2)).unwrap();
        assert_eq!(output.strength(Face::Left), Some(Strength::Finite(5)));
    }

    #[test]
    fn update_consumer_without_change_is_silent() {
        let mut system = SignalSystem::default();
        system.place_producer(at(0), &source(Strength::Finite(5)));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_consumer(at(2), &lamp());
        system.recalculate(&mut NullSink);

        system.update_consumer(at(2), &lamp());
        let mut writes: Vec<OutputChange> = Vec::new();
        let report = system.recalculate(&mut writes);
        assert!(writes.is_empty());
        assert_eq!(report.consumers_evaluated, 1);
        assert!(lit(&system, 2));
    }

    #[test]
    fn update_producer_changes_faces() {
        let mut system = SignalSystem::default();
        system.place_producer(at(0), &source(Strength::Finite(5)));
        system.place_conductor(at(1), &ConductorDef::cable());
        system.place_consumer(at(2), &lamp());
        system.recalculate(&mut NullSink);
        assert!(lit(&system, 2));

        // Turn the producer away from the cable.
        let away = ProducerDef::new(FaceSet::single(Face::Left), Strength::Finite(5));
        system.update_producer(at(0), &away);
        system.recalculate(&mut NullSink);
        assert!(!lit(&system, 2));
    }

    struct Unloaded(i32);

    impl Grid for Unloaded {
        fn resolve_faces(&self, _location: Location, declared: FaceSet) -> FaceSet {
            declared
        }

        fn is_relevant(&self, location: Location) -> bool {
            location.x != self.0
        }
    }

    #[test]
    fn irrelevant_cells_are_skipped() {
        let mut system =
            SignalSystem::with_host(SignalConfig::default(), Unloaded(1), AlwaysConnect);
        assert!(system
            .place_producer(at(0), &source(Strength::Unbounded))
            .is_some());
        assert!(system.place_conductor(at(1), &ConductorDef::cable()).is_empty());
        assert!(system.place_consumer(at(1), &lamp()).is_none());
        assert_eq!(system.topology().network_count(), 0);
    }

    /// Swaps left/right with front/back.
    struct QuarterTurn;

    impl Grid for QuarterTurn {
        fn resolve_faces(&self, _location: Location, declared: FaceSet) -> FaceSet {
            declared
                .iter()
                .map(|face| match face {
                    Face::Left => Face::Front,
                    Face::Front => Face::Right,
                    Face::Right => Face::Back,
                    Face::Back => Face::Left,
                    other => other,
                })
                .collect()
        }
    }

    #[test]
    fn declared_faces_are_rotated() {
        let mut system =
            SignalSystem::with_host(SignalConfig::default(), QuarterTurn, AlwaysConnect);
        // Declared LEFT ends up facing FRONT (towards -z).
        let def = ConsumerDef::new(FaceSet::single(Face::Left), ConsumerMode::AtLeastOne);
        let node = system.place_consumer(Location::new(0, 0, 0), &def).unwrap();
        assert_eq!(node.input_faces(), FaceSet::single(Face::Front));

        system.place_producer(Location::new(-1, 0, 0), &source(Strength::Unbounded));
        system.recalculate(&mut NullSink);
        assert!(!lit(&system, 0));

        system.place_producer(Location::new(0, 0, -1), &source(Strength::Unbounded));
        system.recalculate(&mut NullSink);
        assert!(lit(&system, 0));
    }
}
