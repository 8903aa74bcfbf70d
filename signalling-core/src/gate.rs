//! Gate Behaviours
//!
//! A gate is a cell that is both a consumer and a producer. Its consumer
//! result drives its own producer strength, optionally after a delay. The
//! [`GateController`] holds that per-gate logic and a small timer queue;
//! the host feeds it consumer result changes and applies the
//! [`GateAction`]s it returns with `SignalSystem::set_producer_strength`.
//!
//! The controller also times button releases, since a button is the same
//! "produce now, stop later" pattern without any consumer input.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{Result, SignalError};
use crate::host::OutputChange;
use crate::network::{Face, Location};
use crate::signal::{ConsumerMode, ConsumerOutput, Strength};

/// Minimum time between two output changes of one logic gate.
pub const GATE_MINIMUM_SIGNAL_CHANGE_INTERVAL: u64 = 500;

/// Upper bound for a delay configured on a placed gate.
pub const MAX_GATE_DELAY: u64 = 500;

/// Delay a gate starts with when its definition does not set one.
pub const DEFAULT_GATE_DELAY: u64 = 1000;

/// How long a pressed button keeps producing.
pub const BUTTON_PRESS_TIME: u64 = 500;

/// Strength of an active limited switch.
pub const LIMITED_SWITCH_STRENGTH: u32 = 5;

/// Highest strength a transformer cycles through before wrapping to zero.
pub const TRANSFORMER_MAX_STRENGTH: u32 = 10;

/// The behaviour of a gate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateKind {
    And,
    Or,
    Xor,
    Nand,
    /// Produces once the input has been on for the configured delay.
    OnDelay,
    /// Keeps producing for the configured delay after the input goes off.
    OffDelay,
    /// Latch driven by a reset face and one or more set faces.
    SetReset,
}

impl GateKind {
    pub fn name(self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Xor => "XOR",
            GateKind::Nand => "NAND",
            GateKind::OnDelay => "ON_DELAY",
            GateKind::OffDelay => "OFF_DELAY",
            GateKind::SetReset => "SET_RESET",
        }
    }

    /// The consumer mode the gate's input has to be registered with.
    pub fn consumer_mode(self) -> ConsumerMode {
        match self {
            GateKind::And | GateKind::Nand => ConsumerMode::AllConnected,
            GateKind::Or | GateKind::OnDelay | GateKind::OffDelay => ConsumerMode::AtLeastOne,
            GateKind::Xor => ConsumerMode::ExactlyOne,
            GateKind::SetReset => ConsumerMode::Special,
        }
    }

    fn is_timed(self) -> bool {
        matches!(self, GateKind::OnDelay | GateKind::OffDelay)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GateKind {
    type Err = SignalError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "AND" => Ok(GateKind::And),
            "OR" => Ok(GateKind::Or),
            "XOR" => Ok(GateKind::Xor),
            "NAND" => Ok(GateKind::Nand),
            "ON_DELAY" => Ok(GateKind::OnDelay),
            "OFF_DELAY" => Ok(GateKind::OffDelay),
            "SET_RESET" => Ok(GateKind::SetReset),
            _ => Err(SignalError::UnknownGate(name.to_string())),
        }
    }
}

/// Content definition of a gate cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDef {
    pub gate_type: GateKind,
    /// Delay in milliseconds for the timed gates.
    #[serde(default = "default_delay")]
    pub delay: u64,
    /// World faces with a special meaning. For a set/reset latch the first
    /// is the reset face and the rest are set faces.
    #[serde(default)]
    pub functional_faces: SmallVec<[Face; 4]>,
}

fn default_delay() -> u64 {
    DEFAULT_GATE_DELAY
}

impl GateDef {
    pub fn new(gate_type: GateKind) -> Self {
        Self {
            gate_type,
            delay: DEFAULT_GATE_DELAY,
            functional_faces: SmallVec::new(),
        }
    }

    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_functional_faces(mut self, faces: &[Face]) -> Self {
        self.functional_faces = faces.iter().copied().collect();
        self
    }
}

/// A producer strength the host should apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateAction {
    pub location: Location,
    pub strength: Strength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Trigger {
    /// Re-read the input of a logic gate or latch.
    Evaluate,
    StartOutput,
    StopOutput,
    /// A button's press time is over.
    Release,
}

#[derive(Debug, Clone)]
struct Gate {
    kind: GateKind,
    delay: u64,
    functional_faces: SmallVec<[Face; 4]>,
    input: ConsumerOutput,
    output: Strength,
    last_change: Option<u64>,
}

impl Gate {
    /// Output the gate wants for its current input.
    fn desired_output(&self) -> Strength {
        let on = |lit: bool| if lit { Strength::Unbounded } else { Strength::OFF };
        match self.kind {
            GateKind::And | GateKind::Or | GateKind::Xor => on(self.input.has_signal()),
            GateKind::Nand => on(!self.input.has_signal()),
            GateKind::SetReset => self.latched_output(),
            GateKind::OnDelay | GateKind::OffDelay => self.output,
        }
    }

    fn latched_output(&self) -> Strength {
        let lit = |face: &Face| self.input.strength(*face).is_some_and(Strength::is_on);
        let Some((reset, set)) = self.functional_faces.split_first() else {
            return self.output;
        };
        if lit(reset) {
            Strength::OFF
        } else if set.iter().any(lit) {
            Strength::Unbounded
        } else {
            self.output
        }
    }
}

/// Per-gate state and the timers that drive it.
#[derive(Debug, Default)]
pub struct GateController {
    gates: HashMap<Location, Gate>,
    /// Pending triggers and the time they are due, in scheduling order.
    pending: IndexMap<(Location, Trigger), u64>,
}

impl GateController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a gate. Replaces any gate already at `location`.
    pub fn add_gate(&mut self, location: Location, def: &GateDef) {
        self.cancel_all(location);
        self.gates.insert(
            location,
            Gate {
                kind: def.gate_type,
                delay: def.delay,
                functional_faces: def.functional_faces.clone(),
                input: def.gate_type.consumer_mode().initial_output(),
                output: Strength::OFF,
                last_change: None,
            },
        );
    }

    /// Stop tracking a gate and drop its timers.
    pub fn remove_gate(&mut self, location: Location) {
        self.gates.remove(&location);
        self.cancel_all(location);
    }

    pub fn gate_kind(&self, location: Location) -> Option<GateKind> {
        self.gates.get(&location).map(|gate| gate.kind)
    }

    /// Strength the gate currently produces.
    pub fn gate_output(&self, location: Location) -> Option<Strength> {
        self.gates.get(&location).map(|gate| gate.output)
    }

    /// Reconfigure a timed gate's delay, capped at [`MAX_GATE_DELAY`].
    /// Returns the delay actually stored.
    pub fn set_delay(&mut self, location: Location, delay: u64) -> Option<u64> {
        let gate = self.gates.get_mut(&location)?;
        gate.delay = delay.min(MAX_GATE_DELAY);
        Some(gate.delay)
    }

    /// Feed a batch of consumer results, as collected by a `Vec` output sink.
    /// Results of cells that are not gates are ignored.
    pub fn observe(&mut self, changes: &[OutputChange], now: u64) {
        for change in changes {
            self.input_changed(change.consumer.location(), &change.output, now);
        }
    }

    /// The consumer result of the gate at `location` changed.
    pub fn input_changed(&mut self, location: Location, input: &ConsumerOutput, now: u64) {
        let Some(gate) = self.gates.get_mut(&location) else {
            return;
        };
        gate.input = input.clone();
        let on = input.has_signal();
        let kind = gate.kind;
        let delay = gate.delay;
        let earliest = gate
            .last_change
            .map_or(now, |last| now.max(last + GATE_MINIMUM_SIGNAL_CHANGE_INTERVAL));

        match kind {
            GateKind::OnDelay if on => self.schedule(location, Trigger::StartOutput, now + delay),
            GateKind::OnDelay => {
                self.cancel(location, Trigger::StartOutput);
                self.schedule(location, Trigger::StopOutput, now);
            }
            GateKind::OffDelay if on => {
                self.cancel(location, Trigger::StopOutput);
                self.schedule(location, Trigger::StartOutput, now);
            }
            GateKind::OffDelay => self.schedule(location, Trigger::StopOutput, now + delay),
            _ => {
                if !self.pending.contains_key(&(location, Trigger::Evaluate)) {
                    self.schedule(location, Trigger::Evaluate, earliest);
                }
            }
        }
    }

    /// Stop the producer at `location` at time `at`.
    pub fn release_at(&mut self, location: Location, at: u64) {
        self.schedule(location, Trigger::Release, at);
    }

    /// Time of the earliest pending trigger.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.values().copied().min()
    }

    /// Fire every trigger due at `now` and return the resulting strength
    /// changes, earliest first.
    pub fn poll(&mut self, now: u64) -> Vec<GateAction> {
        let mut due: Vec<((Location, Trigger), u64)> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*key, *at))
            .collect();
        due.sort_by_key(|(_, at)| *at);

        let mut actions = Vec::new();
        for (key, _) in due {
            self.pending.shift_remove(&key);
            let (location, trigger) = key;
            if let Some(action) = self.fire(location, trigger, now) {
                actions.push(action);
            }
        }
        actions
    }

    fn fire(&mut self, location: Location, trigger: Trigger, now: u64) -> Option<GateAction> {
        if trigger == Trigger::Release {
            return Some(GateAction {
                location,
                strength: Strength::OFF,
            });
        }
        let gate = self.gates.get_mut(&location)?;
        let desired = match trigger {
            Trigger::StartOutput => Strength::Unbounded,
            Trigger::StopOutput => Strength::OFF,
            _ => gate.desired_output(),
        };
        if desired == gate.output {
            return None;
        }
        gate.output = desired;
        if !gate.kind.is_timed() {
            gate.last_change = Some(now);
        }
        debug!(%location, kind = %gate.kind, strength = %desired, "gate output changed");
        Some(GateAction {
            location,
            strength: desired,
        })
    }

    fn schedule(&mut self, location: Location, trigger: Trigger, at: u64) {
        trace!(%location, ?trigger, at, "gate trigger scheduled");
        // Rescheduling moves the trigger to the back of the queue.
        self.pending.shift_remove(&(location, trigger));
        self.pending.insert((location, trigger), at);
    }

    fn cancel(&mut self, location: Location, trigger: Trigger) {
        self.pending.shift_remove(&(location, trigger));
    }

    fn cancel_all(&mut self, location: Location) {
        self.pending.retain(|(gate, _), _| *gate != location);
    }
}

/// Interactive producers that change strength when a player uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProducerDevice {
    /// Toggles between off and unbounded.
    Switch,
    /// Toggles between off and [`LIMITED_SWITCH_STRENGTH`].
    LimitedSwitch,
    /// Steps one strength up per use, wrapping to off after
    /// [`TRANSFORMER_MAX_STRENGTH`].
    Transformer,
    /// Produces unbounded until released after [`BUTTON_PRESS_TIME`].
    Button,
}

impl ProducerDevice {
    /// Strength after one activation.
    pub fn activate(self, current: Strength) -> Strength {
        match self {
            ProducerDevice::Switch => toggle(current, Strength::Unbounded),
            ProducerDevice::LimitedSwitch => {
                toggle(current, Strength::Finite(LIMITED_SWITCH_STRENGTH))
            }
            ProducerDevice::Transformer => match current {
                Strength::Finite(n) if n < TRANSFORMER_MAX_STRENGTH => Strength::Finite(n + 1),
                _ => Strength::OFF,
            },
            ProducerDevice::Button => Strength::Unbounded,
        }
    }

    /// How long after activation the device turns itself off.
    pub fn release_after(self) -> Option<u64> {
        match self {
            ProducerDevice::Button => Some(BUTTON_PRESS_TIME),
            _ => None,
        }
    }
}

fn toggle(current: Strength, on: Strength) -> Strength {
    if current.is_on() {
        Strength::OFF
    } else {
        on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const HERE: Location = Location::new(0, 0, 0);

    fn simple(on: bool) -> ConsumerOutput {
        ConsumerOutput::Simple(on)
    }

    fn advanced(faces: &[(Face, Strength)]) -> ConsumerOutput {
        ConsumerOutput::Advanced(faces.iter().copied().collect::<BTreeMap<_, _>>())
    }

    fn action(strength: Strength) -> GateAction {
        GateAction {
            location: HERE,
            strength,
        }
    }

    #[test]
    fn gate_names_parse() {
        assert_eq!("ON_DELAY".parse::<GateKind>().unwrap(), GateKind::OnDelay);
        assert_eq!("nand".parse::<GateKind>().unwrap(), GateKind::Nand);
        assert!(matches!(
            "NOR".parse::<GateKind>(),
            Err(SignalError::UnknownGate(name)) if name == "NOR"
        ));

        let def: GateDef = serde_json::from_str(r#"{ "gateType": "SET_RESET" }"#).unwrap();
        assert_eq!(def.gate_type, GateKind::SetReset);
        assert_eq!(def.delay, DEFAULT_GATE_DELAY);
        assert_eq!(GateKind::SetReset.consumer_mode(), ConsumerMode::Special);
    }

    #[test]
    fn logic_gate_respects_minimum_interval() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::Or));

        gates.input_changed(HERE, &simple(true), 1_000);
        assert_eq!(gates.poll(1_000), vec![action(Strength::Unbounded)]);

        gates.input_changed(HERE, &simple(false), 1_100);
        assert!(gates.poll(1_100).is_empty());
        assert_eq!(gates.next_due(), Some(1_500));
        assert_eq!(gates.poll(1_500), vec![action(Strength::OFF)]);
    }

    #[test]
    fn flicker_inside_interval_is_absorbed() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::And));
        gates.input_changed(HERE, &simple(true), 0);
        gates.poll(0);

        gates.input_changed(HERE, &simple(false), 100);
        gates.input_changed(HERE, &simple(true), 200);
        assert!(gates.poll(600).is_empty());
        assert_eq!(gates.gate_output(HERE), Some(Strength::Unbounded));
    }

    #[test]
    fn nand_inverts() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::Nand));
        gates.input_changed(HERE, &simple(false), 0);
        assert_eq!(gates.poll(0), vec![action(Strength::Unbounded)]);
        gates.input_changed(HERE, &simple(true), 1_000);
        assert_eq!(gates.poll(1_000), vec![action(Strength::OFF)]);
    }

    #[test]
    fn on_delay_waits_and_stops_at_once() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::OnDelay).with_delay(300));

        gates.input_changed(HERE, &simple(true), 0);
        assert!(gates.poll(299).is_empty());
        assert_eq!(gates.poll(300), vec![action(Strength::Unbounded)]);

        gates.input_changed(HERE, &simple(false), 400);
        assert_eq!(gates.poll(400), vec![action(Strength::OFF)]);
    }

    #[test]
    fn on_delay_cancelled_by_short_pulse() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::OnDelay).with_delay(300));
        gates.input_changed(HERE, &simple(true), 0);
        gates.input_changed(HERE, &simple(false), 100);
        assert!(gates.poll(1_000).is_empty());
        assert_eq!(gates.gate_output(HERE), Some(Strength::OFF));
    }

    #[test]
    fn off_delay_holds_output() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::OffDelay).with_delay(200));

        gates.input_changed(HERE, &simple(true), 0);
        assert_eq!(gates.poll(0), vec![action(Strength::Unbounded)]);

        gates.input_changed(HERE, &simple(false), 50);
        assert!(gates.poll(100).is_empty());
        assert_eq!(gates.poll(250), vec![action(Strength::OFF)]);
    }

    #[test]
    fn set_reset_latches() {
        let mut gates = GateController::new();
        let def = GateDef::new(GateKind::SetReset).with_functional_faces(&[Face::Left, Face::Right]);
        gates.add_gate(HERE, &def);

        gates.input_changed(HERE, &advanced(&[(Face::Right, Strength::Finite(3))]), 0);
        assert_eq!(gates.poll(0), vec![action(Strength::Unbounded)]);

        // Set goes away: the latch holds.
        gates.input_changed(HERE, &advanced(&[(Face::Right, Strength::OFF)]), 1_000);
        assert!(gates.poll(1_000).is_empty());

        gates.input_changed(HERE, &advanced(&[(Face::Left, Strength::Unbounded)]), 2_000);
        assert_eq!(gates.poll(2_000), vec![action(Strength::OFF)]);
    }

    #[test]
    fn delay_configuration_is_capped() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::OnDelay));
        assert_eq!(gates.set_delay(HERE, 2_000), Some(MAX_GATE_DELAY));
        assert_eq!(gates.set_delay(HERE, 120), Some(120));
        assert_eq!(gates.set_delay(Location::new(9, 9, 9), 120), None);
    }

    #[test]
    fn removed_gate_drops_timers() {
        let mut gates = GateController::new();
        gates.add_gate(HERE, &GateDef::new(GateKind::OnDelay).with_delay(100));
        gates.input_changed(HERE, &simple(true), 0);
        gates.remove_gate(HERE);
        assert_eq!(gates.next_due(), None);
        assert!(gates.poll(1_000).is_empty());
    }

    #[test]
    fn devices_cycle() {
        assert_eq!(ProducerDevice::Switch.activate(Strength::OFF), Strength::Unbounded);
        assert_eq!(ProducerDevice::Switch.activate(Strength::Unbounded), Strength::OFF);
        assert_eq!(
            ProducerDevice::LimitedSwitch.activate(Strength::OFF),
            Strength::Finite(LIMITED_SWITCH_STRENGTH)
        );
        assert_eq!(ProducerDevice::Transformer.activate(Strength::Finite(4)), Strength::Finite(5));
        assert_eq!(ProducerDevice::Transformer.activate(Strength::Finite(10)), Strength::OFF);
        assert_eq!(ProducerDevice::Transformer.activate(Strength::Unbounded), Strength::OFF);
        assert_eq!(ProducerDevice::Button.release_after(), Some(BUTTON_PRESS_TIME));
        assert_eq!(ProducerDevice::Switch.release_after(), None);
    }

    #[test]
    fn button_release_is_timed() {
        let mut gates = GateController::new();
        gates.release_at(HERE, BUTTON_PRESS_TIME);
        assert!(gates.poll(100).is_empty());
        assert_eq!(gates.poll(BUTTON_PRESS_TIME), vec![action(Strength::OFF)]);
    }
}
