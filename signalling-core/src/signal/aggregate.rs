//! Aggregation Policies
//!
//! A consumer can sit in several networks at once. Each network reports a
//! [`NetworkSignals`] for the faces wired into it; the consumer's mode folds
//! those reports into one [`ConsumerOutput`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::strength::Strength;
use crate::error::{Result, SignalError};
use crate::network::{Face, FaceSet};

/// How a consumer combines the signals of its networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumerMode {
    /// OR: any face with signal.
    #[serde(alias = "OR")]
    AtLeastOne,
    /// AND: no connected face without signal.
    #[serde(alias = "AND")]
    AllConnected,
    /// XOR: exactly one face, in exactly one network, with signal.
    #[serde(alias = "XOR")]
    ExactlyOne,
    /// Raw per-face strengths, left to the host to interpret.
    Special,
}

impl ConsumerMode {
    pub fn name(self) -> &'static str {
        match self {
            ConsumerMode::AtLeastOne => "AT_LEAST_ONE",
            ConsumerMode::AllConnected => "ALL_CONNECTED",
            ConsumerMode::ExactlyOne => "EXACTLY_ONE",
            ConsumerMode::Special => "SPECIAL",
        }
    }

    /// Output of a consumer that has not been evaluated yet.
    pub fn initial_output(self) -> ConsumerOutput {
        match self {
            ConsumerMode::Special => ConsumerOutput::Advanced(BTreeMap::new()),
            _ => ConsumerOutput::Simple(false),
        }
    }

    /// Fold per-network signals into the consumer's result.
    pub fn aggregate<'a, I>(self, signals: I) -> ConsumerOutput
    where
        I: IntoIterator<Item = &'a NetworkSignals>,
    {
        let mut signals = signals.into_iter();
        match self {
            ConsumerMode::AtLeastOne => {
                ConsumerOutput::Simple(signals.any(|s| !s.faces_with_signal().is_empty()))
            }
            ConsumerMode::AllConnected => {
                ConsumerOutput::Simple(signals.all(|s| s.faces_without_signal().is_empty()))
            }
            ConsumerMode::ExactlyOne => ConsumerOutput::Simple(exactly_one(signals)),
            ConsumerMode::Special => {
                let mut merged = BTreeMap::new();
                for network in signals {
                    for (face, strength) in network.strengths() {
                        merged.insert(face, strength);
                    }
                }
                ConsumerOutput::Advanced(merged)
            }
        }
    }
}

fn exactly_one<'a>(signals: impl Iterator<Item = &'a NetworkSignals>) -> bool {
    let mut found = false;
    for network in signals {
        match network.faces_with_signal().len() {
            0 => {}
            1 if !found => found = true,
            _ => return false,
        }
    }
    found
}

impl fmt::Display for ConsumerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConsumerMode {
    type Err = SignalError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "AT_LEAST_ONE" | "OR" => Ok(ConsumerMode::AtLeastOne),
            "ALL_CONNECTED" | "AND" => Ok(ConsumerMode::AllConnected),
            "EXACTLY_ONE" | "XOR" => Ok(ConsumerMode::ExactlyOne),
            "SPECIAL" => Ok(ConsumerMode::Special),
            _ => Err(SignalError::UnknownMode(name.to_string())),
        }
    }
}

/// Signal one network delivers to one consumer, per connected face.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSignals {
    strengths: BTreeMap<Face, Strength>,
    faces_with_signal: FaceSet,
    faces_without_signal: FaceSet,
}

impl NetworkSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the strength arriving on `face`. A face recorded twice keeps
    /// the last value.
    pub fn add_signal(&mut self, face: Face, strength: Strength) {
        self.strengths.insert(face, strength);
        if strength.is_on() {
            self.faces_with_signal.insert(face);
            self.faces_without_signal.remove(face);
        } else {
            self.faces_without_signal.insert(face);
            self.faces_with_signal.remove(face);
        }
    }

    pub fn strength(&self, face: Face) -> Option<Strength> {
        self.strengths.get(&face).copied()
    }

    pub fn strengths(&self) -> impl Iterator<Item = (Face, Strength)> + '_ {
        self.strengths.iter().map(|(face, strength)| (*face, *strength))
    }

    pub fn faces_with_signal(&self) -> FaceSet {
        self.faces_with_signal
    }

    pub fn faces_without_signal(&self) -> FaceSet {
        self.faces_without_signal
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
    }
}

/// The externally visible result of a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsumerOutput {
    /// OR, AND and XOR consumers.
    Simple(bool),
    /// SPECIAL consumers: strength per connected face.
    Advanced(BTreeMap<Face, Strength>),
}

impl ConsumerOutput {
    /// Whether anything reaches the consumer.
    pub fn has_signal(&self) -> bool {
        match self {
            ConsumerOutput::Simple(on) => *on,
            ConsumerOutput::Advanced(strengths) => strengths.values().any(|s| s.is_on()),
        }
    }

    /// Strength on `face` for SPECIAL consumers.
    pub fn strength(&self, face: Face) -> Option<Strength> {
        match self {
            ConsumerOutput::Simple(_) => None,
            ConsumerOutput::Advanced(strengths) => strengths.get(&face).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(faces: &[(Face, Strength)]) -> NetworkSignals {
        let mut signals = NetworkSignals::new();
        for (face, strength) in faces {
            signals.add_signal(*face, *strength);
        }
        signals
    }

    const ON: Strength = Strength::Finite(2);
    const OFF: Strength = Strength::OFF;
    const NONE: [&NetworkSignals; 0] = [];

    #[test]
    fn masks_track_last_write() {
        let mut s = signals(&[(Face::Left, OFF), (Face::Top, ON)]);
        assert_eq!(s.faces_with_signal(), FaceSet::single(Face::Top));
        assert_eq!(s.faces_without_signal(), FaceSet::single(Face::Left));

        s.add_signal(Face::Left, Strength::Unbounded);
        assert_eq!(s.faces_with_signal(), FaceSet::of(&[Face::Left, Face::Top]));
        assert!(s.faces_without_signal().is_empty());
    }

    #[test]
    fn or_needs_any_face() {
        let mode = ConsumerMode::AtLeastOne;
        let a = signals(&[(Face::Left, OFF)]);
        let b = signals(&[(Face::Right, ON)]);
        assert_eq!(mode.aggregate([&a]), ConsumerOutput::Simple(false));
        assert_eq!(mode.aggregate([&a, &b]), ConsumerOutput::Simple(true));
        assert_eq!(mode.aggregate(NONE), ConsumerOutput::Simple(false));
    }

    #[test]
    fn and_rejects_any_dark_face() {
        let mode = ConsumerMode::AllConnected;
        let lit = signals(&[(Face::Left, ON), (Face::Right, Strength::Unbounded)]);
        let half = signals(&[(Face::Left, ON), (Face::Right, OFF)]);
        assert_eq!(mode.aggregate([&lit]), ConsumerOutput::Simple(true));
        assert_eq!(mode.aggregate([&lit, &half]), ConsumerOutput::Simple(false));
        // Nothing connected leaves nothing dark.
        assert_eq!(mode.aggregate(NONE), ConsumerOutput::Simple(true));
    }

    #[test]
    fn xor_needs_a_single_face() {
        let mode = ConsumerMode::ExactlyOne;
        let one = signals(&[(Face::Left, ON), (Face::Right, OFF)]);
        let two = signals(&[(Face::Left, ON), (Face::Right, ON)]);
        let other = signals(&[(Face::Top, ON)]);
        let dark = signals(&[(Face::Bottom, OFF)]);

        assert_eq!(mode.aggregate([&one]), ConsumerOutput::Simple(true));
        assert_eq!(mode.aggregate([&one, &dark]), ConsumerOutput::Simple(true));
        assert_eq!(mode.aggregate([&two]), ConsumerOutput::Simple(false));
        assert_eq!(mode.aggregate([&one, &other]), ConsumerOutput::Simple(false));
        assert_eq!(mode.aggregate([&dark]), ConsumerOutput::Simple(false));
    }

    #[test]
    fn special_merges_faces() {
        let a = signals(&[(Face::Left, ON)]);
        let b = signals(&[(Face::Top, Strength::Unbounded), (Face::Right, OFF)]);
        let output = ConsumerMode::Special.aggregate([&a, &b]);

        assert_eq!(output.strength(Face::Left), Some(ON));
        assert_eq!(output.strength(Face::Top), Some(Strength::Unbounded));
        assert_eq!(output.strength(Face::Right), Some(OFF));
        assert_eq!(output.strength(Face::Bottom), None);
        assert!(output.has_signal());
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!("OR".parse::<ConsumerMode>().unwrap(), ConsumerMode::AtLeastOne);
        assert_eq!("and".parse::<ConsumerMode>().unwrap(), ConsumerMode::AllConnected);
        assert_eq!("EXACTLY_ONE".parse::<ConsumerMode>().unwrap(), ConsumerMode::ExactlyOne);
        assert_eq!("SPECIAL".parse::<ConsumerMode>().unwrap(), ConsumerMode::Special);
        assert!(matches!(
            "MAJORITY".parse::<ConsumerMode>(),
            Err(SignalError::UnknownMode(name)) if name == "MAJORITY"
        ));
        assert_eq!(
            serde_json::from_str::<ConsumerMode>("\"XOR\"").unwrap(),
            ConsumerMode::ExactlyOne
        );
    }
}
