//! Signal Strength
//!
//! A producer emits either a finite strength that decays by one per hop,
//! or an unbounded signal that reaches every face of its network.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// Strength of a signal. `Unbounded` dominates every finite value.
///
/// Hosts store it as an integer where -1 means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Strength {
    Finite(u32),
    Unbounded,
}

impl Strength {
    /// No signal.
    pub const OFF: Strength = Strength::Finite(0);

    /// Decode the host integer encoding.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            -1 => Ok(Strength::Unbounded),
            n if n >= 0 => u32::try_from(n)
                .map(Strength::Finite)
                .map_err(|_| SignalError::InvalidStrength(n)),
            n => Err(SignalError::InvalidStrength(n)),
        }
    }

    /// Host integer encoding.
    pub fn raw(self) -> i64 {
        match self {
            Strength::Finite(n) => i64::from(n),
            Strength::Unbounded => -1,
        }
    }

    pub fn is_unbounded(self) -> bool {
        self == Strength::Unbounded
    }

    /// Whether this carries any signal at all.
    pub fn is_on(self) -> bool {
        self != Strength::OFF
    }

    pub fn finite(self) -> Option<u32> {
        match self {
            Strength::Finite(n) => Some(n),
            Strength::Unbounded => None,
        }
    }

    /// Strength left after travelling `distance` hops: `s - d + 1`, never
    /// below zero. Unbounded signals do not decay.
    pub fn attenuate(self, distance: u32) -> Strength {
        match self {
            Strength::Finite(n) => Strength::Finite(n.saturating_add(1).saturating_sub(distance)),
            Strength::Unbounded => Strength::Unbounded,
        }
    }
}

impl Default for Strength {
    fn default() -> Self {
        Strength::OFF
    }
}

impl TryFrom<i64> for Strength {
    type Error = SignalError;

    fn try_from(raw: i64) -> Result<Self> {
        Strength::from_raw(raw)
    }
}

impl From<Strength> for i64 {
    fn from(strength: Strength) -> Self {
        strength.raw()
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::Finite(n) => write!(f, "{}", n),
            Strength::Unbounded => f.write_str("unbounded"),
        }
    }
}
