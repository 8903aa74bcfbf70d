//! Engine Configuration
//!
//! Values the host reads once at startup and hands to the engine.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for the signal propagation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalConfig {
    /// Minimum time in milliseconds between two recompute passes.
    /// Zero means every tick recomputes.
    #[serde(default)]
    pub processing_minimum_interval: u64,

    /// Whether a producer may power a consumer at its own location.
    #[serde(default)]
    pub consumer_can_power_itself: bool,
}

impl SignalConfig {
    /// Parse a configuration document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_processing_minimum_interval(mut self, interval_ms: u64) -> Self {
        self.processing_minimum_interval = interval_ms;
        self
    }

    pub fn with_consumer_can_power_itself(mut self, enabled: bool) -> Self {
        self.consumer_can_power_itself = enabled;
        self
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            processing_minimum_interval: 0,
            consumer_can_power_itself: false,
        }
    }
}
