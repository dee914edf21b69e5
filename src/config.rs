//! Engine configuration.
//!
//! Field names are camelCase so the same shape can be passed from JS
//! (via serde-wasm-bindgen) or loaded from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest accepted loop iteration, in seconds.
pub const MAX_LOOP_DURATION: f64 = 60.0;

/// Tunables for the engine. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Context sample rate in Hz.
    pub sample_rate: u32,
    /// Fixed gain of the master bus when it is created.
    pub master_gain: f32,
    /// Length of one loop iteration in seconds.
    pub loop_duration: f64,
    /// Delay between scheduling an iteration and its first event, in seconds.
    pub lookahead: f64,
    /// How long before an iteration ends the next one is scheduled, in ms.
    pub rearm_margin_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            master_gain: 0.3,
            loop_duration: 4.0,
            lookahead: 0.1,
            rearm_margin_ms: 100,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.loop_duration.is_finite() || self.loop_duration <= 0.0 {
            return Err(invalid("loopDuration", "must be a positive number of seconds"));
        }
        if self.loop_duration > MAX_LOOP_DURATION {
            return Err(invalid(
                "loopDuration",
                format!("must be at most {MAX_LOOP_DURATION} s"),
            ));
        }
        if !self.lookahead.is_finite() || self.lookahead < 0.0 {
            return Err(invalid("lookahead", "must be zero or more seconds"));
        }
        if self.lookahead > self.loop_duration {
            return Err(invalid("lookahead", "must not exceed the loop duration"));
        }
        if self.rearm_margin_ms as f64 >= self.loop_duration * 1000.0 {
            return Err(invalid(
                "rearmMarginMs",
                format!("must be shorter than the loop ({} s)", self.loop_duration),
            ));
        }
        if !self.master_gain.is_finite() {
            return Err(invalid("masterGain", "must be finite"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
