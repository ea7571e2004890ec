//! Engine settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::input::Modality;

/// Platform quirks that affect the default key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Standard,
    /// Adds the private-use key codes some macOS browsers report.
    MacOs,
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(Self::Standard),
            "macos" | "mac" | "osx" => Ok(Self::MacOs),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Modalities the engine builds handlers for
    #[serde(default = "default_listen")]
    pub listen: Vec<Modality>,
    /// Swallow auto-repeated key presses
    #[serde(default = "default_no_key_repeat")]
    pub no_key_repeat: bool,
    #[serde(default = "default_sequence_timeout_ms")]
    pub sequence_timeout_ms: u64,
    #[serde(default = "default_max_sequence_buf")]
    pub max_sequence_buf: usize,
    /// Give numeric keypad keys their own names (`numpad5`, `numpadenter`)
    #[serde(default)]
    pub unique_numpad: bool,
    /// Minimum travel (in pixels) before a pointer release counts as a swipe
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,
    #[serde(default = "default_gamepad_interval_ms")]
    pub gamepad_interval_ms: u64,
    /// Polling interval used while no gamepad has been seen yet
    #[serde(default = "default_gamepad_check_interval_ms")]
    pub gamepad_check_interval_ms: u64,
    #[serde(default)]
    pub platform: Platform,
}

fn default_listen() -> Vec<Modality> {
    Modality::ALL.to_vec()
}

fn default_no_key_repeat() -> bool {
    true
}

fn default_sequence_timeout_ms() -> u64 {
    3000
}

fn default_max_sequence_buf() -> usize {
    12
}

fn default_swipe_threshold() -> f64 {
    100.0
}

fn default_gamepad_interval_ms() -> u64 {
    100
}

fn default_gamepad_check_interval_ms() -> u64 {
    3000
}

/// Upper bound for `max_sequence_buf`.
pub const MAX_SEQUENCE_BUF: usize = 1024;

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            no_key_repeat: default_no_key_repeat(),
            sequence_timeout_ms: default_sequence_timeout_ms(),
            max_sequence_buf: default_max_sequence_buf(),
            unique_numpad: false,
            swipe_threshold: default_swipe_threshold(),
            gamepad_interval_ms: default_gamepad_interval_ms(),
            gamepad_check_interval_ms: default_gamepad_check_interval_ms(),
            platform: Platform::Standard,
        }
    }
}

impl Settings {
    /// Check that every value is usable by the engine.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_sequence_buf == 0 {
            return Err(SettingsError::EmptySequenceBuffer);
        }
        if self.max_sequence_buf > MAX_SEQUENCE_BUF {
            return Err(SettingsError::SequenceBufferTooLarge {
                value: self.max_sequence_buf,
                max: MAX_SEQUENCE_BUF,
            });
        }
        if self.sequence_timeout_ms == 0 {
            return Err(SettingsError::ZeroSequenceTimeout);
        }
        if self.gamepad_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval {
                field: "gamepad-interval",
            });
        }
        if self.gamepad_check_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval {
                field: "gamepad-check-interval",
            });
        }
        if !(self.swipe_threshold >= 0.0) {
            return Err(SettingsError::InvalidSwipeThreshold {
                value: self.swipe_threshold,
            });
        }
        Ok(())
    }

    pub fn sequence_timeout(&self) -> Duration {
        Duration::from_millis(self.sequence_timeout_ms)
    }

    pub fn gamepad_interval(&self) -> Duration {
        Duration::from_millis(self.gamepad_interval_ms)
    }

    pub fn gamepad_check_interval(&self) -> Duration {
        Duration::from_millis(self.gamepad_check_interval_ms)
    }

    pub fn listens_to(&self, modality: Modality) -> bool {
        self.listen.contains(&modality)
    }
}
