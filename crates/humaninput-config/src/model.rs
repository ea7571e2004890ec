//! Configuration data model

use std::path::PathBuf;

use humaninput_core::{ControllerLayout, HumanInput, KeyLocation, KeyMap, Settings};

use crate::error::ConfigError;

/// Default configuration location, before tilde expansion.
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/humaninput/config.kdl";

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub settings: Settings,
    /// Alias name to target, in file order
    pub aliases: Vec<(String, String)>,
    pub controllers: Vec<ControllerLayout>,
    pub keymap: Vec<KeyOverride>,
}

/// Global settings
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// The directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A key map entry replacing or adding a code/name pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOverride {
    pub code: u32,
    pub name: String,
    pub location: KeyLocation,
}

impl Config {
    /// The built-in key map with this config's overrides applied.
    pub fn keymap(&self) -> KeyMap {
        let mut keymap = KeyMap::standard(self.settings.unique_numpad, self.settings.platform);
        for key in &self.keymap {
            keymap.override_code(key.location, key.code, key.name.clone());
        }
        keymap
    }

    /// Build an engine from this configuration: settings, key map overrides,
    /// aliases and controller layouts.
    pub fn build_engine(&self) -> Result<HumanInput, ConfigError> {
        let mut engine = HumanInput::with_keymap(self.settings.clone(), self.keymap())?;
        for (name, target) in &self.aliases {
            engine.registry_mut().alias(name.clone(), target.clone());
        }
        for layout in &self.controllers {
            engine.load_controller(layout);
        }
        Ok(engine)
    }
}

/// Expand `~` in a user-supplied path, falling back to the default location.
pub fn config_path(path: Option<&str>) -> PathBuf {
    let raw = path.unwrap_or(DEFAULT_CONFIG_PATH);
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
