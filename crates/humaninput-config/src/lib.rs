//! Configuration parsing for humaninput
//!
//! Reads a KDL file into engine [`Settings`](humaninput_core::Settings),
//! aliases, controller layouts and key map overrides, and builds a ready
//! [`HumanInput`](humaninput_core::HumanInput) from them.

mod error;
mod model;
mod parser;

pub use error::{ConfigError, InvalidEventName, SourceLocation};
pub use model::*;
pub use parser::{parse_config, parse_config_str};

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Write;
    use std::rc::Rc;
    use std::time::Instant;

    use humaninput_core::{Callback, KeyInput, KeyLocation, Payload, Registry};

    use super::*;

    const SAMPLE: &str = r#"
global { log-level "info" }
settings {
    sequence-timeout 2000
    listen "keyboard" "gamepad"
}
aliases { save "ctrl-s"; }
controller "standard"
keymap { key 173 "AudioVolumeMute"; }
"#;

    #[test]
    fn test_parse_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = parse_config(file.path()).unwrap();
        assert_eq!(config.global.log_level, LogLevel::Info);
        assert_eq!(config.settings.sequence_timeout_ms, 2000);
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.controllers[0].name, "standard");
        assert_eq!(config.keymap.len(), 1);
    }

    #[test]
    fn test_parse_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_config(&dir.path().join("absent.kdl"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_build_engine_applies_aliases_and_keymap() {
        let config = parse_config_str(SAMPLE).unwrap();
        let mut engine = config.build_engine().unwrap();
        assert_eq!(
            engine.registry().aliases().get("gpad:up").map(String::as_str),
            Some("gpad:button:12")
        );

        let fired = Rc::new(Cell::new(0));
        let inner = fired.clone();
        engine.on(
            "save",
            Callback::new(move |_: &mut Registry, _: &Payload| inner.set(inner.get() + 1)),
        );
        let now = Instant::now();
        engine.handle_press(
            KeyInput::new("Control").with_key_code(17).at(KeyLocation::Left),
            now,
        );
        engine.handle_press(KeyInput::new("s").with_key_code(83), now);
        assert_eq!(fired.get(), 1);

        let resolved = engine.core().resolver().resolve(&KeyInput::from_code(173));
        assert_eq!(resolved.name, "AudioVolumeMute");
    }

    #[test]
    fn test_config_path_expands_tilde() {
        let path = config_path(None);
        assert!(path.ends_with(".config/humaninput/config.kdl"));
        assert_eq!(config_path(Some("/etc/hi.kdl")), std::path::PathBuf::from("/etc/hi.kdl"));
    }
}
