//! KDL configuration parser

use std::path::Path;

use humaninput_core::{ControllerLayout, EventSpec, KeyLocation, Modality, Platform, Settings};

use crate::error::{ConfigError, InvalidEventName, SourceLocation};
use crate::model::*;

/// Extract source location from a KDL node's name span
fn get_node_location(node: &kdl::KdlNode, source: &str) -> SourceLocation {
    let span = node.name().span();
    let (line, column) = offset_to_line_col(source, span.offset());
    SourceLocation::new(line, column, span.offset(), span.len())
}

/// Extract source location from a KDL entry
fn get_entry_location(entry: &kdl::KdlEntry, source: &str) -> SourceLocation {
    let span = entry.span();
    let (line, column) = offset_to_line_col(source, span.offset());
    SourceLocation::new(line, column, span.offset(), span.len())
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl depends on an older miette; rebuild the span from offset/len
        let span = miette::SourceSpan::from((e.span.offset(), e.span.len()));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();
    let mut invalid = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "settings" => {
                config.settings = parse_settings(node)?;
            }
            "aliases" => {
                config.aliases.extend(parse_aliases(node, content, &mut invalid)?);
            }
            "controller" => {
                config.controllers.push(parse_controller(node, content, &mut invalid)?);
            }
            "keymap" => {
                config.keymap.extend(parse_keymap(node)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    if !invalid.is_empty() {
        return Err(ConfigError::InvalidEventNames {
            src: content.to_string(),
            names: invalid,
        });
    }

    config.settings.validate()?;
    Ok(config)
}

fn first_string(node: &kdl::KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

fn first_integer(node: &kdl::KdlNode) -> Result<i64, ConfigError> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_i64())
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' expects an integer", node.name().value()),
        })
}

fn first_unsigned(node: &kdl::KdlNode) -> Result<u64, ConfigError> {
    let value = first_integer(node)?;
    u64::try_from(value).map_err(|_| ConfigError::Invalid {
        message: format!("'{}' must not be negative, got {}", node.name().value(), value),
    })
}

fn first_bool(node: &kdl::KdlNode) -> Result<bool, ConfigError> {
    // A bare `unique-numpad` switches the option on
    match node.entries().iter().find(|e| e.name().is_none()) {
        None => Ok(true),
        Some(entry) => entry.value().as_bool().ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' expects true or false", node.name().value()),
        }),
    }
}

fn first_number(node: &kdl::KdlNode) -> Result<f64, ConfigError> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_f64().or_else(|| e.value().as_i64().map(|v| v as f64)))
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' expects a number", node.name().value()),
        })
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = first_string(child) {
                        global.log_level = val.parse().map_err(|e| ConfigError::Invalid {
                            message: e,
                        })?;
                    }
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_settings(node: &kdl::KdlNode) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let Some(children) = node.children() else {
        return Ok(settings);
    };
    for child in children.nodes() {
        match child.name().value() {
            "sequence-timeout" => settings.sequence_timeout_ms = first_unsigned(child)?,
            "max-sequence-buf" => {
                let value = first_unsigned(child)?;
                settings.max_sequence_buf = usize::try_from(value).map_err(|_| ConfigError::Invalid {
                    message: format!("max-sequence-buf is too large: {}", value),
                })?;
            }
            "unique-numpad" => settings.unique_numpad = first_bool(child)?,
            "no-key-repeat" => settings.no_key_repeat = first_bool(child)?,
            "swipe-threshold" => settings.swipe_threshold = first_number(child)?,
            "gamepad-interval" => settings.gamepad_interval_ms = first_unsigned(child)?,
            "gamepad-check-interval" => settings.gamepad_check_interval_ms = first_unsigned(child)?,
            "platform" => {
                let value = first_string(child).ok_or_else(|| ConfigError::MissingField {
                    field: "platform name (e.g., `platform \"macos\"`)".to_string(),
                })?;
                settings.platform = value
                    .parse::<Platform>()
                    .map_err(|message| ConfigError::Invalid { message })?;
            }
            "listen" => {
                let mut listen = Vec::new();
                for entry in child.entries() {
                    let Some(name) = entry.value().as_string() else {
                        continue;
                    };
                    let modality = name
                        .parse::<Modality>()
                        .map_err(|message| ConfigError::Invalid { message })?;
                    if !listen.contains(&modality) {
                        listen.push(modality);
                    }
                }
                if listen.is_empty() {
                    return Err(ConfigError::MissingField {
                        field: "at least one modality for `listen`".to_string(),
                    });
                }
                settings.listen = listen;
            }
            name => {
                tracing::warn!("Unknown setting: {}", name);
            }
        }
    }

    Ok(settings)
}

/// Check `target` with the event-name grammar, recording every problem found.
fn check_event_name(
    target: &str,
    context: &str,
    location: SourceLocation,
    invalid: &mut Vec<InvalidEventName>,
) {
    for problem in EventSpec::parse(target).problems() {
        invalid.push(InvalidEventName {
            name: target.to_string(),
            context: context.to_string(),
            problem: problem.to_string(),
            line: location.line,
            column: location.column,
            span: miette::SourceSpan::from((location.offset, location.len)),
        });
    }
}

/// `name "target"` pairs from a node's children.
fn parse_pairs(
    node: &kdl::KdlNode,
    context: &str,
    source: &str,
    invalid: &mut Vec<InvalidEventName>,
) -> Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let name = child.name().value().to_string();
            let Some(entry) = child.entries().iter().find(|e| e.name().is_none()) else {
                return Err(ConfigError::MissingField {
                    field: format!("target for '{}' in {} (e.g., `{} \"ctrl-s\"`)", name, context, name),
                });
            };
            let Some(target) = entry.value().as_string() else {
                return Err(ConfigError::Invalid {
                    message: format!("target for '{}' in {} must be a string", name, context),
                });
            };
            check_event_name(&name, context, get_node_location(child, source), invalid);
            check_event_name(target, context, get_entry_location(entry, source), invalid);
            pairs.push((name, target.to_string()));
        }
    }

    Ok(pairs)
}

fn parse_aliases(
    node: &kdl::KdlNode,
    source: &str,
    invalid: &mut Vec<InvalidEventName>,
) -> Result<Vec<(String, String)>, ConfigError> {
    parse_pairs(node, "aliases", source, invalid)
}

fn parse_controller(
    node: &kdl::KdlNode,
    source: &str,
    invalid: &mut Vec<InvalidEventName>,
) -> Result<ControllerLayout, ConfigError> {
    let name = first_string(node).ok_or_else(|| ConfigError::MissingField {
        field: "controller name (e.g., `controller \"standard\" { ... }`)".to_string(),
    })?;

    // A built-in layout's name loads it; children add to or override it
    let mut layout = ControllerLayout::builtin(name).unwrap_or_else(|| ControllerLayout::new(name));
    let context = format!("controller '{}'", name);
    for (alias, target) in parse_pairs(node, &context, source, invalid)? {
        layout = layout.with_alias(alias, target);
    }

    if layout.aliases.is_empty() {
        tracing::warn!("Controller '{}' defines no buttons", name);
    }
    Ok(layout)
}

fn parse_keymap(node: &kdl::KdlNode) -> Result<Vec<KeyOverride>, ConfigError> {
    let mut keys = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "key" => keys.push(parse_key_override(child)?),
                name => {
                    tracing::warn!("Unknown keymap option: {}", name);
                }
            }
        }
    }

    Ok(keys)
}

fn parse_key_override(node: &kdl::KdlNode) -> Result<KeyOverride, ConfigError> {
    let mut args = node.entries().iter().filter(|e| e.name().is_none());
    let code = args
        .next()
        .and_then(|e| e.value().as_i64())
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ConfigError::MissingField {
            field: "key code (e.g., `key 173 \"AudioVolumeMute\"`)".to_string(),
        })?;
    let name = args
        .next()
        .and_then(|e| e.value().as_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ConfigError::MissingField {
            field: format!("key name for code {}", code),
        })?
        .to_string();

    let location = match node.get("location").and_then(|e| e.value().as_string()) {
        Some(value) => value
            .parse::<KeyLocation>()
            .map_err(|message| ConfigError::Invalid { message })?,
        None => KeyLocation::Standard,
    };

    Ok(KeyOverride {
        code,
        name,
        location,
    })
}
