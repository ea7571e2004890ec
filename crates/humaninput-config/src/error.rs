use miette::Diagnostic;
use thiserror::Error;

use humaninput_core::SettingsError;

/// Where a node or entry starts in the configuration source (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub len: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize, len: usize) -> Self {
        Self {
            line,
            column,
            offset,
            len,
        }
    }
}

/// One event name the grammar flagged, with where it was written.
#[derive(Error, Diagnostic, Debug)]
#[error("{line}:{column}: invalid event name '{name}' in {context}: {problem}")]
#[diagnostic(code(humaninput::config::invalid_event_name))]
pub struct InvalidEventName {
    pub name: String,
    pub context: String,
    pub problem: String,
    pub line: usize,
    pub column: usize,
    #[label("{problem}")]
    pub span: miette::SourceSpan,
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(humaninput::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(humaninput::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(humaninput::config::missing_field))]
    MissingField { field: String },

    #[error("{} invalid event name(s)", .names.len())]
    #[diagnostic(
        code(humaninput::config::invalid_event_names),
        help("Event names are chords joined with '-' or '->', separated by spaces for sequences")
    )]
    InvalidEventNames {
        #[source_code]
        src: String,
        #[related]
        names: Vec<InvalidEventName>,
    },

    #[error("Settings rejected: {0}")]
    #[diagnostic(code(humaninput::config::settings))]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
