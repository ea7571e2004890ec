use thiserror::Error;

/// Errors raised when engine settings are rejected.
///
/// Input handling itself never fails; these only surface when an engine is
/// constructed or re-configured with values it cannot work with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("max-sequence-buf must be at least 1")]
    EmptySequenceBuffer,

    #[error("max-sequence-buf must be at most {max}, got {value}")]
    SequenceBufferTooLarge { value: usize, max: usize },

    #[error("sequence-timeout must be greater than zero")]
    ZeroSequenceTimeout,

    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("swipe-threshold must be a non-negative number, got {value}")]
    InvalidSwipeThreshold { value: f64 },
}
