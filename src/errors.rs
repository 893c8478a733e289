use std::io;
use thiserror::Error;

/// Errors that can occur while detecting, selecting or driving a renderer
#[derive(Error, Debug)]
pub enum RenderError {
    /// Bad payload, dimensions or other caller-supplied value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not valid in the renderer's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Renderer was disposed
    #[error("Renderer has been disposed")]
    Disposed,

    /// Image or escape-sequence encoding failed
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error related to IO operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// True for the argument-validation class
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// True for the state class (not initialized, frame misuse, unknown image)
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

/// Type alias for Result with RenderError
pub type Result<T> = std::result::Result<T, RenderError>;
