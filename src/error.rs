//! Error types for chip loading and engine setup.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by a chip core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChipError {
    /// The binary module could not be compiled.
    #[error("chip module failed to compile: {0}")]
    Compile(String),

    /// The module compiled but could not be instantiated.
    #[error("chip module failed to instantiate: {0}")]
    Instantiate(String),

    /// A required function or memory export is missing or has the wrong type.
    #[error("chip module is missing export '{0}'")]
    MissingExport(&'static str),

    /// A call into the chip core trapped.
    #[error("chip call '{call}' failed: {reason}")]
    Trap {
        /// Name of the failing call.
        call: &'static str,
        /// Trap description.
        reason: String,
    },

    /// Sample output offset lies outside the chip's memory.
    #[error("chip memory read at offset {0} is out of bounds")]
    MemoryOutOfBounds(usize),
}

/// Errors raised while setting up the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Chip core failure.
    #[error(transparent)]
    Chip(#[from] ChipError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
