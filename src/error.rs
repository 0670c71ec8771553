//! Error types for specmill
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for specmill operations
pub type SpecmillResult<T> = Result<T, SpecmillError>;

/// Main error type for specmill operations
#[derive(Error, Debug)]
pub enum SpecmillError {
    /// Source document or bibliography input is missing/unreadable
    #[error("input not found: {path}")]
    InputMissing { path: PathBuf },

    /// Renderer binary could not be spawned
    #[error("renderer '{command}' not found on PATH - install it or set [renderer].command in specmill.toml")]
    RendererNotFound { command: String },

    /// Renderer ran but exited non-zero
    #[error("renderer exited with status {status}: {detail}")]
    RendererFailed { status: i32, detail: String },

    /// Malformed specmill.toml
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Preview server could not bind its port
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
