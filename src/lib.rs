//! specmill - build, watch, and preview pipeline for spec documents
//!
//! specmill turns a structured markup specification (an ecmarkup-style
//! dialect) into a single static HTML file by orchestrating an external
//! renderer, and can keep that file rebuilt and served with live reload
//! while the document is being edited.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod server;
pub mod watcher;

// Re-exports for convenience
pub use config::Config;
pub use error::{SpecmillError, SpecmillResult};
pub use pipeline::{build, clean, BuildReport};
pub use renderer::{parse_warning, Renderer, Warning};
pub use server::{serve, ServeOptions};
pub use watcher::{watch, PipelineEvent, WatchOptions};
