//! Pipeline event types and watch options

use std::path::PathBuf;

use crate::config::Config;

/// Options for the watch loop
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Project root (config paths are resolved against it)
    pub root: PathBuf,
    pub config: Config,
}

/// Lifecycle events emitted by build, watch, and serve.
///
/// Serialized one-per-line as NDJSON when `--json` is set.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    WatchStarted {
        source: String,
    },
    FileChanged {
        path: String,
    },
    BuildStarted,
    BuildFinished {
        output: String,
        warnings: usize,
    },
    Warning {
        message: String,
    },
    Cleaned {
        removed: usize,
    },
    ServeStarted {
        addr: String,
    },
    ReloadSent,
    Error {
        message: String,
    },
    Shutdown,
}
