//! File watcher for continuous rebuilds
//!
//! Implements the `watch` command: one initial build, then one rebuild per
//! change to the source document or a bibliography file. Rapid successive
//! saves schedule redundant sequential builds rather than being coalesced.

mod event;
mod run;

pub use event::{PipelineEvent, WatchOptions};
pub use run::watch;
