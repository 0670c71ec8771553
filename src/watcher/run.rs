//! Watch loop

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{SpecmillError, SpecmillResult};
use crate::pipeline;

use super::event::{PipelineEvent, WatchOptions};

/// Watch the source document and bibliography files, rebuilding on change.
///
/// The initial build must succeed (startup failures are fatal); builds
/// triggered by later edits report errors as events and keep the loop alive
/// so the author can fix the file and save again. Returns when `running`
/// flips to false.
pub fn watch(
    options: &WatchOptions,
    running: Arc<AtomicBool>,
    on_event: impl Fn(&PipelineEvent),
) -> SpecmillResult<()> {
    let source = options.root.join(&options.config.build.source);
    on_event(&PipelineEvent::WatchStarted {
        source: source.display().to_string(),
    });

    run_build(options, &on_event)?;

    let watched = watched_inputs(options);
    let dirs: HashSet<PathBuf> = watched
        .iter()
        .filter_map(|p| p.parent().map(PathBuf::from))
        .collect();
    let watched: HashSet<PathBuf> = watched
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| SpecmillError::Io(std::io::Error::other(e.to_string())))?;

    for dir in &dirs {
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| SpecmillError::Io(std::io::Error::other(e.to_string())))?;
    }

    while running.load(Ordering::SeqCst) {
        if let Ok(path) = rx.recv_timeout(Duration::from_millis(50)) {
            let canonical = path.canonicalize().unwrap_or(path);
            if !watched.contains(&canonical) {
                continue;
            }
            on_event(&PipelineEvent::FileChanged {
                path: canonical.display().to_string(),
            });
            // One build per change event; failures were already reported
            let _ = run_build(options, &on_event);
        }
    }

    on_event(&PipelineEvent::Shutdown);
    Ok(())
}

/// Inputs whose modification triggers a rebuild
fn watched_inputs(options: &WatchOptions) -> Vec<PathBuf> {
    let mut inputs = vec![options.root.join(&options.config.build.source)];
    for biblio in &options.config.build.biblio {
        inputs.push(options.root.join(biblio));
    }
    inputs
}

fn run_build(options: &WatchOptions, on_event: &impl Fn(&PipelineEvent)) -> SpecmillResult<()> {
    on_event(&PipelineEvent::BuildStarted);
    match pipeline::build(&options.root, &options.config) {
        Ok(report) => {
            for warning in &report.warnings {
                on_event(&PipelineEvent::Warning {
                    message: warning.to_string(),
                });
            }
            on_event(&PipelineEvent::BuildFinished {
                output: report.output.display().to_string(),
                warnings: report.warnings.len(),
            });
            Ok(())
        }
        Err(e) => {
            on_event(&PipelineEvent::Error {
                message: e.to_string(),
            });
            Err(e)
        }
    }
}
