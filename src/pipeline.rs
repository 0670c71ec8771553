//! Build and clean orchestration
//!
//! A build is read -> render -> rename: inputs are checked up front, the
//! renderer writes into a scratch file next to the real output, and the
//! scratch file is renamed over the fixed output path only on success. A
//! failed render therefore never clobbers the previous artifact.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{SpecmillError, SpecmillResult};
use crate::renderer::{Renderer, Warning};

/// Prefix for renderer scratch files (cleaned up by `clean`)
const SCRATCH_PREFIX: &str = ".specmill-";

/// Result of a successful build
#[derive(Debug)]
pub struct BuildReport {
    /// Absolute path of the written artifact
    pub output: PathBuf,
    /// Non-fatal renderer diagnostics
    pub warnings: Vec<Warning>,
}

/// Run one build: verify inputs, render to a scratch file, rename into place.
pub fn build(root: &Path, config: &Config) -> SpecmillResult<BuildReport> {
    let source = root.join(&config.build.source);
    if !source.is_file() {
        return Err(SpecmillError::InputMissing { path: source });
    }

    let biblio: Vec<PathBuf> = config.build.biblio.iter().map(|b| root.join(b)).collect();
    for biblio_file in &biblio {
        if !biblio_file.is_file() {
            return Err(SpecmillError::InputMissing {
                path: biblio_file.clone(),
            });
        }
    }

    let output = root.join(&config.build.output);
    let out_dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let out_dir = out_dir.unwrap_or(root);
    std::fs::create_dir_all(out_dir)?;

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(".html")
        .tempfile_in(out_dir)?;

    let renderer = Renderer::new(&config.renderer);
    let outcome = renderer.render(&source, &biblio, scratch.path())?;

    // Same-directory rename, so the overwrite is atomic
    scratch
        .persist(&output)
        .map_err(|e| SpecmillError::Io(e.error))?;

    Ok(BuildReport {
        output,
        warnings: outcome.warnings,
    })
}

/// Remove the generated artifact and any leftover renderer scratch files.
///
/// Absent files are not an error; deletion failures are.
pub fn clean(root: &Path, config: &Config) -> SpecmillResult<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let output = root.join(&config.build.output);
    match std::fs::remove_file(&output) {
        Ok(()) => removed.push(output.clone()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let out_dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let out_dir = out_dir.unwrap_or(root);
    let entries = match std::fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let is_scratch = name
            .to_str()
            .map(|n| n.starts_with(SCRATCH_PREFIX) && n.ends_with(".html"))
            .unwrap_or(false);
        if is_scratch {
            std::fs::remove_file(entry.path())?;
            removed.push(entry.path());
        }
    }

    Ok(removed)
}
