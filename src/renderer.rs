//! External renderer invocation
//!
//! The markup-to-HTML transformation is delegated entirely to an external
//! program (ecmarkup by default). This module spawns it, hands it the source
//! document and bibliography files, and turns its stderr chatter into
//! structured warnings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::RendererConfig;
use crate::error::{SpecmillError, SpecmillResult};

/// A non-fatal diagnostic emitted by the renderer.
///
/// Position fields are filled when the renderer reports `file:line:col`
/// context; positionless lines are carried as bare messages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Warning {
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => {
                write!(f, "{}:{}:{}: {}", file.display(), line, column, self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Result of a successful renderer run
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub warnings: Vec<Warning>,
}

/// Handle to the external rendering collaborator
#[derive(Debug, Clone)]
pub struct Renderer {
    command: String,
    extra_args: Vec<String>,
}

impl Renderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            command: config.command.clone(),
            extra_args: config.args.clone(),
        }
    }

    /// Run the renderer: `<command> [args] --load-biblio <b>... <source> <output>`.
    ///
    /// Stderr is captured and parsed into warnings; a non-zero exit is fatal
    /// and the output file must be treated as garbage by the caller.
    pub fn render(
        &self,
        source: &Path,
        biblio: &[PathBuf],
        output: &Path,
    ) -> SpecmillResult<RenderOutcome> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.extra_args);
        for biblio_file in biblio {
            cmd.arg("--load-biblio").arg(biblio_file);
        }
        cmd.arg(source).arg(output);

        let result = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpecmillError::RendererNotFound {
                    command: self.command.clone(),
                }
            } else {
                SpecmillError::Io(e)
            }
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr);

        if !result.status.success() {
            return Err(SpecmillError::RendererFailed {
                status: result.status.code().unwrap_or(-1),
                detail: stderr.trim().to_string(),
            });
        }

        let warnings = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(parse_warning)
            .collect();

        Ok(RenderOutcome { warnings })
    }
}

/// Parse one stderr line into a [`Warning`].
///
/// Accepts an optional `warning:` prefix, then tries `file:line:col: message`;
/// anything that doesn't fit that shape becomes a positionless warning.
pub fn parse_warning(line: &str) -> Warning {
    let trimmed = line.trim();
    let body = trimmed
        .strip_prefix("warning:")
        .or_else(|| trimmed.strip_prefix("Warning:"))
        .map(str::trim)
        .unwrap_or(trimmed);

    parse_positioned(body).unwrap_or_else(|| Warning {
        file: None,
        line: None,
        column: None,
        message: body.to_string(),
    })
}

fn parse_positioned(body: &str) -> Option<Warning> {
    let mut parts = body.splitn(4, ':');
    let file = parts.next()?;
    let line: u32 = parts.next()?.trim().parse().ok()?;
    let column: u32 = parts.next()?.trim().parse().ok()?;
    let message = parts.next()?.trim();
    if file.is_empty() || message.is_empty() {
        return None;
    }
    Some(Warning {
        file: Some(PathBuf::from(file)),
        line: Some(line),
        column: Some(column),
        message: message.to_string(),
    })
}
