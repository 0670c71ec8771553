//! Configuration loading for specmill
//!
//! Configuration lives in an optional `specmill.toml` at the project root.
//! Every field has a default, so a missing file means "all defaults".

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SpecmillError, SpecmillResult};

/// Name of the config file looked up at the project root
pub const CONFIG_FILE: &str = "specmill.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// `[build]` section: pipeline inputs and output
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Structured markup source document
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Fixed output filename at the project root
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Bibliography files handed through to the renderer
    #[serde(default = "default_biblio")]
    pub biblio: Vec<PathBuf>,
}

/// `[renderer]` section: the external rendering collaborator
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    /// Renderer executable
    #[serde(default = "default_renderer_command")]
    pub command: String,
    /// Extra arguments inserted before the input/output paths
    #[serde(default)]
    pub args: Vec<String>,
}

/// `[serve]` section: local preview server
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_source() -> PathBuf {
    PathBuf::from("spec.emu")
}

fn default_output() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_biblio() -> Vec<PathBuf> {
    vec![
        PathBuf::from("biblio/no-remote.json"),
        PathBuf::from("biblio/local.json"),
    ]
}

fn default_renderer_command() -> String {
    "ecmarkup".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            biblio: default_biblio(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_renderer_command(),
            args: Vec::new(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from `<root>/specmill.toml`.
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(root: &Path) -> SpecmillResult<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| SpecmillError::Config {
            path,
            message: e.message().to_string(),
        })
    }
}
