//! specmill CLI
//!
//! Usage: specmill [COMMAND]
//!
//! Commands:
//!   build   Render the source document to the output file (default)
//!   clean   Remove the generated output
//!   watch   Rebuild on every source or bibliography change
//!   start   Watch and serve a live-reloading local preview

mod cli;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;

use specmill::config::Config;
use specmill::pipeline;
use specmill::server::{serve, ServeOptions};
use specmill::watcher::{watch, PipelineEvent, WatchOptions};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Some(Commands::Build { source }) => cmd_build(source, json),
        Some(Commands::Clean) => cmd_clean(json, cli.verbose),
        Some(Commands::Watch { source }) => cmd_watch(source, json),
        Some(Commands::Start { source, port }) => cmd_start(source, port, json),
        None => cmd_build(None, json),
    }
}

/// Resolve the project root (cwd) and its configuration.
fn load_config(source: Option<PathBuf>) -> Result<(PathBuf, Config)> {
    let root = std::env::current_dir().context("failed to resolve current directory")?;
    let mut config = Config::load(&root)?;
    if let Some(source) = source {
        config.build.source = source;
    }
    Ok((root, config))
}

fn cmd_build(source: Option<PathBuf>, json: bool) -> Result<()> {
    let (root, config) = load_config(source)?;

    if json {
        emit(&PipelineEvent::BuildStarted, true);
    }
    let report = pipeline::build(&root, &config)?;

    for warning in &report.warnings {
        if json {
            emit(
                &PipelineEvent::Warning {
                    message: warning.to_string(),
                },
                true,
            );
        } else {
            eprintln!("warning: {warning}");
        }
    }

    if json {
        emit(
            &PipelineEvent::BuildFinished {
                output: report.output.display().to_string(),
                warnings: report.warnings.len(),
            },
            true,
        );
    } else {
        println!("{}Built {}", ok_icon(), report.output.display());
        if !report.warnings.is_empty() {
            println!("  {} warning(s) from renderer", report.warnings.len());
        }
    }

    Ok(())
}

fn cmd_clean(json: bool, verbose: u8) -> Result<()> {
    let (root, config) = load_config(None)?;
    let removed = pipeline::clean(&root, &config)?;

    if json {
        emit(
            &PipelineEvent::Cleaned {
                removed: removed.len(),
            },
            true,
        );
        return Ok(());
    }

    if removed.is_empty() {
        println!("{}Nothing to clean", ok_icon());
    } else {
        println!("{}Removed {} file(s)", ok_icon(), removed.len());
        if verbose > 0 {
            for path in &removed {
                println!("  {}", path.display());
            }
        }
    }
    Ok(())
}

fn cmd_watch(source: Option<PathBuf>, json: bool) -> Result<()> {
    let (root, config) = load_config(source)?;
    let running = install_ctrlc()?;

    let options = WatchOptions { root, config };
    watch(&options, running, move |e| emit(e, json))?;
    Ok(())
}

fn cmd_start(source: Option<PathBuf>, port: Option<u16>, json: bool) -> Result<()> {
    let (root, config) = load_config(source)?;
    let running = install_ctrlc()?;
    let port = port.unwrap_or(config.serve.port);
    let output = config.build.output.clone();

    // Watch and serve are independent tasks; the output file on disk is
    // their only shared state.
    let watch_options = WatchOptions {
        root: root.clone(),
        config,
    };
    let watch_running = running.clone();
    let watch_handle = std::thread::spawn(move || {
        let result = watch(&watch_options, watch_running.clone(), move |e| emit(e, json));
        if result.is_err() {
            // Take the server down with us
            watch_running.store(false, Ordering::SeqCst);
        }
        result
    });

    let serve_options = ServeOptions { root, output, port };
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let serve_result = runtime.block_on(serve(serve_options, running.clone(), move |e| {
        emit(e, json)
    }));

    running.store(false, Ordering::SeqCst);
    match watch_handle.join() {
        Ok(watch_result) => watch_result?,
        Err(_) => anyhow::bail!("watch task panicked"),
    }
    serve_result?;
    Ok(())
}

fn install_ctrlc() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl+C handler")?;
    Ok(running)
}

/// Print one pipeline event, as NDJSON or a timestamped human line.
fn emit(event: &PipelineEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }

    let ts = chrono::Local::now().format("%H:%M:%S");
    match event {
        PipelineEvent::WatchStarted { source } => {
            println!("[{ts}] Watching {source} (Ctrl+C to stop)");
        }
        PipelineEvent::FileChanged { path } => println!("[{ts}] Changed: {path}"),
        PipelineEvent::BuildStarted => println!("[{ts}] Building..."),
        PipelineEvent::BuildFinished { output, warnings } => {
            if *warnings > 0 {
                println!("[{ts}] Built {output} ({warnings} warnings)");
            } else {
                println!("[{ts}] Built {output}");
            }
        }
        PipelineEvent::Warning { message } => eprintln!("warning: {message}"),
        PipelineEvent::Cleaned { removed } => println!("[{ts}] Removed {removed} file(s)"),
        PipelineEvent::ServeStarted { addr } => println!("[{ts}] Serving at {addr}"),
        PipelineEvent::ReloadSent => println!("[{ts}] Reload pushed to connected clients"),
        PipelineEvent::Error { message } => eprintln!("[{ts}] Error: {message}"),
        PipelineEvent::Shutdown => println!("[{ts}] Stopped"),
    }
}

fn ok_icon() -> &'static str {
    if std::io::stdout().is_terminal() {
        "✓ "
    } else {
        ""
    }
}
