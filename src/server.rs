//! Local preview server
//!
//! Serves the project root as static files and keeps browsers fresh: the
//! generated HTML is served with a small live-reload script injected, and a
//! file watcher on the output artifact pushes refresh notifications to
//! connected clients through a long-polled endpoint. The server and the
//! watch loop share nothing in-process; the output file on disk is their
//! only coupling.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::error::{SpecmillError, SpecmillResult};
use crate::watcher::PipelineEvent;

/// Endpoint long-polled by the injected client script
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// How long a poll parks before answering "none"
const POLL_TIMEOUT: Duration = Duration::from_secs(25);

const LIVERELOAD_SCRIPT: &str = r#"<script>
(async () => {
  for (;;) {
    try {
      const res = await fetch("/__livereload");
      if ((await res.text()) === "reload") location.reload();
    } catch {
      await new Promise((r) => setTimeout(r, 1000));
    }
  }
})();
</script>
"#;

/// Options for the preview server
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Directory served as the site root
    pub root: PathBuf,
    /// Generated artifact, relative to `root`
    pub output: PathBuf,
    pub port: u16,
}

struct ServerState {
    output: PathBuf,
    reload: broadcast::Sender<()>,
}

/// Run the preview server until `running` flips to false.
///
/// Binding the port is the first fallible step, so a taken port fails fast
/// before any watcher or route is set up to matter.
pub async fn serve(
    options: ServeOptions,
    running: Arc<AtomicBool>,
    on_event: impl Fn(&PipelineEvent) + Send + Sync + 'static,
) -> SpecmillResult<()> {
    let on_event: Arc<dyn Fn(&PipelineEvent) + Send + Sync> = Arc::new(on_event);

    let addr = format!("127.0.0.1:{}", options.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SpecmillError::Bind {
            addr: addr.clone(),
            source: e,
        })?;

    let output = options.root.join(&options.output);
    let (reload_tx, _) = broadcast::channel(16);
    // Held for the server's lifetime; dropping it stops the notifications
    let _output_watcher = spawn_output_watcher(&output, reload_tx.clone(), on_event.clone())?;

    let state = Arc::new(ServerState {
        output,
        reload: reload_tx,
    });

    let mut router = Router::new()
        .route("/", get(artifact_handler))
        .route(LIVERELOAD_PATH, get(livereload_handler));
    // Direct requests for the artifact get the injected script too
    if let Some(name) = options.output.file_name().and_then(|n| n.to_str()) {
        router = router.route(&format!("/{name}"), get(artifact_handler));
    }
    let app = router
        .fallback_service(ServeDir::new(&options.root))
        .with_state(state);

    on_event(&PipelineEvent::ServeStarted {
        addr: format!("http://{addr}"),
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await?;

    Ok(())
}

/// Watch the generated artifact; each change pushes a refresh to clients.
fn spawn_output_watcher(
    output: &Path,
    reload: broadcast::Sender<()>,
    on_event: Arc<dyn Fn(&PipelineEvent) + Send + Sync>,
) -> SpecmillResult<RecommendedWatcher> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;

    let name: Option<OsString> = output.file_name().map(OsString::from);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if event.paths.iter().any(|p| p.file_name() == name.as_deref()) {
                    // send() only succeeds while a client is polling
                    if reload.send(()).is_ok() {
                        on_event(&PipelineEvent::ReloadSent);
                    }
                }
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| SpecmillError::Io(std::io::Error::other(e.to_string())))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| SpecmillError::Io(std::io::Error::other(e.to_string())))?;

    Ok(watcher)
}

async fn artifact_handler(State(state): State<Arc<ServerState>>) -> Response {
    match tokio::fs::read_to_string(&state.output).await {
        Ok(html) => Html(inject_livereload(&html)).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            "output has not been built yet - run `specmill build` first",
        )
            .into_response(),
    }
}

async fn livereload_handler(State(state): State<Arc<ServerState>>) -> &'static str {
    let mut rx = state.reload.subscribe();
    match tokio::time::timeout(POLL_TIMEOUT, rx.recv()).await {
        Ok(Ok(())) => "reload",
        // Lagged still means the artifact changed at least once
        Ok(Err(broadcast::error::RecvError::Lagged(_))) => "reload",
        _ => "none",
    }
}

/// Insert the live-reload script before `</body>`, or append it when the
/// document has no closing body tag.
fn inject_livereload(html: &str) -> String {
    match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + LIVERELOAD_SCRIPT.len());
            out.push_str(&html[..idx]);
            out.push_str(LIVERELOAD_SCRIPT);
            out.push_str(&html[idx..]);
            out
        }
        None => {
            let mut out = html.to_string();
            out.push_str(LIVERELOAD_SCRIPT);
            out
        }
    }
}
