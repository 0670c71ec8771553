//! Test environment builder for isolated specmill testing.

use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

use tempfile::TempDir;

/// Minimal source document used by most tests
pub const DEFAULT_SPEC: &str = "<emu-clause id=\"sec-grouped-accessors\">\n\
<h1>Grouped Accessors</h1>\n\
</emu-clause>\n";

const CONFIG: &str = r#"[build]
source = "spec.emu"
output = "index.html"
biblio = ["biblio/no-remote.json", "biblio/local.json"]

[renderer]
command = "./fake-ecmarkup.sh"
"#;

/// Stand-in for ecmarkup: wraps the source in an HTML shell.
///
/// `FAKE_WARN` makes it print a positioned warning to stderr; `FAKE_FAIL`
/// makes it exit non-zero without writing output.
const FAKE_RENDERER: &str = r#"#!/bin/sh
src=""
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--load-biblio" ]; then
    shift
  elif [ -z "$src" ]; then
    src="$1"
  else
    out="$1"
  fi
  shift
done
if [ -n "$FAKE_WARN" ]; then
  echo "warning: $src:3:7: broken cross-reference to #sec-missing" >&2
fi
if [ -n "$FAKE_FAIL" ]; then
  echo "render exploded" >&2
  exit 1
fi
{
  printf '<!doctype html>\n<html><body>\n'
  cat "$src"
  printf '</body></html>\n'
} > "$out"
"#;

/// Result of running a specmill CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated project directory with CLI execution helpers
pub struct TestEnv {
    pub project: TempDir,
}

impl TestEnv {
    /// Create a project with source, biblio files, config, and fake renderer.
    pub fn new() -> Self {
        let project = TempDir::new().expect("failed to create temp project");
        let env = Self { project };
        env.write("spec.emu", DEFAULT_SPEC);
        env.write("biblio/no-remote.json", "[]\n");
        env.write("biblio/local.json", "{\"entries\":[]}\n");
        env.write("specmill.toml", CONFIG);
        env.install_fake_renderer();
        env
    }

    fn install_fake_renderer(&self) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path("fake-ecmarkup.sh");
        std::fs::write(&path, FAKE_RENDERER).expect("failed to write fake renderer");
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("failed to chmod fake renderer");
    }

    /// Get a path relative to the project root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.project.path().join(relative)
    }

    /// Write a file under the project root, creating parent directories
    pub fn write(&self, relative: &str, content: &str) {
        let full = self.path(relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create directories");
        }
        std::fs::write(&full, content).expect("failed to write file");
    }

    /// Read a file under the project root
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("failed to read {relative}: {e}"))
    }

    /// Run specmill to completion in this project
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run specmill to completion with extra environment variables
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let output = self
            .command(args, env_vars)
            .output()
            .expect("failed to execute specmill");
        Self::output_to_result(output)
    }

    /// Spawn a long-running specmill command (watch/start) with piped output
    pub fn spawn(&self, args: &[&str]) -> Child {
        self.command(args, &[])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn specmill")
    }

    fn command(&self, args: &[&str], env_vars: &[(&str, &str)]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_specmill"));
        cmd.current_dir(self.project.path()).args(args);
        for (key, value) in env_vars {
            cmd.env(key, value);
        }
        cmd
    }

    fn output_to_result(output: Output) -> TestResult {
        TestResult {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Kill a spawned child and return its captured stdout
pub fn stop(mut child: Child) -> String {
    let _ = child.kill();
    let output = child.wait_with_output().expect("failed to reap child");
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Pick a port that was free a moment ago
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("failed to bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

/// Poll until a TCP connect on `port` succeeds (or give up after 5s)
pub fn wait_for_server(port: u16) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    panic!("server on port {port} never came up");
}

/// Tiny HTTP/1.1 client; returns status line + headers + body as one string
pub fn http_get(port: u16, path: &str) -> String {
    use std::io::{Read, Write};
    let mut stream =
        std::net::TcpStream::connect(("127.0.0.1", port)).expect("failed to connect");
    write!(
        stream,
        "GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"
    )
    .expect("failed to send request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .expect("failed to read response");
    response
}
