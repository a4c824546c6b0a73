//! Control plane access through `kubectl`.
//!
//! Every operation is one `kubectl` invocation bounded by the configured
//! command timeout. A process that outlives the timeout is killed.

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use queryrun_core::{RequestId, ResourcePhase};

use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::manifest::ResourceManifest;

/// Maximum stdout or stderr captured per stream (4 MiB).
const MAX_OUTPUT_BYTES: u64 = 4 * 1024 * 1024;

/// Field selector for the query phase.
const PHASE_PATH: &str = "jsonpath={.status.phase}";

/// Field selector for the serialized result of the first response.
const RESULT_PATH: &str = "jsonpath={.status.responses[0].content}";

/// Field selector listing resource names.
const NAMES_PATH: &str = "jsonpath={.items[*].metadata.name}";

/// Resource kinds that can be listed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Agents,
    Tools,
}

impl ListKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Agents => "agents",
            Self::Tools => "tools",
        }
    }
}

/// Operations the client needs from the control plane.
///
/// Implement this trait to reach the control plane some other way than
/// through `kubectl`.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Submit a manifest, returning the name of the created resource.
    async fn create(&self, manifest: &ResourceManifest) -> Result<RequestId, GatewayError>;

    /// Read the current phase. Missing or unrecognized phases are `Unknown`.
    async fn read_phase(&self, id: &RequestId) -> Result<ResourcePhase, GatewayError>;

    /// Read the raw result field. An empty field is not an error.
    async fn read_result_field(&self, id: &RequestId) -> Result<String, GatewayError>;

    /// Delete the resource, treating absence as success.
    ///
    /// Never fails; the outcome is reported as a boolean and logged.
    async fn delete(&self, id: &RequestId) -> bool;

    /// List the names of the resources of one kind.
    async fn list_names(&self, kind: ListKind) -> Result<Vec<String>, GatewayError>;
}

/// Captured output of a successful command.
#[derive(Debug)]
struct CommandOutput {
    stdout: String,
    duration_ms: u64,
}

/// [`ResourceGateway`] backed by the `kubectl` CLI.
#[derive(Debug, Clone)]
pub struct KubectlGateway {
    /// Path to the `kubectl` executable.
    kubectl_path: String,

    /// Arguments placed before every subcommand.
    global_args: Vec<String>,

    /// Namespace queries are read from and deleted in.
    namespace: String,

    /// Upper bound per invocation.
    timeout: Duration,
}

impl KubectlGateway {
    /// Create a gateway from the client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            kubectl_path: config.kubectl_path.clone(),
            global_args: config.global_args.clone(),
            namespace: config.namespace.clone(),
            timeout: config.command_timeout,
        }
    }

    /// Namespace this gateway operates in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run one `kubectl` command and capture its output.
    async fn run(&self, args: &[&str]) -> Result<CommandOutput, GatewayError> {
        let command_line = format!("{} {}", self.kubectl_path, args.join(" "));
        debug!(command = %command_line, "Running kubectl");

        let mut cmd = Command::new(&self.kubectl_path);
        cmd.args(&self.global_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| GatewayError::Launch {
            program: self.kubectl_path.clone(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty process cannot block
        // on a full pipe while we wait for it.
        let stdout_task = tokio::spawn(read_stream(child.stdout.take(), "stdout"));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take(), "stderr"));
        let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];

        // The bound covers draining too: a descendant holding the pipes open
        // must not outlive the timeout.
        let completed = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            let (stdout, stderr) = tokio::join!(stdout_task, stderr_task);
            Ok::<_, std::io::Error>((status, joined_output(stdout), joined_output(stderr)))
        })
        .await;

        // On timeout `child` is dropped on return, which kills the process.
        let (status, stdout, stderr) = match completed {
            Ok(Ok(finished)) => finished,
            Ok(Err(source)) => {
                return Err(GatewayError::Launch {
                    program: self.kubectl_path.clone(),
                    source,
                })
            }
            Err(_elapsed) => {
                for reader in &readers {
                    reader.abort();
                }
                warn!(
                    command = %command_line,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "kubectl timed out"
                );
                return Err(GatewayError::Timeout {
                    command: command_line,
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        let duration_ms = start.elapsed().as_millis() as u64;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            debug!(command = %command_line, code, duration_ms, "kubectl failed");
            return Err(GatewayError::Exit {
                code,
                stderr: stderr.trim().to_string(),
                stdout: stdout.trim().to_string(),
            });
        }

        debug!(command = %command_line, duration_ms, "kubectl succeeded");
        Ok(CommandOutput {
            stdout,
            duration_ms,
        })
    }
}

#[async_trait]
impl ResourceGateway for KubectlGateway {
    async fn create(&self, manifest: &ResourceManifest) -> Result<RequestId, GatewayError> {
        let yaml = manifest.to_yaml()?;

        // Removed when dropped, on every return path.
        let mut file = tempfile::Builder::new()
            .prefix("query-")
            .suffix(".yaml")
            .tempfile()
            .map_err(GatewayError::TempFile)?;
        file.write_all(yaml.as_bytes())
            .map_err(GatewayError::TempFile)?;
        file.flush().map_err(GatewayError::TempFile)?;

        let path = file.path().to_string_lossy().into_owned();
        let output = self.run(&["apply", "-f", path.as_str()]).await?;

        info!(
            query = %manifest.name(),
            namespace = %manifest.metadata.namespace,
            duration_ms = output.duration_ms,
            "Query created"
        );
        Ok(RequestId::new(manifest.name()))
    }

    async fn read_phase(&self, id: &RequestId) -> Result<ResourcePhase, GatewayError> {
        let output = self
            .run(&["get", "query", id.as_str(), "-n", self.namespace.as_str(), "-o", PHASE_PATH])
            .await?;
        Ok(ResourcePhase::from_token(&output.stdout))
    }

    async fn read_result_field(&self, id: &RequestId) -> Result<String, GatewayError> {
        let output = self
            .run(&["get", "query", id.as_str(), "-n", self.namespace.as_str(), "-o", RESULT_PATH])
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn delete(&self, id: &RequestId) -> bool {
        let result = self
            .run(&[
                "delete",
                "query",
                id.as_str(),
                "-n",
                self.namespace.as_str(),
                "--ignore-not-found=true",
            ])
            .await;

        match result {
            Ok(_) => {
                info!(query = %id, "Query deleted");
                true
            }
            Err(e) => {
                warn!(query = %id, error = %e, "Failed to delete query");
                false
            }
        }
    }

    async fn list_names(&self, kind: ListKind) -> Result<Vec<String>, GatewayError> {
        let output = self
            .run(&["get", kind.as_str(), "-n", self.namespace.as_str(), "-o", NAMES_PATH])
            .await?;
        Ok(output
            .stdout
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }
}

/// Read an entire output stream, keeping at most [`MAX_OUTPUT_BYTES`].
///
/// Output past the cap is drained and discarded so the process never writes
/// into a closed pipe.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, stream: &'static str) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(mut h) = handle else {
        return buf;
    };

    if let Err(e) = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await {
        warn!(stream, error = %e, "Failed to read kubectl output");
        return buf;
    }

    if buf.len() as u64 >= MAX_OUTPUT_BYTES {
        match tokio::io::copy(&mut h, &mut tokio::io::sink()).await {
            Ok(0) => {}
            Ok(dropped) => warn!(
                stream,
                kept_bytes = buf.len(),
                dropped_bytes = dropped,
                "kubectl output truncated"
            ),
            Err(e) => warn!(stream, error = %e, "Failed to drain kubectl output"),
        }
    }
    buf
}

fn joined_output(result: Result<Vec<u8>, tokio::task::JoinError>) -> Vec<u8> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "kubectl output reader failed");
        Vec::new()
    })
}
