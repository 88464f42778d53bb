//! Adapter that shells out to an external analyzer.
//!
//! The command's stdout must be a JSON array of violation records. Exit codes
//! in `success_exit_codes` count as success, since most linters exit non-zero
//! when they find something.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use vigil_core::config::EngineConfig;
use vigil_core::constants;
use vigil_core::errors::EngineError;
use vigil_core::traits::CancellationToken;
use vigil_core::types::{Violation, ViolationSource};

use super::rotating::RuleChecker;
use crate::engine::{AnalysisEngine, ExecuteOptions};

/// Max stderr carried into a `ProcessFailed` error.
const STDERR_EXCERPT_BYTES: usize = 2048;

pub struct ProcessEngine {
    name: String,
    source: ViolationSource,
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    success_exit_codes: Vec<i32>,
}

impl ProcessEngine {
    pub fn new(name: impl Into<String>, source: ViolationSource, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source,
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            success_exit_codes: vec![0, 1],
        }
    }

    pub fn from_config(name: &str, config: &EngineConfig) -> Self {
        Self {
            name: name.to_string(),
            source: config.effective_source(),
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.as_ref().map(PathBuf::from),
            success_exit_codes: config.effective_success_exit_codes(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_success_exit_codes(mut self, codes: Vec<i32>) -> Self {
        self.success_exit_codes = codes;
        self
    }

    /// Expand `{target}`, `{rule}`, and `{<param>}` placeholders.
    fn render_args(&self, target: &Path, rule: Option<&str>, options: &ExecuteOptions) -> Vec<String> {
        let target = target.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                let mut out = arg.replace("{target}", &target);
                if let Some(rule) = rule {
                    out = out.replace("{rule}", rule);
                }
                for (key, value) in &options.params {
                    out = out.replace(&format!("{{{key}}}"), value);
                }
                out
            })
            .collect()
    }

    async fn run(
        &self,
        target: &Path,
        rule: Option<&str>,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        let args = self.render_args(target, rule, options);
        let mut cmd = Command::new(&self.command);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(engine = %self.name, command = %self.command, ?args, "spawning analyzer");

        let mut child = cmd.spawn().map_err(|e| EngineError::SpawnFailed {
            engine: self.name.clone(),
            message: format!("{}: {e}", self.command),
        })?;

        // Drain both pipes off-task so `wait` can borrow the child.
        let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        let status = match waited {
            Some(Ok(status)) => status,
            Some(Err(e)) => {
                return Err(EngineError::failed(&self.name, format!("wait failed: {e}")));
            }
            None => {
                let _ = child.start_kill();
                return Err(EngineError::Cancelled {
                    engine: self.name.clone(),
                });
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let code = status.code().unwrap_or(-1);

        if !self.success_exit_codes.contains(&code) {
            return Err(EngineError::ProcessFailed {
                engine: self.name.clone(),
                status: code,
                stderr: excerpt(&stderr),
            });
        }

        parse_violations(&self.name, &stdout)
    }
}

/// Parse a JSON array of violation records. Blank output means no findings.
fn parse_violations(engine: &str, stdout: &[u8]) -> Result<Vec<Violation>, EngineError> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| EngineError::InvalidOutput {
        engine: engine.to_string(),
        message: e.to_string(),
    })
}

fn excerpt(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= STDERR_EXCERPT_BYTES {
        return text.to_string();
    }
    let mut end = STDERR_EXCERPT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Read a whole stream, capped at `MAX_ENGINE_OUTPUT_BYTES`.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h
            .take(constants::MAX_ENGINE_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

#[async_trait]
impl AnalysisEngine for ProcessEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> ViolationSource {
        self.source
    }

    async fn analyze(
        &self,
        target: &Path,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        self.run(target, None, options, cancel).await
    }
}

#[async_trait]
impl RuleChecker for ProcessEngine {
    async fn check_rule(
        &self,
        target: &Path,
        rule: &str,
        options: &ExecuteOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Violation>, EngineError> {
        self.run(target, Some(rule), options, cancel).await
    }
}
