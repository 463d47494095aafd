// src/exec/command.rs

//! Shell-command executor.

use std::process::Stdio;

use anyhow::{bail, Context};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::{debug, info};

use crate::exec::backend::{Executor, ExecutorFuture, StepRequest};

/// Runs a shell command per step.
///
/// - The [`StepRequest`] is written to the child's stdin as JSON.
/// - Stdout is parsed as JSON; anything that is not valid JSON is returned as
///   a JSON string, and empty output becomes `null`.
/// - A non-zero exit status fails the step, carrying the tail of stderr.
///
/// The child is spawned with `kill_on_drop(true)`, so a step timeout (which
/// drops the executor future) also kills the process.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    cmd: String,
}

impl CommandExecutor {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        }
    }

    async fn run(&self, request: StepRequest) -> anyhow::Result<Value> {
        info!(
            step = %request.step_id,
            cmd = %self.cmd,
            "starting step process"
        );

        let payload = serde_json::to_vec(&request).context("serializing step request")?;

        let mut child = self
            .shell()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning process for step '{}'", request.step_id))?;

        // Feed stdin and drain both pipes together so a chatty child cannot
        // block on a full pipe.
        let (written, stdout, stderr) = tokio::join!(
            write_stdin(child.stdin.take(), &payload),
            read_pipe(child.stdout.take()),
            read_pipe(child.stderr.take()),
        );
        if let Err(e) = written {
            // A command that ignores stdin may close it early.
            debug!(step = %request.step_id, error = %e, "child closed stdin early");
        }
        let stdout =
            stdout.with_context(|| format!("reading stdout of step '{}'", request.step_id))?;
        let stderr = stderr.unwrap_or_default();
        for line in stderr.lines() {
            debug!(step = %request.step_id, "stderr: {}", line);
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of step '{}'", request.step_id))?;

        info!(
            step = %request.step_id,
            exit_code = status.code().unwrap_or(-1),
            success = status.success(),
            "step process exited"
        );

        if !status.success() {
            let tail = stderr.lines().last().unwrap_or("").trim();
            bail!(
                "command exited with status {}{}",
                status.code().unwrap_or(-1),
                if tail.is_empty() {
                    String::new()
                } else {
                    format!(": {tail}")
                }
            );
        }

        Ok(parse_stdout(&stdout))
    }
}

async fn write_stdin(stdin: Option<ChildStdin>, payload: &[u8]) -> std::io::Result<()> {
    if let Some(mut stdin) = stdin {
        stdin.write_all(payload).await?;
        stdin.shutdown().await?;
    }
    Ok(())
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = String::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_string(&mut buf).await?;
    }
    Ok(buf)
}

fn parse_stdout(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

impl Executor for CommandExecutor {
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(self.run(request))
    }
}
