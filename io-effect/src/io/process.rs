//! Helpers for running shell commands, buffered or as line streams.

use std::io;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{Instrument, debug, error, warn};

use crate::effect::{ExecOptions, ExecOutput, ExecStream, ExitFuture, Shell};
use crate::error::{EffectError, OutputStream, Result};
use crate::io::lines::split_lines;

/// Build `<shell> <args..> <command>` with the caller's options applied.
pub(crate) fn shell_command(shell: &Shell, command: &str, options: &ExecOptions) -> Command {
    let mut cmd = Command::new(&shell.program);
    cmd.args(&shell.args).arg(command);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    if options.clear_env {
        cmd.env_clear();
    }
    cmd.envs(&options.env);
    cmd
}

fn spawn(mut cmd: Command, command: &str) -> Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    match cmd.spawn() {
        Ok(child) => Ok(child),
        Err(source) => {
            error!(err = %source, "failed to spawn command");
            Err(EffectError::Spawn {
                command: command.to_string(),
                source,
            })
        }
    }
}

fn not_piped(command: &str, stream: OutputStream) -> EffectError {
    EffectError::Process {
        command: command.to_string(),
        source: io::Error::other(format!("{stream} was not piped")),
    }
}

/// Run a command to completion and capture stdout/stderr without risking pipe deadlocks.
///
/// Both pipes are drained concurrently while the child runs. If either one
/// produces more than `max_buffer` bytes the child is killed and the call
/// fails with `MaxBufferExceeded`.
pub(crate) async fn run_buffered(
    cmd: Command,
    command: &str,
    max_buffer: usize,
) -> Result<ExecOutput> {
    let mut child = spawn(cmd, command)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| not_piped(command, OutputStream::Stdout))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| not_piped(command, OutputStream::Stderr))?;

    let drained = futures::try_join!(
        read_stream_limited(stdout, max_buffer, OutputStream::Stdout, command),
        read_stream_limited(stderr, max_buffer, OutputStream::Stderr, command),
    );
    let (stdout, stderr) = match drained {
        Ok(output) => output,
        Err(err) => {
            if matches!(err, EffectError::MaxBufferExceeded { .. }) {
                warn!(max_buffer, "output exceeded max buffer, killing");
            }
            if let Err(kill_err) = child.kill().await {
                warn!(err = %kill_err, "failed to kill command");
            }
            return Err(err);
        }
    };

    let status = child.wait().await.map_err(|source| EffectError::Process {
        command: command.to_string(),
        source,
    })?;
    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    debug!(exit_code = ?status.code(), "command finished");
    if status.success() {
        Ok(ExecOutput { stdout, stderr })
    } else {
        Err(EffectError::NonZeroExit {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Spawn a command and return its pipes as independent line streams.
///
/// Returns as soon as the child exists. The exit future only waits on the
/// child; it does not wait for either stream to be drained.
pub(crate) fn spawn_streaming(cmd: Command, command: &str) -> Result<ExecStream> {
    let mut child = spawn(cmd, command)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| not_piped(command, OutputStream::Stdout))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| not_piped(command, OutputStream::Stderr))?;

    let command = command.to_string();
    let exit = async move {
        let status = child
            .wait()
            .await
            .map_err(|source| EffectError::Process { command, source })?;
        debug!(exit_code = ?status.code(), "command finished");
        Ok::<_, EffectError>(status.code())
    };

    Ok(ExecStream {
        stdout: split_lines(stdout),
        stderr: split_lines(stderr),
        exit: ExitFuture::new(exit.in_current_span()),
    })
}

async fn read_stream_limited<R: AsyncRead + Unpin>(
    mut reader: R,
    limit: usize,
    stream: OutputStream,
    command: &str,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|source| EffectError::Process {
                command: command.to_string(),
                source,
            })?;
        if n == 0 {
            break;
        }
        if buf.len() + n > limit {
            return Err(EffectError::MaxBufferExceeded { stream, limit });
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(buf)
}
