//! [`RealIoEffect`]: the capability set backed by the host OS.
//!
//! Each capability is a thin delegation (`tokio::fs`, `tokio::process`,
//! `glob`). Only `exec_stream` has behavior of its own; see [`lines`].

mod fs;
mod glob_expand;
pub mod lines;
mod process;

use std::path::Path;

use async_trait::async_trait;
use tracing::instrument;

use crate::config::EffectConfig;
use crate::effect::{ExecOptions, ExecOutput, ExecStream, FileMetadata, GlobOptions, IoEffect};
use crate::error::Result;

/// OS-backed [`IoEffect`].
///
/// Errors are passed through as reported by the host, classified into
/// `EffectError` variants with the OS error kept as the source.
#[derive(Debug, Clone, Default)]
pub struct RealIoEffect {
    config: EffectConfig,
}

impl RealIoEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EffectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }
}

#[async_trait]
impl IoEffect for RealIoEffect {
    #[instrument(skip_all, fields(path = %path.display()))]
    async fn stat(&self, path: &Path) -> Result<FileMetadata> {
        fs::stat(path).await
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    async fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_file(path).await
    }

    #[instrument(skip_all, fields(path = %path.display(), bytes = content.len()))]
    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write_file(path, content).await
    }

    #[instrument(skip_all, fields(command = %command, max_buffer = tracing::field::Empty))]
    async fn exec(&self, command: &str, options: &ExecOptions) -> Result<ExecOutput> {
        let shell = options.shell.as_ref().unwrap_or(&self.config.shell);
        let max_buffer = options
            .max_buffer
            .unwrap_or(self.config.exec_max_buffer_bytes);
        tracing::Span::current().record("max_buffer", max_buffer);
        let cmd = process::shell_command(shell, command, options);
        process::run_buffered(cmd, command, max_buffer).await
    }

    /// Spawns through the configured shell, so a command that does not exist
    /// is not a spawn error: the shell starts, fails to find it, and the exit
    /// future resolves to the shell's failure code (127 for `/bin/sh`). Only
    /// a shell that cannot be started is reported as `EffectError::Spawn`.
    #[instrument(skip_all, fields(command = %command))]
    async fn exec_stream(&self, command: &str, options: &ExecOptions) -> Result<ExecStream> {
        let shell = options.shell.as_ref().unwrap_or(&self.config.shell);
        let cmd = process::shell_command(shell, command, options);
        process::spawn_streaming(cmd, command)
    }

    #[instrument(skip_all, fields(pattern = %pattern, strict = options.strict))]
    fn glob_sync(&self, pattern: &str, options: &GlobOptions) -> Result<Vec<String>> {
        glob_expand::expand(pattern, options)
    }
}
