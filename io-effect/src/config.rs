//! Configuration for [`crate::io::RealIoEffect`], optionally read from TOML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::effect::Shell;

/// Default limit for buffered `exec` output, per stream.
pub const DEFAULT_EXEC_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Effect configuration (TOML).
///
/// Missing fields default to the host's usual shell and a 1 MiB exec buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EffectConfig {
    /// Shell used to interpret command lines for `exec` and `exec_stream`.
    pub shell: Shell,

    /// Fail buffered `exec` calls whose stdout or stderr exceeds this many bytes.
    pub exec_max_buffer_bytes: usize,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            shell: Shell::default(),
            exec_max_buffer_bytes: DEFAULT_EXEC_MAX_BUFFER_BYTES,
        }
    }
}

impl EffectConfig {
    pub fn validate(&self) -> Result<()> {
        if self.shell.program.trim().is_empty() {
            return Err(anyhow!("shell.program must be non-empty"));
        }
        if self.exec_max_buffer_bytes == 0 {
            return Err(anyhow!("exec_max_buffer_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EffectConfig::default()`.
pub fn load_config(path: &Path) -> Result<EffectConfig> {
    if !path.exists() {
        let cfg = EffectConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EffectConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
