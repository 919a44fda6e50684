//! Error taxonomy for effect capabilities.
//!
//! Each variant keeps the error reported by the host as its `source`, so a
//! caller sees exactly what the OS facility returned. Nothing here retries or
//! recovers.

use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

/// Result alias used by every capability.
pub type Result<T> = std::result::Result<T, EffectError>;

/// Which output channel of a child process an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("{}: not found", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: permission denied", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: no space left on device", path.display())]
    NoSpace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: contents are not valid UTF-8", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Reading a pipe of, or waiting on, an already spawned process failed.
    #[error("while running `{command}`")]
    Process {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Buffered execution finished with a non-zero status. `code` is `None`
    /// when the process was terminated by a signal.
    #[error("command exited with {}", describe_code(*code))]
    NonZeroExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("{stream} exceeded max buffer of {limit} bytes")]
    MaxBufferExceeded { stream: OutputStream, limit: usize },

    #[error("invalid glob pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl EffectError {
    /// Classify an OS error against the path it was raised for.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => EffectError::NotFound { path, source },
            io::ErrorKind::PermissionDenied => EffectError::PermissionDenied { path, source },
            io::ErrorKind::StorageFull => EffectError::NoSpace { path, source },
            _ => EffectError::Io { path, source },
        }
    }

    /// The underlying `io::ErrorKind`, for variants that wrap an OS error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            EffectError::NotFound { source, .. }
            | EffectError::PermissionDenied { source, .. }
            | EffectError::NoSpace { source, .. }
            | EffectError::Io { source, .. }
            | EffectError::Spawn { source, .. }
            | EffectError::Process { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EffectError::NotFound { .. })
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    }
}
