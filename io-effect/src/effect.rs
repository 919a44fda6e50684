//! The [`IoEffect`] capability set and the values it exchanges.
//!
//! Logic that needs the filesystem or child processes takes an `IoEffect`
//! (usually `&dyn IoEffect` or `Arc<dyn IoEffect>`) instead of calling the OS
//! directly. Production wires in [`crate::io::RealIoEffect`]; tests wire in a
//! double such as `test_support::FakeIoEffect`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::SystemTime;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream};
use futures::{Future, FutureExt};
use glob::MatchOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Abstraction over every interaction with the outside world.
///
/// All capabilities are async except [`IoEffect::glob_sync`].
#[async_trait]
pub trait IoEffect: Send + Sync {
    /// Metadata for an existing filesystem entry (symlinks are followed).
    async fn stat(&self, path: &Path) -> Result<FileMetadata>;

    /// Read a whole file as UTF-8 text.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Create or overwrite a file. The parent directory must already exist.
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Run a shell command to completion and return everything it printed.
    ///
    /// A non-zero exit is reported as `EffectError::NonZeroExit`, which still
    /// carries the captured output.
    async fn exec(&self, command: &str, options: &ExecOptions) -> Result<ExecOutput>;

    /// Spawn a shell command and hand back its output as line streams plus a
    /// future for its exit code, without waiting for it to finish.
    ///
    /// The returned handle is the only owner of the child's pipes. There is
    /// no cancellation or timeout: callers that need a deadline race the
    /// stream/future against their own timer, and killing the process is
    /// outside this interface.
    async fn exec_stream(&self, command: &str, options: &ExecOptions) -> Result<ExecStream>;

    /// Expand a glob pattern relative to `options.cwd` (default `.`).
    ///
    /// Order follows directory traversal and is not guaranteed sorted.
    fn glob_sync(&self, pattern: &str, options: &GlobOptions) -> Result<Vec<String>>;
}

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

/// Snapshot of an entry's metadata at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub len: u64,
    pub kind: FileKind,
    pub modified: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
    /// Not every platform/filesystem records a creation time.
    pub created: Option<SystemTime>,
    pub readonly: bool,
    /// Unix permission bits (`st_mode`); `None` on other platforms.
    pub mode: Option<u32>,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }
}

impl From<&Metadata> for FileMetadata {
    fn from(m: &Metadata) -> Self {
        let file_type = m.file_type();
        let kind = if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Dir
        } else if file_type.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(m.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        FileMetadata {
            len: m.len(),
            kind,
            modified: m.modified().ok(),
            accessed: m.accessed().ok(),
            created: m.created().ok(),
            readonly: m.permissions().readonly(),
            mode,
        }
    }
}

/// Program used to interpret command lines, e.g. `/bin/sh -c`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Shell {
    pub program: String,
    /// Arguments placed before the command line.
    pub args: Vec<String>,
}

impl Default for Shell {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "/bin/sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }
}

/// Execution settings passed through to the process host unvalidated.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory; inherits the caller's when `None`.
    pub cwd: Option<PathBuf>,
    /// Variables set on top of the inherited (or cleared) environment.
    pub env: BTreeMap<String, String>,
    /// Start from an empty environment instead of inheriting.
    pub clear_env: bool,
    /// Overrides the configured shell for this call.
    pub shell: Option<Shell>,
    /// Overrides the configured buffered-exec output limit for this call.
    pub max_buffer: Option<usize>,
}

impl ExecOptions {
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Self::default()
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Glob expansion settings.
#[derive(Debug, Clone, Default)]
pub struct GlobOptions {
    /// Base directory patterns are resolved against; `.` when `None`.
    pub cwd: Option<PathBuf>,
    /// Let wildcards match entries whose name starts with `.`.
    pub dot: bool,
    /// Match case-insensitively.
    pub nocase: bool,
    /// Only return non-directories.
    pub nodir: bool,
    /// Return absolute paths instead of paths relative to `cwd`.
    pub absolute: bool,
    /// Fail on a directory that cannot be read instead of skipping it.
    pub strict: bool,
}

impl GlobOptions {
    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            ..Self::default()
        }
    }

    /// Matching rules: `*` never crosses `/`, hidden entries need `dot`.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: !self.nocase,
            require_literal_separator: true,
            require_literal_leading_dot: !self.dot,
        }
    }
}

/// Output of a process that has already exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Lazy, single-pass sequence of lines read from one output pipe.
///
/// Lines are yielded without their terminator. A trailing fragment with no
/// terminator is dropped.
pub struct LineStream {
    inner: BoxStream<'static, std::io::Result<String>>,
}

impl LineStream {
    pub fn new(inner: impl Stream<Item = std::io::Result<String>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream").finish_non_exhaustive()
    }
}

impl Stream for LineStream {
    type Item = std::io::Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Resolves once, to the exit code of the process (`None` when it was
/// terminated by a signal).
pub struct ExitFuture {
    inner: BoxFuture<'static, Result<Option<i32>>>,
}

impl ExitFuture {
    pub fn new(inner: impl Future<Output = Result<Option<i32>>> + Send + 'static) -> Self {
        Self {
            inner: inner.boxed(),
        }
    }
}

impl fmt::Debug for ExitFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitFuture").finish_non_exhaustive()
    }
}

impl Future for ExitFuture {
    type Output = Result<Option<i32>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Handle to a running process: two independent line streams and its exit.
///
/// Each part can be moved out and driven on its own task.
#[derive(Debug)]
pub struct ExecStream {
    pub stdout: LineStream,
    pub stderr: LineStream,
    pub exit: ExitFuture,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_options_map_onto_match_options() {
        let defaults = GlobOptions::default().match_options();
        assert!(defaults.case_sensitive);
        assert!(defaults.require_literal_leading_dot);
        assert!(defaults.require_literal_separator);

        let relaxed = GlobOptions {
            dot: true,
            nocase: true,
            ..GlobOptions::default()
        }
        .match_options();
        assert!(!relaxed.case_sensitive);
        assert!(!relaxed.require_literal_leading_dot);
    }

    #[test]
    fn exec_options_builders_set_fields() {
        let options = ExecOptions::in_dir("/work").env("A", "1").env("B", "2");
        assert_eq!(options.cwd.as_deref(), Some(Path::new("/work")));
        assert_eq!(options.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(options.env.len(), 2);
        assert!(!options.clear_env);
    }
}
