//! Test doubles and fixtures for code written against [`IoEffect`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use glob::Pattern;
use tempfile::TempDir;

use crate::effect::{
    ExecOptions, ExecOutput, ExecStream, ExitFuture, FileKind, FileMetadata, GlobOptions, IoEffect,
};
use crate::error::{EffectError, Result};
use crate::io::lines::split_lines;

/// Canned result for one `exec`/`exec_stream` call on [`FakeIoEffect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCommand {
    pub stdout: String,
    pub stderr: String,
    /// `None` simulates termination by a signal.
    pub code: Option<i32>,
}

impl ScriptedCommand {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: Some(0),
        }
    }

    pub fn failing(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            code: Some(code),
        }
    }
}

/// In-memory [`IoEffect`]: files live in a map, commands return scripted
/// results in FIFO order and are recorded.
#[derive(Debug, Default)]
pub struct FakeIoEffect {
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
    scripted: Mutex<VecDeque<ScriptedCommand>>,
    executed: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(path: &Path) -> EffectError {
    EffectError::from_io(path, io::Error::from(io::ErrorKind::NotFound))
}

impl FakeIoEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        lock(&self.files).insert(path.into(), contents.into());
        self
    }

    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        lock(&self.dirs).insert(path.into());
        self
    }

    pub fn with_command(self, command: ScriptedCommand) -> Self {
        self.push_command(command);
        self
    }

    pub fn push_command(&self, command: ScriptedCommand) {
        lock(&self.scripted).push_back(command);
    }

    /// Current contents of an in-memory file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        lock(&self.files).get(path.as_ref()).cloned()
    }

    /// Command lines passed to `exec`/`exec_stream`, in call order.
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }

    fn is_dir(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() || lock(&self.dirs).contains(path) {
            return true;
        }
        lock(&self.files)
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn next_command(&self, command: &str) -> Result<ScriptedCommand> {
        lock(&self.executed).push(command.to_string());
        lock(&self.scripted)
            .pop_front()
            .ok_or_else(|| EffectError::Spawn {
                command: command.to_string(),
                source: io::Error::other("no scripted command left"),
            })
    }

    fn entries(&self) -> Vec<(PathBuf, bool)> {
        let mut entries: BTreeMap<PathBuf, bool> = lock(&self.dirs)
            .iter()
            .map(|dir| (dir.clone(), true))
            .collect();
        for file in lock(&self.files).keys() {
            for ancestor in file.ancestors().skip(1) {
                if !ancestor.as_os_str().is_empty() {
                    entries.insert(ancestor.to_path_buf(), true);
                }
            }
            entries.insert(file.clone(), false);
        }
        entries.into_iter().collect()
    }
}

#[async_trait]
impl IoEffect for FakeIoEffect {
    async fn stat(&self, path: &Path) -> Result<FileMetadata> {
        let (len, kind) = match lock(&self.files).get(path) {
            Some(contents) => (contents.len() as u64, FileKind::File),
            None => (0, FileKind::Dir),
        };
        if kind == FileKind::Dir && !self.is_dir(path) {
            return Err(not_found(path));
        }
        Ok(FileMetadata {
            len,
            kind,
            modified: None,
            accessed: None,
            created: None,
            readonly: false,
            mode: None,
        })
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        self.file(path).ok_or_else(|| not_found(path))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new(""));
        if !self.is_dir(parent) {
            return Err(not_found(path));
        }
        lock(&self.files).insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn exec(&self, command: &str, _options: &ExecOptions) -> Result<ExecOutput> {
        let scripted = self.next_command(command)?;
        if scripted.code == Some(0) {
            Ok(ExecOutput {
                stdout: scripted.stdout,
                stderr: scripted.stderr,
            })
        } else {
            Err(EffectError::NonZeroExit {
                code: scripted.code,
                stdout: scripted.stdout,
                stderr: scripted.stderr,
            })
        }
    }

    async fn exec_stream(&self, command: &str, _options: &ExecOptions) -> Result<ExecStream> {
        let scripted = self.next_command(command)?;
        Ok(ExecStream {
            stdout: split_lines(io::Cursor::new(scripted.stdout.into_bytes())),
            stderr: split_lines(io::Cursor::new(scripted.stderr.into_bytes())),
            exit: ExitFuture::new(futures::future::ready(Ok(scripted.code))),
        })
    }

    fn glob_sync(&self, pattern: &str, options: &GlobOptions) -> Result<Vec<String>> {
        let compiled = Pattern::new(pattern).map_err(|source| EffectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let match_options = options.match_options();
        let cwd = options.cwd.clone().unwrap_or_default();

        let mut matches = Vec::new();
        for (path, is_dir) in self.entries() {
            if options.nodir && is_dir {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&cwd) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            if !compiled.matches_path_with(relative, match_options) {
                continue;
            }
            let shown = if options.absolute { path.as_path() } else { relative };
            matches.push(shown.to_string_lossy().into_owned());
        }
        Ok(matches)
    }
}

/// Create a temp directory populated with `(relative path, contents)` files.
pub fn fixture_dir(files: &[(&str, &str)]) -> AnyResult<TempDir> {
    let dir = tempfile::tempdir().context("create tempdir")?;
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(dir)
}
