//! Glob expansion against the real filesystem.

use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::effect::GlobOptions;
use crate::error::{EffectError, Result};

/// Expand `pattern` under `options.cwd`, returning paths relative to it
/// (or absolute ones when `options.absolute` is set).
pub(crate) fn expand(pattern: &str, options: &GlobOptions) -> Result<Vec<String>> {
    let cwd = options.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
    let full = if Path::new(pattern).is_absolute() {
        PathBuf::from(pattern)
    } else {
        // The base directory is literal text, not part of the pattern.
        Path::new(&Pattern::escape(&cwd.to_string_lossy())).join(pattern)
    };

    let paths = glob::glob_with(&full.to_string_lossy(), options.match_options()).map_err(
        |source| EffectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        },
    )?;
    let entries = paths.map(|entry| {
        entry.map_err(|err| {
            let path = err.path().to_path_buf();
            (path, err.into_error())
        })
    });

    let matches = collect_matches(entries, &cwd, options)?;
    debug!(matches = matches.len(), "glob expanded");
    Ok(matches)
}

/// Turn traversal results into output strings.
///
/// An entry that could not be read is skipped with a warning, unless
/// `options.strict` is set, in which case it fails the whole expansion.
fn collect_matches<I>(entries: I, cwd: &Path, options: &GlobOptions) -> Result<Vec<String>>
where
    I: Iterator<Item = std::result::Result<PathBuf, (PathBuf, io::Error)>>,
{
    let mut matches = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err((path, err)) if options.strict => return Err(EffectError::from_io(path, err)),
            Err((path, err)) => {
                warn!(path = %path.display(), err = %err, "skipping unreadable glob entry");
                continue;
            }
        };
        if options.nodir && path.is_dir() {
            continue;
        }
        let path = if options.absolute {
            std::path::absolute(&path).map_err(|e| EffectError::from_io(&path, e))?
        } else {
            path.strip_prefix(cwd)
                .map(Path::to_path_buf)
                .unwrap_or(path)
        };
        matches.push(path.to_string_lossy().into_owned());
    }
    Ok(matches)
}
