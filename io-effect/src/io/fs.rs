//! Filesystem capabilities delegated to `tokio::fs`.

use std::path::Path;

use tokio::fs;

use crate::effect::FileMetadata;
use crate::error::{EffectError, Result};

pub(crate) async fn stat(path: &Path) -> Result<FileMetadata> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| EffectError::from_io(path, e))?;
    Ok(FileMetadata::from(&metadata))
}

pub(crate) async fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| EffectError::from_io(path, e))?;
    String::from_utf8(bytes).map_err(|source| EffectError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) async fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .await
        .map_err(|e| EffectError::from_io(path, e))
}
