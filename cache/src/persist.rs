//! JSON file helpers shared by the store and the exact-match index.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use crate::error::{CacheError, Result};

/// Read and parse `path`. A missing file is `Ok(None)`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CacheError::Persistence(format!(
                "{}: {e}",
                path.display()
            )));
        }
    };

    Ok(Some(serde_json::from_str(&content)?))
}

/// Serialize `value` and replace `path` with it.
///
/// Writes to a sibling temp file first, then renames over the target.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CacheError::Persistence(format!("{}: {e}", parent.display())))?;
    }

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)
        .await
        .map_err(|e| CacheError::Persistence(format!("{}: {e}", temp_path.display())))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| CacheError::Persistence(format!("{}: {e}", path.display())))?;

    Ok(())
}
