//! JSON file storage engine.
//!
//! Each save writes the whole state as pretty-printed JSON to a sibling temp
//! file and renames it over the target, so readers never see a partial
//! write. Temp names carry the process id and a process-wide sequence number, so
//! concurrent saves from any number of engines or processes never share a
//! temp file; the last rename wins.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::StorageEngine;
use crate::error::StorageError;

/// Shared by every engine in the process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct JsonFileEngine {
    path: PathBuf,
}

impl JsonFileEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StorageEngine for JsonFileEngine {
    async fn save(&self, state: &Value) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "State file written");
        Ok(())
    }

    async fn load(&self) -> Result<Value, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Value::Object(Map::new())),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Value::Object(Map::new())),
            Err(e) => Err(e.into()),
        }
    }
}
