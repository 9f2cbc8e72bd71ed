//! Persisted cursor: the ID of the newest post already mailed.
//!
//! Written only after a successful send, so a failed run re-sends the same
//! batch next time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::CursorError;

/// Whether `candidate` is a newer post ID than `current`.
///
/// IDs are unbounded decimal strings: a longer ID is newer, equal lengths
/// compare lexicographically.
#[must_use]
pub fn is_newer(candidate: &str, current: Option<&str>) -> bool {
    match current {
        None => !candidate.is_empty(),
        Some(current) => (candidate.len(), candidate) > (current.len(), current),
    }
}

/// Storage for the last-seen post ID.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Current cursor, or `None` before the first successful run.
    async fn read_cursor(&self) -> Result<Option<String>, CursorError>;

    /// Replace the cursor.
    async fn write_cursor(&self, id: &str) -> Result<(), CursorError>;
}

/// On-disk shape of the cursor file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CursorState {
    /// Newest mailed post ID.
    #[serde(default)]
    pub last: Option<String>,
    /// When `last` was written.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CursorState {
    /// Load state from a JSON file, defaulting if it does not exist.
    pub async fn load(path: &Path) -> Result<Self, CursorError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save state to a JSON file, replacing it atomically.
    pub async fn save(&self, path: &Path) -> Result<(), CursorError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Cursor kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CursorStore for FileCursorStore {
    async fn read_cursor(&self) -> Result<Option<String>, CursorError> {
        let state = CursorState::load(&self.path).await?;
        Ok(state.last.filter(|id| !id.is_empty()))
    }

    async fn write_cursor(&self, id: &str) -> Result<(), CursorError> {
        let state = CursorState {
            last: Some(id.to_string()),
            updated_at: Some(Utc::now()),
        };
        state.save(&self.path).await?;

        tracing::debug!(cursor = %id, path = %self.path.display(), "Cursor saved");
        Ok(())
    }
}

/// In-process cursor for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    last: Mutex<Option<String>>,
}

impl MemoryCursorStore {
    #[must_use]
    pub fn new(initial: Option<String>) -> Self {
        Self {
            last: Mutex::new(initial),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn read_cursor(&self) -> Result<Option<String>, CursorError> {
        Ok(self.last.lock().await.clone().filter(|id| !id.is_empty()))
    }

    async fn write_cursor(&self, id: &str) -> Result<(), CursorError> {
        *self.last.lock().await = Some(id.to_string());
        Ok(())
    }
}
