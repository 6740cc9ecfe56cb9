//! In-memory copy of the canonical JSON artifact, refreshed only when the
//! file on disk is newer than what was last read.
//!
//! States: empty until the first successful load, then populated. A
//! populated cache is replaced when the artifact's modification time is
//! strictly greater than the recorded one; otherwise the cached document is
//! returned without touching the file contents. The check-then-set runs
//! under one async mutex so concurrent refreshes never interleave.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::document::Document;
use crate::error::Result;

#[derive(Debug, Clone)]
struct CacheEntry {
    document: Arc<Document>,
    modified: SystemTime,
}

#[derive(Debug)]
pub struct FreshnessCache {
    path: PathBuf,
    entry: Mutex<Option<CacheEntry>>,
    reads: AtomicU64,
}

impl FreshnessCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), entry: Mutex::new(None), reads: AtomicU64::new(0) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How many times the artifact's contents have been read.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Modification time recorded with the cached document, if any.
    pub async fn cached_modified(&self) -> Option<SystemTime> {
        self.entry.lock().await.as_ref().map(|e| e.modified)
    }

    /// The current document, re-read only if the artifact changed.
    ///
    /// `Ok(None)` means the artifact does not exist. Any other failure to
    /// stat, read or decode it is an error and leaves the cache as it was.
    pub async fn load_if_fresh(&self) -> Result<Option<Arc<Document>>> {
        let mut entry = self.entry.lock().await;
        let Some(modified) = self.stat().await? else {
            return Ok(None);
        };
        if let Some(cached) = entry.as_ref() {
            if modified <= cached.modified {
                debug!(path = %self.path.display(), "cache hit");
                return Ok(Some(Arc::clone(&cached.document)));
            }
        }
        let fresh = self.read(modified).await?;
        let document = Arc::clone(&fresh.document);
        *entry = Some(fresh);
        Ok(Some(document))
    }

    /// Re-reads the artifact regardless of its timestamp. The previous entry
    /// survives if the read fails.
    pub async fn force_reload(&self) -> Result<Option<Arc<Document>>> {
        let mut entry = self.entry.lock().await;
        let Some(modified) = self.stat().await? else {
            return Ok(None);
        };
        let fresh = self.read(modified).await?;
        let document = Arc::clone(&fresh.document);
        *entry = Some(fresh);
        Ok(Some(document))
    }

    pub async fn invalidate(&self) {
        self.entry.lock().await.take();
    }

    async fn stat(&self) -> Result<Option<SystemTime>> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, modified: SystemTime) -> Result<CacheEntry> {
        let bytes = tokio::fs::read(&self.path).await?;
        let reads = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        let document = Document::from_slice(&bytes)?;
        info!(
            path = %self.path.display(),
            reads,
            rows = document.rows().len(),
            modified = %DateTime::<Utc>::from(modified).to_rfc3339(),
            "document loaded"
        );
        Ok(CacheEntry { document: Arc::new(document), modified })
    }
}
