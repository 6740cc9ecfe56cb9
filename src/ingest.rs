//! Ingestion: persist the uploaded spreadsheet at its canonical path, run
//! the document producer, and refresh the cache from the new artifact.
//!
//! The storage directory holds exactly one `latest.xlsx` and one
//! `latest.json`, both replaced in place. Writes go through a temp file in
//! the same directory followed by a rename, so readers only ever see a
//! complete file. The producer writes into a staging file that is decoded
//! and validated before it replaces `latest.json`; a failed parse leaves the
//! previous artifact and the cached document alone.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cache::FreshnessCache;
use crate::document::Document;
use crate::error::{BoardError, Result};
use crate::producer::DocumentProducer;

pub const SPREADSHEET_EXTENSION: &str = "xlsx";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub dir: PathBuf,
    pub spreadsheet: PathBuf,
    pub document: PathBuf,
}

impl StorageLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            spreadsheet: dir.join("latest.xlsx"),
            document: dir.join("latest.json"),
            dir,
        }
    }
}

pub fn has_spreadsheet_extension(name: impl AsRef<Path>) -> bool {
    name.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SPREADSHEET_EXTENSION))
}

/// Rejects uploads before anything is written.
pub fn validate_upload(file_name: Option<&str>, len: usize, limit: usize) -> Result<()> {
    let Some(file_name) = file_name.filter(|n| !n.trim().is_empty()) else {
        return Err(BoardError::Validation("missing file name".into()));
    };
    if !has_spreadsheet_extension(file_name) {
        return Err(BoardError::Validation(format!("'{file_name}' is not an .xlsx file")));
    }
    if len == 0 {
        return Err(BoardError::Validation("uploaded file is empty".into()));
    }
    if len > limit {
        return Err(BoardError::TooLarge { limit });
    }
    Ok(())
}

pub struct Pipeline {
    layout: StorageLayout,
    adopt_dir: Option<PathBuf>,
    max_upload_bytes: usize,
    producer: Arc<dyn DocumentProducer>,
    cache: FreshnessCache,
    // serializes persist -> parse -> refresh
    gate: Mutex<()>,
}

impl Pipeline {
    pub async fn open(layout: StorageLayout, producer: Arc<dyn DocumentProducer>) -> Result<Self> {
        tokio::fs::create_dir_all(&layout.dir).await?;
        Ok(Self {
            cache: FreshnessCache::new(layout.document.clone()),
            layout,
            adopt_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            producer,
            gate: Mutex::new(()),
        })
    }

    /// Directory scanned at boot for a spreadsheet to adopt.
    pub fn with_adopt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.adopt_dir = Some(dir.into());
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// The served document, or [`BoardError::NotReady`] if none was ever produced.
    pub async fn current(&self) -> Result<Arc<Document>> {
        self.cache.load_if_fresh().await?.ok_or(BoardError::NotReady)
    }

    /// Ingests an uploaded spreadsheet given as bytes.
    pub async fn ingest_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<Arc<Document>> {
        if let Err(e) = validate_upload(Some(file_name), bytes.len(), self.max_upload_bytes) {
            warn!(file_name, size = bytes.len(), error = %e, "upload rejected");
            return Err(e);
        }
        let _gate = self.gate.lock().await;
        let dest = self.layout.spreadsheet.clone();
        let size = bytes.len();
        blocking(move || atomic_write_bytes(&dest, &bytes)).await?;
        info!(file_name, size, "spreadsheet stored");
        self.parse_and_refresh().await
    }

    /// Ingests a spreadsheet that already sits on disk; the file is copied.
    pub async fn ingest_path(&self, source: &Path) -> Result<Arc<Document>> {
        let size = saturating_size(tokio::fs::metadata(source).await?.len());
        let file_name = source.file_name().and_then(|n| n.to_str());
        validate_upload(file_name, size, self.max_upload_bytes)?;
        let _gate = self.gate.lock().await;
        self.store_copy(source).await?;
        self.parse_and_refresh().await
    }

    /// Copies the first spreadsheet found in the adopt directory to the
    /// canonical path, unless a canonical spreadsheet already exists.
    pub async fn adopt_existing(&self) -> Result<Option<PathBuf>> {
        let _gate = self.gate.lock().await;
        self.adopt_locked().await
    }

    /// Best-effort startup: serve the existing artifact, or adopt and parse a
    /// spreadsheet if there is one. Failures are logged and swallowed.
    ///
    /// Runs once. A spreadsheet dropped into the adopt directory after boot
    /// is only picked up on the next restart; until then an upload is needed.
    pub async fn bootstrap(&self) -> Option<Arc<Document>> {
        match self.try_bootstrap().await {
            Ok(Some(document)) => {
                info!(rows = document.rows().len(), "document available at boot");
                Some(document)
            }
            Ok(None) => {
                info!("no spreadsheet yet, waiting for the first upload");
                None
            }
            Err(e) => {
                warn!(error = %e, "boot-time parse failed, waiting for an upload");
                None
            }
        }
    }

    async fn try_bootstrap(&self) -> Result<Option<Arc<Document>>> {
        let _gate = self.gate.lock().await;
        if let Some(document) = self.cache.load_if_fresh().await? {
            return Ok(Some(document));
        }
        if !tokio::fs::try_exists(&self.layout.spreadsheet).await?
            && self.adopt_locked().await?.is_none()
        {
            return Ok(None);
        }
        self.parse_and_refresh().await.map(Some)
    }

    async fn adopt_locked(&self) -> Result<Option<PathBuf>> {
        if tokio::fs::try_exists(&self.layout.spreadsheet).await? {
            return Ok(None);
        }
        let Some(dir) = &self.adopt_dir else {
            return Ok(None);
        };
        let mut candidates = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && has_spreadsheet_extension(&path) {
                candidates.push(path);
            }
        }
        // directory order is platform dependent
        candidates.sort();
        let Some(found) = candidates.into_iter().next() else {
            return Ok(None);
        };
        self.store_copy(&found).await?;
        info!(source = %found.display(), "adopted existing spreadsheet");
        Ok(Some(found))
    }

    async fn store_copy(&self, source: &Path) -> Result<()> {
        let source = source.to_path_buf();
        let dest = self.layout.spreadsheet.clone();
        blocking(move || atomic_copy(&source, &dest)).await
    }

    // Caller holds the gate.
    async fn parse_and_refresh(&self) -> Result<Arc<Document>> {
        let staging = tempfile::Builder::new()
            .prefix(".latest-")
            .suffix(".json")
            .tempfile_in(&self.layout.dir)?
            .into_temp_path();
        self.producer.parse(&self.layout.spreadsheet, &staging).await?;

        let bytes = tokio::fs::read(&staging).await?;
        let produced = Document::from_slice(&bytes)?;
        staging.persist(&self.layout.document)?;
        info!(
            columns = produced.columns().len(),
            rows = produced.rows().len(),
            "document produced"
        );

        self.cache
            .force_reload()
            .await?
            .ok_or_else(|| BoardError::corrupt("document vanished after it was written"))
    }
}

async fn blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> io::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(io::Error::other)??;
    Ok(())
}

// on-disk sizes beyond usize still have to fail the limit check
fn saturating_size(len: u64) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX)
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn atomic_write_bytes(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn atomic_copy(source: &Path, dest: &Path) -> io::Result<()> {
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)?;
    let tmp = NamedTempFile::new_in(dir)?;
    fs::copy(source, tmp.path())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
