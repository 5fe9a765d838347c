//! Destinations for pipeline output.
//!
//! The pipeline never touches storage directly. It hands encoded images to
//! an [`ObjectSink`] and finished records to a [`RecordSink`]; callers pick
//! the implementation. This crate ships filesystem-backed ones:
//!
//! - [`DirectorySink`] stores objects under `<root>/<folder>/` with
//!   content-addressed names (first 16 hex chars of the SHA-256 of the
//!   bytes), so storing the same bytes twice yields the same path.
//! - [`JsonLinesSink`] appends one JSON document per record to a file.
//!
//! Both are `Sync` so a single instance can be shared across rayon workers.

use crate::process::AnalysisRecord;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Length of the content hash prefix used in object names.
const NAME_HASH_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rejected by sink: {0}")]
    Rejected(String),
}

/// Stores opaque byte blobs and returns an address for each.
pub trait ObjectSink: Sync {
    /// Store `bytes` in `folder`, returning the address of the stored object.
    fn put(&self, bytes: &[u8], folder: &str, content_type: &str) -> Result<String, SinkError>;
}

/// Persists finished analysis records.
pub trait RecordSink: Sync {
    fn store(&self, record: &AnalysisRecord) -> Result<(), SinkError>;
}

/// SHA-256 of `bytes`, returned as a hex string.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// File extension for a MIME type, `bin` when unknown.
fn extension_for(content_type: &str) -> &'static str {
    ImageFormat::from_mime_type(content_type)
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("bin")
}

/// Only plain relative folder names are accepted (`filtered`, `sample/colour`).
fn validate_folder(folder: &str) -> Result<(), SinkError> {
    let path = Path::new(folder);
    let plain = !folder.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(SinkError::Rejected(format!("invalid folder: {folder:?}")))
    }
}

/// Object sink backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectSink for DirectorySink {
    fn put(&self, bytes: &[u8], folder: &str, content_type: &str) -> Result<String, SinkError> {
        validate_folder(folder)?;
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir)?;

        let hash = content_hash(bytes);
        let name = format!("{}.{}", &hash[..NAME_HASH_LEN], extension_for(content_type));
        let path = dir.join(name);
        // Same name means same bytes
        if !path.exists() {
            fs::write(&path, bytes)?;
        }
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored object");
        Ok(path.to_string_lossy().into_owned())
    }
}

/// Record sink appending newline-delimited JSON to a single file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn store(&self, record: &AnalysisRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| SinkError::Rejected("record file lock poisoned".into()))?;
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}
