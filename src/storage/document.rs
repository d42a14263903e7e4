//! Student Document
//!
//! The whole record collection lives in one JSON array on disk.
//!
//! ## Write Protocol
//! ```text
//!   serialize ──► .students.json.<uuid>.tmp ──► fsync ──► rename ──► fsync(dir)
//! ```
//! The rename is atomic on the same filesystem, so a reader sees either the
//! previous document or the new one, never a truncated file.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Result, RollbookError};
use crate::record::StudentRecord;

/// Reads and atomically replaces the student document
#[derive(Debug)]
pub struct DocumentStore {
    /// Location of the JSON document
    path: PathBuf,

    /// Pretty-print on save
    pretty: bool,
}

impl DocumentStore {
    /// Open the document at `path`, creating an empty collection if the
    /// file does not exist yet
    ///
    /// An existing document is left untouched, even when it is unreadable.
    pub fn open(path: &Path, pretty: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let store = Self {
            path: path.to_path_buf(),
            pretty,
        };

        if !path.exists() {
            tracing::info!("Initializing empty student document at {}", path.display());
            store.save(&[])?;
        }

        Ok(store)
    }

    /// Read and parse the whole document
    ///
    /// A missing or unparsable document is `StoreCorrupt`; it is never
    /// treated as an empty collection.
    pub fn load(&self) -> Result<Vec<StudentRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RollbookError::StoreCorrupt(format!(
                    "document {} is missing",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            RollbookError::StoreCorrupt(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Serialize `records` and swap them in with a temp-file rename
    ///
    /// Once the rename succeeds the new document is live, so a failed
    /// directory fsync after it is logged rather than returned.
    pub fn save(&self, records: &[StudentRecord]) -> Result<()> {
        let tmp_path = self.temp_path();

        let swapped = self
            .write_temp(&tmp_path, records)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(RollbookError::from));

        if let Err(e) = swapped {
            // Leave no stray temp file behind; the live document is intact.
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        if let Err(e) = sync_parent_directory(&self.path) {
            tracing::warn!(
                "Saved {} but could not sync its directory: {}",
                self.path.display(),
                e
            );
        }
        Ok(())
    }

    /// Path of the live document
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_temp(&self, tmp_path: &Path, records: &[StudentRecord]) -> Result<()> {
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(tmp_path)?;

        let mut writer = BufWriter::new(file);
        let encoded = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, records)
        } else {
            serde_json::to_writer(&mut writer, records)
        };
        encoded.map_err(|e| RollbookError::Serialization(e.to_string()))?;
        writer.write_all(b"\n")?;

        let file = writer
            .into_inner()
            .map_err(|e| RollbookError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }

    /// Unique sibling of the document, so unsynchronized writers never share
    /// a temp file
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "students.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        let dir = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        fs::File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_directory(_path: &Path) -> Result<()> {
    Ok(())
}
