//! Attachment Store
//!
//! Binary files (photo, signature, scanned sheet) stored flat under one
//! upload directory. Records refer to them by file name only.
//!
//! ## Naming
//! ```text
//!   "my photo (1).PNG"  →  1718040000123_9f2c41d0_MY_PHOTO_1.png
//!                          └─ millis ─┘ └random┘ └─ base ─┘ └ext┘
//! ```
//! The base is upper-cased and every run of characters outside `[A-Za-z0-9]`
//! collapses to one `_`, so a stored name never carries separators or dots
//! other than the extension's.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RollbookError};
use crate::record::{AttachmentRefs, AttachmentSlot};

use super::media::MediaKind;

/// Longest sanitized base name kept in a reference
const MAX_BASE_LEN: usize = 48;

/// An uploaded file as received from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upload {
    /// Client-side file name (may contain a path; only the leaf is used)
    pub file_name: String,

    /// Declared MIME type
    pub content_type: String,

    pub data: Bytes,
}

impl Upload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Files submitted alongside a create or update, one per slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentUploads {
    pub profile: Option<Upload>,
    pub signature: Option<Upload>,
    pub sheet: Option<Upload>,
}

impl AttachmentUploads {
    pub fn get(&self, slot: AttachmentSlot) -> Option<&Upload> {
        match slot {
            AttachmentSlot::Profile => self.profile.as_ref(),
            AttachmentSlot::Signature => self.signature.as_ref(),
            AttachmentSlot::Sheet => self.sheet.as_ref(),
        }
    }

    pub fn set(&mut self, slot: AttachmentSlot, upload: Upload) {
        match slot {
            AttachmentSlot::Profile => self.profile = Some(upload),
            AttachmentSlot::Signature => self.signature = Some(upload),
            AttachmentSlot::Sheet => self.sheet = Some(upload),
        }
    }

    /// Slots that carry an upload
    pub fn iter(&self) -> impl Iterator<Item = (AttachmentSlot, &Upload)> {
        AttachmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|u| (slot, u)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Manages attachment files under a single root directory
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    /// Upload directory (created on first save)
    root: PathBuf,

    /// Per-file size ceiling in bytes
    max_size: usize,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>, max_size: usize) -> Self {
        Self {
            root: root.into(),
            max_size,
        }
    }

    /// Check size and media type without writing anything
    pub fn validate(&self, upload: &Upload) -> Result<MediaKind> {
        if upload.data.len() > self.max_size {
            return Err(RollbookError::PayloadTooLarge {
                size: upload.data.len(),
                limit: self.max_size,
            });
        }

        let (_, ext) = split_file_name(&upload.file_name);
        let by_extension = ext.and_then(MediaKind::from_extension).ok_or_else(|| {
            RollbookError::UnsupportedMediaType(format!(
                "{}: extension must be jpeg, jpg, png or pdf",
                upload.file_name
            ))
        })?;

        let declared = MediaKind::from_mime(&upload.content_type).ok_or_else(|| {
            RollbookError::UnsupportedMediaType(format!(
                "{}: declared type {} is not allowed",
                upload.file_name, upload.content_type
            ))
        })?;

        let sniffed = MediaKind::sniff(&upload.data).ok_or_else(|| {
            RollbookError::UnsupportedMediaType(format!(
                "{}: content is not a JPEG, PNG or PDF",
                upload.file_name
            ))
        })?;

        if by_extension != declared || declared != sniffed {
            return Err(RollbookError::UnsupportedMediaType(format!(
                "{}: extension says {}, declared {}, content is {}",
                upload.file_name, by_extension, declared, sniffed
            )));
        }

        Ok(sniffed)
    }

    /// Validate and store an upload, returning its new reference
    pub fn save(&self, upload: &Upload) -> Result<String> {
        self.validate(upload)?;
        fs::create_dir_all(&self.root)?;

        let reference = generate_reference(&upload.file_name);
        let final_path = self.root.join(&reference);
        let part_path = self.root.join(format!(".{}.part", reference));

        let written = (|| -> Result<()> {
            let mut file = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&part_path)?;
            file.write_all(&upload.data)?;
            file.sync_all()?;
            fs::rename(&part_path, &final_path)?;
            Ok(())
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&part_path);
            return Err(e);
        }

        tracing::debug!(
            "Stored attachment {} ({} bytes) from {}",
            reference,
            upload.data.len(),
            upload.file_name
        );
        Ok(reference)
    }

    /// Remove the file behind `reference`
    ///
    /// Returns `false` when there was nothing to remove. A reference that
    /// could leave the upload root is rejected before any filesystem call.
    pub fn delete(&self, reference: &str) -> Result<bool> {
        let path = self.path_of(reference)?;

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted attachment {}", reference);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `upload`, then drop the file it supersedes
    ///
    /// The new file is written first, so a failed save leaves `old` in
    /// place. A failure to delete `old` is logged and the new reference is
    /// still returned; the old file is then an orphan.
    pub fn replace(&self, old: Option<&str>, upload: &Upload) -> Result<String> {
        let reference = self.save(upload)?;

        if let Some(old) = old {
            if let Err(e) = self.delete(old) {
                tracing::warn!("Could not remove superseded attachment {}: {}", old, e);
            }
        }

        Ok(reference)
    }

    /// Store every upload for a record whose slots currently hold `prior`
    ///
    /// Nothing is deleted here. If one save fails, the files already
    /// written for the batch are removed and the error is returned.
    pub fn stage(
        &self,
        uploads: &AttachmentUploads,
        prior: &AttachmentRefs,
    ) -> Result<StagedAttachments<'_>> {
        let mut staged = StagedAttachments {
            store: self,
            stored: AttachmentRefs::default(),
            superseded: Vec::new(),
            committed: false,
        };

        for (slot, upload) in uploads.iter() {
            let reference = self.save(upload)?;
            tracing::debug!("Staged {} attachment {}", slot, reference);
            if let Some(old) = prior.get(slot) {
                staged.superseded.push(old.to_string());
            }
            staged.stored.set(slot, reference);
        }

        Ok(staged)
    }

    /// Resolve `reference` strictly inside the upload root
    pub fn path_of(&self, reference: &str) -> Result<PathBuf> {
        let rejected = || RollbookError::PathTraversalRejected(reference.to_string());

        if reference.is_empty()
            || reference.contains(['/', '\\', '\0'])
            || reference.contains("..")
        {
            return Err(rejected());
        }

        let mut components = Path::new(reference).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(reference)),
            _ => Err(rejected()),
        }
    }

    /// Upload directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Files written for one request that no persisted record refers to yet
///
/// `commit` once the record naming them is persisted: the superseded files
/// are then removed. Dropping an uncommitted batch removes the new files
/// and leaves the superseded ones in place.
#[derive(Debug)]
#[must_use = "dropping a staged batch deletes its files"]
pub struct StagedAttachments<'a> {
    store: &'a AttachmentStore,

    /// New reference per uploaded slot
    stored: AttachmentRefs,

    /// References the new files replace
    superseded: Vec<String>,

    committed: bool,
}

impl StagedAttachments<'_> {
    /// References to write into the record
    pub fn refs(&self) -> &AttachmentRefs {
        &self.stored
    }

    /// References that `commit` will remove
    pub fn superseded(&self) -> &[String] {
        &self.superseded
    }

    /// Keep the new files and remove the ones they replace
    ///
    /// A failed removal is logged and leaves an orphan.
    pub fn commit(mut self) {
        self.committed = true;
        for old in &self.superseded {
            if let Err(e) = self.store.delete(old) {
                tracing::warn!("Could not remove superseded attachment {}: {}", old, e);
            }
        }
    }
}

impl Drop for StagedAttachments<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (_, reference) in self.stored.iter() {
            if let Err(e) = self.store.delete(reference) {
                tracing::warn!("Could not remove orphaned attachment {}: {}", reference, e);
            }
        }
    }
}

// =============================================================================
// Naming Helpers
// =============================================================================

/// Split a client file name into (base, extension), dropping any directories
fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    let leaf = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);

    match leaf.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < leaf.len() => (&leaf[..dot], Some(&leaf[dot + 1..])),
        _ => (leaf, None),
    }
}

/// Upper-case, collapse every non-alphanumeric run to `_`, trim, cap
fn sanitize_base(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut pending_gap = false;

    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_gap && !out.is_empty() {
                out.push('_');
            }
            pending_gap = false;
            out.push(c.to_ascii_uppercase());
        } else {
            pending_gap = true;
        }
        if out.len() >= MAX_BASE_LEN {
            break;
        }
    }

    out.truncate(MAX_BASE_LEN);
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("FILE");
    }
    out
}

/// `<millis>_<8 hex>_<BASE>.<ext>`
fn generate_reference(file_name: &str) -> String {
    let (base, ext) = split_file_name(file_name);
    let millis = chrono::Utc::now().timestamp_millis();
    let nonce = Uuid::new_v4().simple().to_string();

    let mut reference = format!("{}_{}_{}", millis, &nonce[..8], sanitize_base(base));
    if let Some(ext) = ext {
        reference.push('.');
        reference.push_str(&ext.to_ascii_lowercase());
    }
    reference
}

