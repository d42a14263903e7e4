//! Storage Module
//!
//! Flat-file persistence for student records and their attachments.
//!
//! ## Responsibilities
//! - Load/persist the whole record collection as one JSON document
//! - Atomic replacement (temp file + rename) so readers never see a torn write
//! - Rebuild id / live-roll-number indexes on every load
//! - Validate, name, store and delete attachment files
//!
//! ## On-Disk Layout
//! ```text
//! {data_dir}/
//!   ├── students.json                       [ {StudentRecord}, ... ]
//!   └── uploads/
//!         ├── 1718040000123_9f2c41d0_PHOTO.png
//!         └── 1718040000456_04b1e7aa_SHEET.pdf
//! ```

mod document;
mod records;
mod attachments;
mod media;

pub use document::DocumentStore;
pub use records::{Collection, Deletion, RecordStore};
pub use attachments::{AttachmentStore, AttachmentUploads, StagedAttachments, Upload};
pub use media::MediaKind;
