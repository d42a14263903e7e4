//! Record Module
//!
//! Student records, their embedded results, and the typed inputs that
//! create or modify them.
//!
//! ## Persisted Shape
//! ```text
//! {
//!   "id": "5c1e…",                 ← assigned once, never patched
//!   "name": "...", "email": "...", "course": "...",
//!   "mobileNumber": "...", "dateOfBirth": "...", "address": "...",
//!   "profileImageRef": "1718…_PHOTO.png" | null,
//!   "signatureImageRef": ...        | null,
//!   "sheetImageRef": ...            | null,
//!   "result": { "rollNumber", "scores", "total", "percentage" } | null
//! }
//! ```

mod student;
mod result;
mod patch;

pub use student::{AttachmentRefs, AttachmentSlot, NewStudent, StudentRecord};
pub use result::{ResultPayload, ResultRecord, MAX_SCORE};
pub use patch::StudentPatch;

use crate::error::{Result, RollbookError};

/// Reject a blank required text field
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RollbookError::validation(field, "is required"));
    }
    Ok(())
}
