//! Result Merger
//!
//! Files exam results onto students and finds them again.
//!
//! Two distinct keys are involved:
//! - **live** roll number: derived from the student's current fields
//!   (`derive_live`), used to *file* a result;
//! - **stored** roll number: the snapshot inside `ResultRecord`
//!   (`lookup_stored`), used to *fetch* a result.
//!
//! Editing a student's name, date of birth or mobile after filing makes the
//! two disagree. Neither lookup invalidates the other.

use crate::error::{Result, RollbookError};
use crate::record::{ResultPayload, StudentRecord};
use crate::storage::Collection;

/// Roll number computed from the record's current fields
pub fn derive_live(record: &StudentRecord) -> Result<String> {
    record.roll_number()
}

/// File `payload` on the student whose live roll number is `roll` and whose
/// name equals `payload.name`
///
/// The name check guards against two students sharing a roll number. The
/// name is stripped from the stored result. Students without a derivable
/// roll number never match.
pub fn set_result(
    collection: &mut Collection,
    roll: &str,
    payload: ResultPayload,
) -> Result<StudentRecord> {
    if roll.trim().is_empty() {
        return Err(RollbookError::validation("rollNumber", "is required"));
    }
    payload.validate()?;

    let id = collection
        .with_live_roll(roll)
        .find(|student| student.name == payload.name)
        .map(|student| student.id.clone())
        .ok_or_else(|| {
            RollbookError::NotFound(format!("no student {} with roll number {}", payload.name, roll))
        })?;

    let result = payload.into_record(roll);
    let updated = collection.modify(&id, |student| student.result = Some(result))?;

    tracing::info!("Filed result {} on student {}", roll, id);
    Ok(updated.clone())
}

/// Student whose *stored* result carries `roll`
pub fn lookup_stored<'a>(collection: &'a Collection, roll: &str) -> Result<&'a StudentRecord> {
    collection
        .find(|student| {
            student
                .result
                .as_ref()
                .map_or(false, |result| result.roll_number == roll)
        })
        .ok_or_else(|| RollbookError::NotFound(format!("result {}", roll)))
}
