//! Roll Number Deriver
//!
//! Computes the human-readable roll number from a student's name, date of
//! birth and mobile number.
//!
//! ## Layout
//! ```text
//!   name          "Jordan Lee"   →  "JO"   (first two chars, upper-cased)
//!   date of birth "2004-05-19"   →  "04"   (chars 2..4)
//!   mobile        "9876543210"   →  "10"   (last two chars)
//!                                  ──────
//!                                  "JO0410"
//! ```
//!
//! The value is recomputed from live fields on every lookup. Once copied into
//! a stored result it is a snapshot and is never refreshed.

use crate::error::{Result, RollbookError};

/// Minimum number of characters each input must carry
const MIN_NAME_CHARS: usize = 2;
const MIN_DOB_CHARS: usize = 4;
const MIN_MOBILE_CHARS: usize = 2;

/// Derive a roll number
///
/// Operates on Unicode scalar values; inputs are not trimmed.
pub fn derive(name: &str, date_of_birth: &str, mobile_number: &str) -> Result<String> {
    let name_chars: Vec<char> = name.chars().collect();
    if name_chars.len() < MIN_NAME_CHARS {
        return Err(RollbookError::derivation(
            "name",
            format!("needs at least {} characters", MIN_NAME_CHARS),
        ));
    }

    let dob_chars: Vec<char> = date_of_birth.chars().collect();
    if dob_chars.len() < MIN_DOB_CHARS {
        return Err(RollbookError::derivation(
            "dateOfBirth",
            format!("needs at least {} characters", MIN_DOB_CHARS),
        ));
    }

    let mobile_chars: Vec<char> = mobile_number.chars().collect();
    if mobile_chars.len() < MIN_MOBILE_CHARS {
        return Err(RollbookError::derivation(
            "mobileNumber",
            format!("needs at least {} characters", MIN_MOBILE_CHARS),
        ));
    }

    let mut roll = String::with_capacity(8);
    roll.extend(name_chars[..2].iter().flat_map(|c| c.to_uppercase()));
    roll.extend(&dob_chars[2..4]);
    roll.extend(&mobile_chars[mobile_chars.len() - 2..]);

    Ok(roll)
}
