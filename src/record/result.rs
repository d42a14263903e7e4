//! Exam result definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollbookError};

use super::require_text;

/// Highest score a subject can carry
pub const MAX_SCORE: u8 = 100;

/// Result embedded in a student record
///
/// `roll_number` is the roll number the result was filed under. It is a
/// snapshot: later edits to the student do not update it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    #[serde(alias = "rollNo")]
    pub roll_number: String,
    pub scores: BTreeMap<String, u8>,
    pub total: u32,
    pub percentage: f64,
}

impl ResultRecord {
    /// A result supplied whole (e.g. in a patch) must be storable as-is
    pub fn validate(&self) -> Result<()> {
        require_text("result.rollNumber", &self.roll_number)?;
        check_marks(&self.scores, self.percentage)
    }
}

/// Result as submitted for filing
///
/// `name` must match the student's name. It is consumed by the match and
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    pub name: String,
    pub scores: BTreeMap<String, u8>,
    pub total: u32,
    pub percentage: f64,
}

impl ResultPayload {
    /// Build a payload, computing the total and the per-subject average
    /// rounded to two decimals
    pub fn from_scores(name: impl Into<String>, scores: BTreeMap<String, u8>) -> Self {
        let total: u32 = scores.values().map(|&s| u32::from(s)).sum();
        let percentage = if scores.is_empty() {
            0.0
        } else {
            round2(f64::from(total) / scores.len() as f64)
        };

        Self {
            name: name.into(),
            scores,
            total,
            percentage,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        check_marks(&self.scores, self.percentage)
    }

    /// Strip the matching name and stamp the roll number it was filed under
    pub fn into_record(self, roll_number: impl Into<String>) -> ResultRecord {
        ResultRecord {
            roll_number: roll_number.into(),
            scores: self.scores,
            total: self.total,
            percentage: self.percentage,
        }
    }
}

/// Every score within 0..=MAX_SCORE, percentage finite and within 0..=100
///
/// A non-finite percentage would be written as JSON `null` and make the
/// document unreadable.
fn check_marks(scores: &BTreeMap<String, u8>, percentage: f64) -> Result<()> {
    for (subject, &score) in scores {
        if subject.trim().is_empty() {
            return Err(RollbookError::validation("scores", "subject name is empty"));
        }
        if score > MAX_SCORE {
            return Err(RollbookError::validation(
                format!("scores.{}", subject),
                format!("{} is above {}", score, MAX_SCORE),
            ));
        }
    }

    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(RollbookError::validation(
            "percentage",
            format!("{} is outside 0..=100", percentage),
        ));
    }

    Ok(())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
