//! Partial record updates
//!
//! A patch lists every field an update may touch. `id` is deliberately
//! absent, and unknown keys are refused when a patch is parsed from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollbookError};

use super::{require_text, ResultRecord, StudentRecord};

/// Field-by-field update for a student record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub mobile_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,

    /// Replaces the stored result wholesale when present
    pub result: Option<ResultRecord>,
}

impl StudentPatch {
    /// Parse a patch from JSON, refusing `id` and unknown keys
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RollbookError::validation("patch", e.to_string()))
    }

    /// Present text fields must not be blank; a present result must be valid
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("course", &self.course),
            ("mobileNumber", &self.mobile_number),
            ("dateOfBirth", &self.date_of_birth),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(RollbookError::validation("email", "must contain '@'"));
            }
        }
        if let Some(result) = &self.result {
            result.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite each present field on `record`
    pub fn apply(self, record: &mut StudentRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(course) = self.course {
            record.course = course;
        }
        if let Some(mobile_number) = self.mobile_number {
            record.mobile_number = mobile_number;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            record.date_of_birth = date_of_birth;
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if let Some(result) = self.result {
            record.result = Some(result);
        }
    }
}
