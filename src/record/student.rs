//! Student record definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollbookError};
use crate::roll;

use super::{require_text, ResultRecord};

/// A persisted student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Primary key (UUID v4), immutable after creation
    pub id: String,

    pub name: String,
    pub email: String,
    pub course: String,

    #[serde(alias = "mno")]
    pub mobile_number: String,

    #[serde(alias = "dobDate")]
    pub date_of_birth: String,

    #[serde(default)]
    pub address: String,

    #[serde(default, alias = "profilePic")]
    pub profile_image_ref: Option<String>,

    #[serde(default, alias = "signature")]
    pub signature_image_ref: Option<String>,

    #[serde(default, alias = "sheetCopy")]
    pub sheet_image_ref: Option<String>,

    /// Embedded exam result, absent until set
    #[serde(default)]
    pub result: Option<ResultRecord>,
}

impl StudentRecord {
    /// Build a fresh record from validated fields
    pub(crate) fn new(id: String, fields: NewStudent, refs: AttachmentRefs) -> Self {
        Self {
            id,
            name: fields.name,
            email: fields.email,
            course: fields.course,
            mobile_number: fields.mobile_number,
            date_of_birth: fields.date_of_birth,
            address: fields.address,
            profile_image_ref: refs.profile,
            signature_image_ref: refs.signature,
            sheet_image_ref: refs.sheet,
            result: None,
        }
    }

    /// Roll number derived from the current name, date of birth and mobile
    pub fn roll_number(&self) -> Result<String> {
        roll::derive(&self.name, &self.date_of_birth, &self.mobile_number)
    }

    /// Attachment reference held in `slot`
    pub fn attachment_ref(&self, slot: AttachmentSlot) -> Option<&str> {
        match slot {
            AttachmentSlot::Profile => self.profile_image_ref.as_deref(),
            AttachmentSlot::Signature => self.signature_image_ref.as_deref(),
            AttachmentSlot::Sheet => self.sheet_image_ref.as_deref(),
        }
    }

    /// Point `slot` at a new reference, returning the previous one
    pub(crate) fn set_attachment_ref(
        &mut self,
        slot: AttachmentSlot,
        reference: String,
    ) -> Option<String> {
        let field = match slot {
            AttachmentSlot::Profile => &mut self.profile_image_ref,
            AttachmentSlot::Signature => &mut self.signature_image_ref,
            AttachmentSlot::Sheet => &mut self.sheet_image_ref,
        };
        field.replace(reference)
    }

    /// Copy of the references held in every slot
    pub fn attachments(&self) -> AttachmentRefs {
        AttachmentRefs {
            profile: self.profile_image_ref.clone(),
            signature: self.signature_image_ref.clone(),
            sheet: self.sheet_image_ref.clone(),
        }
    }

    /// All attachment references currently held
    pub fn attachment_refs(&self) -> impl Iterator<Item = &str> {
        AttachmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.attachment_ref(slot))
    }
}

/// Fields supplied when registering a student
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub course: String,
    pub mobile_number: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
}

impl NewStudent {
    /// Check required fields, reporting the first missing one
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(RollbookError::validation("email", "must contain '@'"));
        }
        require_text("course", &self.course)?;
        require_text("mobileNumber", &self.mobile_number)?;
        require_text("dateOfBirth", &self.date_of_birth)?;
        Ok(())
    }
}

/// One of the three attachment positions on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentSlot {
    Profile,
    Signature,
    Sheet,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 3] = [
        AttachmentSlot::Profile,
        AttachmentSlot::Signature,
        AttachmentSlot::Sheet,
    ];
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttachmentSlot::Profile => "profileImage",
            AttachmentSlot::Signature => "signatureImage",
            AttachmentSlot::Sheet => "sheetImage",
        };
        f.write_str(name)
    }
}

/// Attachment references keyed by slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentRefs {
    pub profile: Option<String>,
    pub signature: Option<String>,
    pub sheet: Option<String>,
}

impl AttachmentRefs {
    pub fn set(&mut self, slot: AttachmentSlot, reference: String) {
        match slot {
            AttachmentSlot::Profile => self.profile = Some(reference),
            AttachmentSlot::Signature => self.signature = Some(reference),
            AttachmentSlot::Sheet => self.sheet = Some(reference),
        }
    }

    pub fn get(&self, slot: AttachmentSlot) -> Option<&str> {
        match slot {
            AttachmentSlot::Profile => self.profile.as_deref(),
            AttachmentSlot::Signature => self.signature.as_deref(),
            AttachmentSlot::Sheet => self.sheet.as_deref(),
        }
    }

    /// Iterate over the slots that carry a reference
    pub fn iter(&self) -> impl Iterator<Item = (AttachmentSlot, &str)> {
        AttachmentSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|r| (slot, r)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
