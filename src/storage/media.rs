//! Media type detection for attachments
//!
//! Three independent signals must agree before a file is accepted: the
//! file-name extension, the declared MIME type, and the leading magic bytes.

use std::fmt;

/// PNG signature: \x89 P N G \r \n \x1a \n
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG SOI marker followed by the start of the next marker
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Attachment formats on the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Jpeg,
    Png,
    Pdf,
}

impl MediaKind {
    /// Classify a file extension (without the dot, any case)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaKind::Jpeg),
            "png" => Some(MediaKind::Png),
            "pdf" => Some(MediaKind::Pdf),
            _ => None,
        }
    }

    /// Classify a declared MIME type, ignoring parameters such as `; charset`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(MediaKind::Jpeg),
            "image/png" => Some(MediaKind::Png),
            "application/pdf" => Some(MediaKind::Pdf),
            _ => None,
        }
    }

    /// Classify file content by its magic bytes
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(PNG_MAGIC) {
            Some(MediaKind::Png)
        } else if data.starts_with(JPEG_MAGIC) {
            Some(MediaKind::Jpeg)
        } else if data.starts_with(PDF_MAGIC) {
            Some(MediaKind::Pdf)
        } else {
            None
        }
    }

    /// Canonical MIME type
    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Png => "image/png",
            MediaKind::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
