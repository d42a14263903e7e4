//! Export Module
//!
//! Read-only projections of the student collection into download formats.
//!
//! | Format | Content type       | File name          |
//! |--------|--------------------|--------------------|
//! | Json   | `application/json` | `StudentData.json` |
//! | Csv    | `text/csv`         | `StudentData.csv`  |
//! | Xml    | `application/xml`  | `StudentData.xml`  |
//! | Text   | `text/plain`       | `StudentData.txt`  |

mod csv;
mod xml;
mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollbookError};
use crate::record::StudentRecord;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Csv,
    Xml,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Xml,
        ExportFormat::Text,
    ];

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Text => "text/plain",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Text => "txt",
        }
    }

    /// Suggested download file name
    pub fn file_name(&self) -> String {
        format!("StudentData.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RollbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "txt" | "text" | "plaintext" => Ok(ExportFormat::Text),
            other => Err(RollbookError::validation(
                "format",
                format!("unknown export format {}", other),
            )),
        }
    }
}

/// A rendered export, ready to hand to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub format: ExportFormat,
    pub content_type: String,
    pub file_name: String,
    pub body: Vec<u8>,
}

/// Render `records` in `format`
pub fn render(format: ExportFormat, records: &[StudentRecord]) -> Result<Export> {
    let body = match format {
        ExportFormat::Json => serde_json::to_vec_pretty(records)
            .map_err(|e| RollbookError::Serialization(e.to_string()))?,
        ExportFormat::Csv => csv::render(records).into_bytes(),
        ExportFormat::Xml => xml::render(records).into_bytes(),
        ExportFormat::Text => text::render(records).into_bytes(),
    };

    Ok(Export {
        format,
        content_type: format.content_type().to_string(),
        file_name: format.file_name(),
        body,
    })
}
