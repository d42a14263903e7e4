//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::RollbookError;
use crate::export::Export;
use crate::record::StudentRecord;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
    Invalid = 0x03,
    Unauthorized = 0x04,
    UnsupportedMedia = 0x05,
    TooLarge = 0x06,
    StoreCorrupt = 0x07,
    Forbidden = 0x08,
}

impl Status {
    pub fn from_u8(byte: u8) -> Option<Self> {
        let status = match byte {
            0x00 => Status::Ok,
            0x01 => Status::NotFound,
            0x02 => Status::Error,
            0x03 => Status::Invalid,
            0x04 => Status::Unauthorized,
            0x05 => Status::UnsupportedMedia,
            0x06 => Status::TooLarge,
            0x07 => Status::StoreCorrupt,
            0x08 => Status::Forbidden,
            _ => return None,
        };
        Some(status)
    }
}

/// Response payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseBody {
    Pong,
    Record(StudentRecord),
    Records(Vec<StudentRecord>),
    RollNumber(String),
    Export(Export),
    Error { message: String },
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    pub body: ResponseBody,
}

impl Response {
    /// Create an OK response
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    /// Create a failure response with a message
    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Error {
                message: message.into(),
            },
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::failure(Status::Error, message)
    }

    /// Map an operation error to its status
    pub fn from_error(error: &RollbookError) -> Self {
        let status = match error {
            RollbookError::NotFound(_) => Status::NotFound,
            RollbookError::Validation { .. } | RollbookError::Derivation { .. } => Status::Invalid,
            RollbookError::Unauthorized => Status::Unauthorized,
            RollbookError::UnsupportedMediaType(_) => Status::UnsupportedMedia,
            RollbookError::PayloadTooLarge { .. } => Status::TooLarge,
            RollbookError::StoreCorrupt(_) => Status::StoreCorrupt,
            RollbookError::PathTraversalRejected(_) => Status::Forbidden,
            _ => Status::Error,
        };
        Self::failure(status, error.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error message carried by a failure response
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Error { message } => Some(message),
            _ => None,
        }
    }
}
