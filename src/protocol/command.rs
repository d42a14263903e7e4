//! Command definitions
//!
//! Represents requests from clients.

use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;
use crate::record::{NewStudent, ResultPayload, StudentPatch};
use crate::storage::AttachmentUploads;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Ping = 0x01,
    Create = 0x02,
    List = 0x03,
    Find = 0x04,
    RollNumber = 0x05,
    SetResult = 0x06,
    GetResult = 0x07,
    Update = 0x08,
    Delete = 0x09,
    Export = 0x0A,
}

impl CommandType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        let command_type = match byte {
            0x01 => CommandType::Ping,
            0x02 => CommandType::Create,
            0x03 => CommandType::List,
            0x04 => CommandType::Find,
            0x05 => CommandType::RollNumber,
            0x06 => CommandType::SetResult,
            0x07 => CommandType::GetResult,
            0x08 => CommandType::Update,
            0x09 => CommandType::Delete,
            0x0A => CommandType::Export,
            _ => return None,
        };
        Some(command_type)
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Health check
    Ping,

    /// Register a student
    Create {
        student: NewStudent,
        uploads: AttachmentUploads,
    },

    /// Every record
    List,

    /// Record matching name and email
    Find { name: String, email: String },

    /// Live roll number of the record matching name and email
    RollNumber { name: String, email: String },

    /// File a result under a live roll number
    SetResult {
        roll_number: String,
        payload: ResultPayload,
    },

    /// Record whose stored result carries the roll number
    GetResult { roll_number: String },

    /// Patch a record, optionally replacing attachments
    Update {
        id: String,
        patch: StudentPatch,
        uploads: AttachmentUploads,
    },

    /// Remove a record
    Delete { id: String },

    /// Render the collection
    Export { format: ExportFormat },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Ping => CommandType::Ping,
            Command::Create { .. } => CommandType::Create,
            Command::List => CommandType::List,
            Command::Find { .. } => CommandType::Find,
            Command::RollNumber { .. } => CommandType::RollNumber,
            Command::SetResult { .. } => CommandType::SetResult,
            Command::GetResult { .. } => CommandType::GetResult,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
            Command::Export { .. } => CommandType::Export,
        }
    }

    /// Commands gated by the shared secret
    pub fn requires_secret(&self) -> bool {
        matches!(
            self,
            Command::Create { .. } | Command::Update { .. } | Command::Delete { .. }
        )
    }
}

/// A command plus the credential it travels with
///
/// The engine never looks at `secret_key`; the network layer checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub secret_key: Option<String>,
    pub command: Command,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            secret_key: None,
            command,
        }
    }

    pub fn with_secret_key(mut self, key: Option<String>) -> Self {
        self.secret_key = key;
        self
    }
}
