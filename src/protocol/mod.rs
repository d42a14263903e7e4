//! Protocol Module
//!
//! Defines the wire protocol between the routing layer's clients and the
//! server.
//!
//! ## Frame Format
//!
//! ### Request Frame
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │   bincode(Request)          │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: PING        - health check
//! - 0x02: CREATE      - register a student (+ attachments)
//! - 0x03: LIST        - every record
//! - 0x04: FIND        - by name + email
//! - 0x05: ROLL        - live roll number by name + email
//! - 0x06: SET_RESULT  - file a result by roll number
//! - 0x07: GET_RESULT  - fetch by stored roll number
//! - 0x08: UPDATE      - patch by id (+ attachment replacements)
//! - 0x09: DELETE      - by id
//! - 0x0A: EXPORT      - render the collection
//!
//! ### Response Frame
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │   bincode(ResponseBody)     │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//! - 0x03: INVALID
//! - 0x04: UNAUTHORIZED
//! - 0x05: UNSUPPORTED_MEDIA
//! - 0x06: TOO_LARGE
//! - 0x07: STORE_CORRUPT
//! - 0x08: FORBIDDEN

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType, Request};
pub use response::{Response, ResponseBody, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
