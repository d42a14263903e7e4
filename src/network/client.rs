//! TCP Client
//!
//! Blocking client used by the CLI and by end-to-end tests.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;

use crate::error::{Result, RollbookError};
use crate::protocol::{read_response, write_request, Command, Request, Response, ResponseBody};

/// A connection to a Rollbook server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Attached to every request
    secret_key: Option<String>,
}

impl Client {
    /// Connect to `addr` (host:port)
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| RollbookError::Network(format!("cannot connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            secret_key: None,
        })
    }

    /// Present `key` with every request
    pub fn with_secret_key(mut self, key: Option<String>) -> Self {
        self.secret_key = key;
        self
    }

    /// Send one command and wait for its response
    pub fn send(&mut self, command: Command) -> Result<Response> {
        let request = Request::new(command).with_secret_key(self.secret_key.clone());
        write_request(&mut self.writer, &request)?;
        read_response(&mut self.reader)
    }

    /// Round-trip a PING
    pub fn ping(&mut self) -> Result<()> {
        let response = self.send(Command::Ping)?;
        match response.body {
            ResponseBody::Pong => Ok(()),
            other => Err(RollbookError::Protocol(format!(
                "unexpected reply to ping: {:?}",
                other
            ))),
        }
    }
}
