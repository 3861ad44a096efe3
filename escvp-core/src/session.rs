//! Command exchange state machine
//!
//! One command session carries exactly one command over a fresh TCP
//! connection:
//! - the client sends a CONNECT request frame
//! - the projector acknowledges it with a frame of its own
//! - the client sends the command line, terminated by `\r`
//! - the projector replies with `\r`-separated lines ending in the `:` prompt
//!
//! [`Session`] holds no socket. The caller feeds it whatever bytes each read
//! returns and acts on the [`Step`] it gets back, so a handshake or reply
//! split over several reads completes the same way as one that arrives whole.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use escvp_types::Reply;

use crate::{
    constants::{COMMAND_TERMINATOR, REPLY_PROMPT},
    error::{Error, Result},
    frame::Frame,
};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// CONNECT sent, waiting for the projector's acknowledgement
    AwaitingHandshakeAck,

    /// Command sent, collecting the reply
    AwaitingReply,

    /// Reply received; nothing more is expected
    Complete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingHandshakeAck => "awaiting handshake ack",
            Self::AwaitingReply => "awaiting reply",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// What the caller should do after feeding bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write these bytes to the connection
    Send(Bytes),

    /// Read more
    Wait,

    /// The exchange is over
    Reply(Reply),
}

/// Single command exchange
#[derive(Debug)]
pub struct Session {
    command: String,
    state: SessionState,
    buf: BytesMut,
}

impl Session {
    /// Start an exchange for `command`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCommand`] for empty text or text containing
    /// a carriage return, which would end the line early.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();

        if command.is_empty() {
            return Err(Error::InvalidCommand {
                command,
                reason: "command is empty",
            });
        }
        if command.bytes().any(|b| b == COMMAND_TERMINATOR) {
            return Err(Error::InvalidCommand {
                command,
                reason: "command contains a carriage return",
            });
        }

        Ok(Self {
            command,
            state: SessionState::AwaitingHandshakeAck,
            buf: BytesMut::with_capacity(64),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the reply has been received
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Handshake frame to send once connected
    pub fn handshake(&self) -> BytesMut {
        Frame::connect().encode()
    }

    /// Feed bytes read from the connection
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSessionState`] if bytes arrive after the
    /// reply is complete.
    pub fn feed(&mut self, data: &[u8]) -> Result<Step> {
        match self.state {
            SessionState::AwaitingHandshakeAck => {
                self.buf.extend_from_slice(data);
                self.accept_handshake()
            }
            SessionState::AwaitingReply => {
                self.buf.extend_from_slice(data);
                Ok(self.accept_reply())
            }
            SessionState::Complete => Err(Error::InvalidSessionState(format!(
                "{} unexpected bytes after the reply to {:?}",
                data.len(),
                self.command
            ))),
        }
    }

    fn accept_handshake(&mut self) -> Result<Step> {
        let ack_len = match Frame::frame_len(&self.buf) {
            Some(len) => len,
            None if Frame::is_prefix(&self.buf) => return Ok(Step::Wait),
            // Not a frame at all; its arrival is the acknowledgement
            None => self.buf.len(),
        };
        if self.buf.len() < ack_len {
            return Ok(Step::Wait);
        }

        let ack = self.buf.split_to(ack_len);
        match Frame::decode(&ack) {
            Some(frame) if frame.status.is_ok() => {
                debug!("Handshake acknowledged: {}", frame);
            }
            Some(frame) => {
                warn!(status = %frame.status, "Projector did not accept the handshake, sending command anyway");
            }
            None => {
                debug!(len = ack.len(), "Handshake acknowledged with a non-frame payload");
            }
        }

        if !self.buf.is_empty() {
            trace!(
                "Discarding {} bytes received before the command: {}",
                self.buf.len(),
                hex::encode(&self.buf)
            );
            self.buf.clear();
        }

        self.state = SessionState::AwaitingReply;

        let mut line = BytesMut::with_capacity(self.command.len() + 1);
        line.put_slice(self.command.as_bytes());
        line.put_u8(COMMAND_TERMINATOR);
        Ok(Step::Send(line.freeze()))
    }

    /// The prompt ends a reply only at the start of a line, since values
    /// such as MAC addresses may contain colons of their own
    fn accept_reply(&mut self) -> Step {
        let at_prompt = match &self.buf[..] {
            [REPLY_PROMPT] => true,
            [.., COMMAND_TERMINATOR, REPLY_PROMPT] => true,
            _ => false,
        };
        if !at_prompt {
            return Step::Wait;
        }

        let raw = self.buf.split();
        self.state = SessionState::Complete;

        let reply = Reply::parse(&raw);
        debug!(command = %self.command, lines = reply.lines().len(), "Reply complete");
        Step::Reply(reply)
    }
}
