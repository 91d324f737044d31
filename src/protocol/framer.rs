//! Command framing and reply boundary detection.
//!
//! Outbound commands are `<verb><payload><terminator>`; every inbound reply
//! ends with the same terminator. There is no length prefix and no escaping,
//! so a payload must never contain the terminator literal: [`CommandMessage`]
//! rejects such payloads before anything is written.
//!
//! [`CommandMessage`]: crate::protocol::messages::CommandMessage

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::message::Message;
use crate::protocol::messages::CommandMessage;
use bytes::{Buf, Bytes, BytesMut};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Size of each read from the socket.
const READ_CHUNK: usize = 4096;

/// The closed set of command verbs understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Fetch the column metadata of a SELECT.
    FetchHeader,
    /// Fetch the fixed-width row data of a SELECT.
    FetchData,
    /// Run a statement that does not return rows.
    Mutate,
    /// Run an OS/400 CL command.
    OsCommand,
    /// End the session. The server sends no reply.
    Stop,
}

impl Verb {
    /// The 4-character wire prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            Verb::FetchHeader => VERB_FETCH_HEADER,
            Verb::FetchData => VERB_FETCH_DATA,
            Verb::Mutate => VERB_MUTATE,
            Verb::OsCommand => VERB_OS_COMMAND,
            Verb::Stop => VERB_STOP,
        }
    }

    /// Whether the server answers this verb.
    pub fn expects_reply(self) -> bool {
        !matches!(self, Verb::Stop)
    }

    /// Character prepended to the reply before the caller sees it.
    ///
    /// Header replies arrive without their opening bracket; seeding it makes a
    /// successful reply a complete JSON array.
    pub fn reply_seed(self) -> Option<u8> {
        match self {
            Verb::FetchHeader => Some(HEADER_REPLY_SEED),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Position of the first terminator at or after `from`.
pub fn find_terminator(haystack: &[u8], from: usize) -> Option<usize> {
    if haystack.len() < TERMINATOR.len() || from > haystack.len() - TERMINATOR.len() {
        return None;
    }
    haystack[from..]
        .windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|p| p + from)
}

fn replied(verb: Verb) -> Result<()> {
    if verb.expects_reply() {
        Ok(())
    } else {
        Err(Error::syntax(format!("'{}' gets no reply", verb)))
    }
}

/// Request/reply stream over one server connection.
///
/// Requests are strictly sequential: the protocol carries no request
/// identifiers, so only one command may be in flight. Taking `&mut self` on
/// every operation enforces that at compile time.
pub struct CommandStream<S = TcpStream> {
    stream: S,
    /// Per-read timeout. `None` waits forever.
    read_timeout: Option<Duration>,
    /// Bytes received but not yet consumed by a reply.
    partial_buf: BytesMut,
}

impl<S> CommandStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new command stream with no read timeout.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
            partial_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Set the per-read timeout.
    pub fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.read_timeout = read_timeout;
    }

    /// Get the per-read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Send a message (zero-copy).
    pub async fn send_message<M: Message>(&mut self, msg: &M) -> Result<()> {
        let mut buf = Vec::with_capacity(msg.wire_size());
        msg.write_to(&mut buf)?;
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Frame and send a command.
    pub async fn send_command(&mut self, verb: Verb, payload: &str) -> Result<()> {
        let msg = CommandMessage::new(verb, payload)?;
        debug!(verb = %verb, bytes = msg.wire_size(), "sending command");
        self.send_message(&msg).await
    }

    /// Read one raw frame, without its terminator.
    ///
    /// Fails with [`Error::ConnectionClosed`] if the stream ends first.
    pub async fn read_frame(&mut self) -> Result<Bytes> {
        let mut scanned = 0;
        loop {
            if let Some(end) = find_terminator(&self.partial_buf, scanned) {
                let body = self.partial_buf.split_to(end).freeze();
                self.partial_buf.advance(TERMINATOR.len());
                return Ok(body);
            }
            // A terminator may straddle two reads.
            scanned = self
                .partial_buf
                .len()
                .saturating_sub(TERMINATOR.len() - 1);
            self.fill().await?;
        }
    }

    /// Read one reply as text, seeded as the verb requires.
    pub async fn read_reply(&mut self, verb: Verb) -> Result<String> {
        let body = self.read_frame().await?;
        debug!(verb = %verb, bytes = body.len(), "received reply");

        let mut reply = String::with_capacity(body.len() + 1);
        if let Some(seed) = verb.reply_seed() {
            reply.push(seed as char);
        }
        reply.extend(body.iter().map(|&b| b as char));
        Ok(reply)
    }

    /// Send a command and return the raw reply frame.
    ///
    /// Fails without writing if `verb` gets no reply.
    pub async fn request_raw(&mut self, verb: Verb, payload: &str) -> Result<Bytes> {
        replied(verb)?;
        self.send_command(verb, payload).await?;
        let body = self.read_frame().await?;
        debug!(verb = %verb, bytes = body.len(), "received reply");
        Ok(body)
    }

    /// Send a command and wait for its reply.
    ///
    /// Fails without writing if `verb` gets no reply.
    pub async fn request(&mut self, verb: Verb, payload: &str) -> Result<String> {
        replied(verb)?;
        self.send_command(verb, payload).await?;
        self.read_reply(verb).await
    }

    /// Read exactly one raw byte.
    pub async fn read_u8(&mut self) -> Result<u8> {
        if self.partial_buf.is_empty() {
            self.fill().await?;
        }
        Ok(self.partial_buf.get_u8())
    }

    /// Shut down the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Read at least one more byte into the partial buffer.
    async fn fill(&mut self) -> Result<()> {
        self.partial_buf.reserve(READ_CHUNK);
        let n = match self.read_timeout {
            Some(limit) => timeout(limit, self.stream.read_buf(&mut self.partial_buf))
                .await
                .map_err(|_| Error::ReadTimeout { timeout: limit })??,
            None => self.stream.read_buf(&mut self.partial_buf).await?,
        };
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}
