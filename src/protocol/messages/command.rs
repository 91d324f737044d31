//! Framed command message.

use crate::error::{Error, Result};
use crate::protocol::constants::TERMINATOR;
use crate::protocol::framer::{find_terminator, Verb};
use crate::protocol::message::{latin1_wire_size, Message, WriteExt};

/// `<verb><payload><terminator>`.
#[derive(Debug)]
pub struct CommandMessage<'a> {
    /// Command verb.
    pub verb: Verb,
    /// Statement or CL command text.
    pub payload: &'a str,
}

impl<'a> CommandMessage<'a> {
    /// Create a command message.
    ///
    /// Returns `Err(Error::InvalidSyntax)` if the payload contains the
    /// terminator literal, since the server would cut the command there.
    pub fn new(verb: Verb, payload: &'a str) -> Result<Self> {
        if find_terminator(payload.as_bytes(), 0).is_some() {
            return Err(Error::syntax(
                "statement contains the reserved reply terminator",
            ));
        }
        Ok(Self { verb, payload })
    }

    /// Disconnect sentinel.
    pub fn stop() -> Self {
        Self {
            verb: Verb::Stop,
            payload: "",
        }
    }
}

impl Message for CommandMessage<'_> {
    fn wire_size(&self) -> usize {
        self.verb.prefix().len() + latin1_wire_size(self.payload) + TERMINATOR.len()
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_bytes(self.verb.prefix().as_bytes());
        buf.write_latin1(self.payload)?;
        buf.write_bytes(TERMINATOR);
        Ok(())
    }
}
