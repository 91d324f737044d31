//! Credential block sent right after the TCP connect.

use crate::error::Result;
use crate::protocol::constants::CREDENTIAL_FIELD_WIDTH;
use crate::protocol::message::{Message, WriteExt};

/// Username and password, each space-padded to exactly 10 characters.
///
/// Length is validated by [`Credentials::validate`] before connecting; this
/// message only pads.
///
/// [`Credentials::validate`]: crate::protocol::connect::Credentials::validate
pub struct LoginMessage<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl Message for LoginMessage<'_> {
    fn wire_size(&self) -> usize {
        CREDENTIAL_FIELD_WIDTH * 2
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_padded(self.username, CREDENTIAL_FIELD_WIDTH)?;
        buf.write_padded(self.password, CREDENTIAL_FIELD_WIDTH)?;
        Ok(())
    }
}
