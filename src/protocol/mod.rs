//! Peasys wire protocol implementation.

pub mod buffer;
pub mod command_reply;
pub mod connect;
pub mod constants;
pub mod decode;
pub mod framer;
pub mod message;
pub mod messages;
pub mod reply;
pub mod statement;
pub mod types;

pub use buffer::ReadBuffer;
pub use framer::{CommandStream, Verb};
pub use message::{Message, WriteExt};
pub use messages::{CommandMessage, LoginMessage};
pub use types::{ColumnDescriptor, ResultSet, Value};
