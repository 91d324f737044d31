//! Outbound Peasys messages.
//!
//! Each message implements the `Message` trait for single-allocation serialization.

pub mod command;
pub mod login;

pub use command::CommandMessage;
pub use login::LoginMessage;
