//! Error types for the Peasys client.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Peasys operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or oversized credential fields, or credentials refused by the server.
    InvalidCredentials,
    /// The license key was refused by the license service.
    InvalidLicense,
    /// The stream could not be opened, was closed early, or timed out.
    ConnectionFailure,
    /// The statement was rejected before being sent.
    InvalidSyntax,
    /// A server reply could not be decoded.
    ProtocolDecode,
    /// A result set was asked for a column it does not have.
    ColumnNotFound,
}

/// Error type for Peasys client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection closed by the server before a reply was complete.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection timed out during TCP connect.
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    ConnectionTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// No reply data arrived within the configured read timeout.
    #[error("No reply from server within {timeout:?}")]
    ReadTimeout { timeout: Duration },

    /// DNS resolution failed.
    #[error("Failed to resolve hostname '{hostname}': {message}")]
    DnsResolutionFailed { hostname: String, message: String },

    /// Invalid `host:port` address string.
    #[error("Invalid connect string: {message}")]
    InvalidConnectString { message: String },

    /// Credentials rejected locally or by the server.
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// License key refused by the license service.
    #[error("Invalid license key: {message}")]
    InvalidLicense { message: String },

    /// The license service could not be reached or answered garbage.
    #[error("License service error: {message}")]
    LicenseService { message: String },

    /// The server refused the session for a non-credential reason.
    #[error("Connection failure: {message}")]
    ConnectionFailure { message: String },

    /// Statement rejected before any I/O.
    #[error("Invalid syntax: {message}")]
    InvalidSyntax { message: String },

    /// A character cannot be sent in the single-byte wire encoding.
    #[error("Character {character:?} cannot be encoded as ISO-8859-1")]
    UnencodableCharacter { character: char },

    /// Malformed server reply. The raw payload is kept for diagnosis.
    #[error("Protocol decode error: {message}")]
    ProtocolDecode { message: String, payload: String },

    /// Type conversion error on a single field.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },
}

impl Error {
    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
        }
    }

    /// Create a credentials error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Create a connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
        }
    }

    /// Create a decode error wrapping the raw server payload.
    pub fn decode(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::ProtocolDecode {
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            Error::InvalidLicense { .. } => ErrorKind::InvalidLicense,
            Error::Io(_)
            | Error::ConnectionClosed
            | Error::ConnectionTimeout { .. }
            | Error::ReadTimeout { .. }
            | Error::DnsResolutionFailed { .. }
            | Error::InvalidConnectString { .. }
            | Error::LicenseService { .. }
            | Error::ConnectionFailure { .. } => ErrorKind::ConnectionFailure,
            Error::InvalidSyntax { .. } | Error::UnencodableCharacter { .. } => {
                ErrorKind::InvalidSyntax
            }
            Error::ProtocolDecode { .. } | Error::TypeConversion { .. } => {
                ErrorKind::ProtocolDecode
            }
            Error::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
        }
    }

    /// The raw server payload attached to a decode error, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Error::ProtocolDecode { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
