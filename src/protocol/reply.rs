//! Parsers for SQL replies.
//!
//! Mutation replies are `<5-char sql state><message>`. Header replies are a
//! JSON array of column descriptors, or the same state/message pair when the
//! statement failed.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::statement::StatementKind;
use crate::protocol::types::{descriptors_from_json, ColumnDescriptor, QueryOutcome};

/// SQL state and message of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlReply {
    pub sql_state: String,
    pub message: String,
}

/// Split a reply into its 5-character SQL state and trimmed message.
pub fn split_sql_state(reply: &str) -> SqlReply {
    let split = reply
        .char_indices()
        .nth(SQL_STATE_LEN)
        .map_or(reply.len(), |(i, _)| i);
    SqlReply {
        sql_state: reply[..split].to_string(),
        message: reply[split..].trim().to_string(),
    }
}

/// Decoded metadata reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderReply {
    /// The statement is valid; these are its columns.
    Columns(Vec<ColumnDescriptor>),
    /// The server rejected the statement.
    SqlError(SqlReply),
}

/// Parse a metadata reply, including its leading seed character.
///
/// Text that is not JSON is a server error reply. JSON that does not
/// describe columns is a decode error.
pub fn parse_header_reply(reply: &str) -> Result<HeaderReply> {
    match serde_json::from_str::<serde_json::Value>(reply) {
        Ok(json) => Ok(HeaderReply::Columns(descriptors_from_json(json, reply)?)),
        Err(_) => {
            let body = reply
                .strip_prefix(HEADER_REPLY_SEED as char)
                .unwrap_or(reply);
            Ok(HeaderReply::SqlError(split_sql_state(body)))
        }
    }
}

/// Classify a mutation reply for a statement of `kind`.
///
/// The affected row count is the first character of the message, read only
/// when the state is `00000` and the kind reports counts.
pub fn parse_mutation_reply(kind: StatementKind, reply: &str) -> Result<QueryOutcome> {
    let SqlReply { sql_state, message } = split_sql_state(reply);
    let succeeded = kind.accepts_state(&sql_state);

    let rows_affected = if kind.reports_row_count() && sql_state == SQL_STATE_SUCCESS {
        message
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| {
                Error::decode(
                    format!("expected a row count at the start of '{}'", message),
                    reply,
                )
            })? as u64
    } else {
        0
    };

    Ok(QueryOutcome {
        succeeded,
        sql_state,
        message,
        rows_affected,
    })
}
