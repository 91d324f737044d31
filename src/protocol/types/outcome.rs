//! Outcomes returned to callers.

use std::fmt;

use super::result_set::ResultSet;

/// Result of a statement that does not return rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Whether the SQL state counts as success for this statement kind.
    pub succeeded: bool,
    /// 5-character SQL state.
    pub sql_state: String,
    /// Server message, trimmed.
    pub message: String,
    /// Rows touched by INSERT/UPDATE/DELETE; 0 otherwise.
    pub rows_affected: u64,
}

/// Result of a SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectResponse {
    /// SQL state and message. On a server-side SQL error `result` is empty.
    pub outcome: QueryOutcome,
    /// Decoded rows.
    pub result: ResultSet,
}

impl SelectResponse {
    /// Whether the SELECT succeeded.
    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded
    }
}

/// Result of a CREATE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    pub outcome: QueryOutcome,
    /// Set for `CREATE DATABASE <name>`.
    pub database_name: Option<String>,
    /// Set for `CREATE INDEX <name>`.
    pub index_name: Option<String>,
}

/// One message extracted from an OS command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReplyEntry {
    /// Message identifier such as `CPF2105`.
    pub code: String,
    /// First sentence of the message text.
    pub description: String,
}

impl fmt::Display for CommandReplyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.description)
    }
}

/// Result of an OS/400 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// False if any `CPF` message was returned or the reply was unreadable.
    pub succeeded: bool,
    /// Non-informational messages, in reply order.
    pub messages: Vec<CommandReplyEntry>,
}

impl CommandOutcome {
    /// Messages rendered as `"<code> <description>"`.
    pub fn lines(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_outcome_lines() {
        let outcome = CommandOutcome {
            succeeded: false,
            messages: vec![CommandReplyEntry {
                code: "CPF2105".to_string(),
                description: "Objet MYLIB non trouvé".to_string(),
            }],
        };
        assert_eq!(outcome.lines(), vec!["CPF2105 Objet MYLIB non trouvé"]);
    }
}
