//! Statement classification and pre-send validation.

use crate::error::{Error, Result};
use crate::protocol::constants::{SQL_STATE_NO_ROWS_UPDATED, SQL_STATE_SUCCESS};

/// Kind of SQL statement, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    /// Anything else (CALL, COMMENT, LABEL, ...).
    Other,
}

impl StatementKind {
    const KEYWORDED: [StatementKind; 7] = [
        StatementKind::Select,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Create,
        StatementKind::Alter,
        StatementKind::Drop,
    ];

    /// Leading keyword, upper case.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            StatementKind::Select => Some("SELECT"),
            StatementKind::Insert => Some("INSERT"),
            StatementKind::Update => Some("UPDATE"),
            StatementKind::Delete => Some("DELETE"),
            StatementKind::Create => Some("CREATE"),
            StatementKind::Alter => Some("ALTER"),
            StatementKind::Drop => Some("DROP"),
            StatementKind::Other => None,
        }
    }

    /// Whether `sql` starts with this kind's keyword (case-insensitive).
    ///
    /// This is a plain prefix test: `"SELECTED"` counts as SELECT.
    pub fn matches(self, sql: &str) -> bool {
        match self.keyword() {
            Some(kw) => sql
                .get(..kw.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw)),
            None => false,
        }
    }

    /// Classify a statement by its leading keyword.
    pub fn classify(sql: &str) -> Self {
        Self::KEYWORDED
            .into_iter()
            .find(|kind| kind.matches(sql))
            .unwrap_or(StatementKind::Other)
    }

    /// Whether the server reports a row count for this kind.
    pub fn reports_row_count(self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }

    /// Whether `sql_state` means success for this kind.
    ///
    /// UPDATE also accepts `01504`, the warning for an UPDATE without WHERE.
    pub fn accepts_state(self, sql_state: &str) -> bool {
        sql_state == SQL_STATE_SUCCESS
            || (self == StatementKind::Update && sql_state == SQL_STATE_NO_ROWS_UPDATED)
    }
}

/// Reject empty text.
pub fn require_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(Error::syntax("Query should not be either null or empty"));
    }
    Ok(())
}

/// Reject empty statements and statements of the wrong kind.
pub fn validate_statement(sql: &str, expected: StatementKind) -> Result<()> {
    require_text(sql)?;
    if let Some(kw) = expected.keyword() {
        if !expected.matches(sql) {
            return Err(Error::syntax(format!(
                "Query should start with the {} SQL keyword",
                kw
            )));
        }
    }
    Ok(())
}

/// Object created by a CREATE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateTarget {
    Table,
    Index(String),
    Database(String),
}

/// Read the object kind and name out of a CREATE statement.
pub fn parse_create_target(sql: &str) -> Result<CreateTarget> {
    let mut words = sql.split_whitespace().skip(1);
    let invalid = || Error::syntax(format!("Syntax invalid in query : {}", sql));

    let kind = words.next().ok_or_else(invalid)?;
    if kind.eq_ignore_ascii_case("TABLE") {
        Ok(CreateTarget::Table)
    } else if kind.eq_ignore_ascii_case("INDEX") {
        let name = words.next().ok_or_else(invalid)?;
        Ok(CreateTarget::Index(name.to_string()))
    } else if kind.eq_ignore_ascii_case("DATABASE") {
        let name = words.next().ok_or_else(invalid)?;
        Ok(CreateTarget::Database(name.to_string()))
    } else {
        Err(invalid())
    }
}
