//! Error types for database administration operations

use std::time::Duration;
use thiserror::Error;

/// Database administration errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The driver or engine rejected a statement (missing table, privilege, syntax)
    ///
    /// `source` is absent when the server reported the failure as a result
    /// row instead of an SQL error, as `OPTIMIZE TABLE` does.
    #[error("Statement failed `{sql}`: {message}")]
    Statement {
        sql: String,
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Table creation collided with an existing table
    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    /// A column was declared twice in one table definition
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Identifier failed allow-list validation and was never sent to the server
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No connection is configured under the requested name
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// Database type not supported
    #[error("Unsupported database: {0}")]
    UnsupportedDatabase(String),

    /// Statement exceeded the configured timeout
    #[error("Statement timed out after {after:?}: {sql}")]
    Timeout { sql: String, after: Duration },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to connect to database
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl DatabaseError {
    /// Wrap a driver error together with the statement that produced it
    pub fn statement(sql: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Statement {
            sql: sql.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// A statement the server answered with an error message row
    pub fn rejected(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Statement {
            sql: sql.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns the SQL text for statement-level failures
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Statement { sql, .. } | Self::Timeout { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_error_keeps_sql_and_source() {
        let err = DatabaseError::statement("TRUNCATE missing", sqlx::Error::RowNotFound);
        assert_eq!(err.sql(), Some("TRUNCATE missing"));
        assert!(err.to_string().contains("TRUNCATE missing"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn rejected_statement_has_message_but_no_source() {
        let err = DatabaseError::rejected("OPTIMIZE TABLE nope", "Table 'shop.nope' doesn't exist");
        assert_eq!(err.sql(), Some("OPTIMIZE TABLE nope"));
        assert!(err.to_string().ends_with("Table 'shop.nope' doesn't exist"));
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn non_statement_errors_have_no_sql() {
        let err = DatabaseError::DuplicateTable("users".to_string());
        assert_eq!(err.sql(), None);
        assert_eq!(err.to_string(), "Table already exists: users");
    }
}
