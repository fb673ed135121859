//! Type definitions for database administration operations

use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// Raw execution result returned by the driver for non-query statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementOutcome {
    /// Rows affected as reported by the server
    pub rows_affected: u64,
}

impl From<sqlx::any::AnyQueryResult> for StatementOutcome {
    fn from(result: sqlx::any::AnyQueryResult) -> Self {
        Self {
            rows_affected: result.rows_affected(),
        }
    }
}

/// One row of the message set `OPTIMIZE TABLE` answers with
///
/// The server reports a missing table or a storage engine failure here, as
/// a row whose `msg_type` is `Error`, instead of failing the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceMessage {
    pub table: String,
    pub op: String,
    pub msg_type: String,
    pub msg_text: String,
}

impl MaintenanceMessage {
    /// Build from the `Table`, `Op`, `Msg_type`, `Msg_text` columns
    pub fn from_row(row: Vec<String>) -> Self {
        let mut columns = row.into_iter();
        let mut next = || columns.next().unwrap_or_default();
        Self {
            table: next(),
            op: next(),
            msg_type: next(),
            msg_text: next(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.msg_type.eq_ignore_ascii_case("error")
    }
}

/// Column type tags accepted by table creation
///
/// The tags follow the schema builder's method names, so `"string"` becomes
/// a `VARCHAR`, `"boolean"` a `TINYINT(1)` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Date,
    Timestamp,
    Blob,
}

/// One column in a table definition
///
/// Deserializes from `{"name": "email", "type": "string", "length": 255}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Type tag
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Length for strings, precision for decimals; ignored otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Scale for decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType, length: Option<u32>) -> Self {
        Self {
            name: name.into(),
            column_type,
            length,
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Database type for connection validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseType {
    MySQL,
    MariaDB,
}

impl DatabaseType {
    /// Detect database type from connection URL scheme
    ///
    /// # Examples
    /// ```
    /// # use kodegen_tools_dbutil::types::DatabaseType;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = DatabaseType::from_url("mysql://localhost/shop")?;
    /// assert_eq!(db, DatabaseType::MySQL);
    /// assert!(DatabaseType::from_url("postgres://localhost/shop").is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_url(url: &str) -> Result<Self, DatabaseError> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase());

        match scheme.as_deref() {
            Some("mysql") => Ok(Self::MySQL),
            Some("mariadb") => Ok(Self::MariaDB),
            _ => Err(DatabaseError::UnsupportedDatabase(format!(
                "Cannot determine database type from URL scheme: {}",
                url.split("://").next().unwrap_or_default()
            ))),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySQL => write!(f, "MySQL"),
            Self::MariaDB => write!(f, "MariaDB"),
        }
    }
}
