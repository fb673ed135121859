//! MySQL administration helpers
//!
//! Thin, explicit wrappers around the administrative statements operators
//! reach for most often: `TRUNCATE`, `OPTIMIZE TABLE`, `SHOW COLUMNS`,
//! `SHOW TABLES`, `SHOW DATABASES` and `DROP TABLE`, plus table creation
//! through a schema builder. Connections are always passed in explicitly,
//! either as a [`Connection`] handle or resolved by name through a
//! [`ConnectionProvider`].

pub mod config;
pub mod connection;
pub mod dbutil;
pub mod dsn;
pub mod error;
pub mod schema;
pub mod statements;
pub mod timeout;
pub mod types;
pub mod validate;

#[cfg(test)]
mod test_support;

// Re-export secrecy types for consumers
pub use secrecy::{ExposeSecret, SecretString};

// Re-exports
pub use config::{ConnectionConfig, DbUtilConfig, PoolSettings};
pub use connection::{
    Connection, ConnectionProvider, PoolRegistry, SqlxConnection, setup_pool, warmup_pool,
};
pub use dbutil::{
    DbUtil, IDENTITY_COLUMN, create_table, drop_table, list_columns, list_databases, list_tables,
    optimize, truncate,
};
pub use dsn::{DSNInfo, detect_database_type, parse_dsn, validate_dsn};
pub use error::DatabaseError;
pub use schema::{Blueprint, MySqlGrammar, MySqlSchemaBuilder, SchemaBuilder};
pub use types::{ColumnSpec, ColumnType, DatabaseType, MaintenanceMessage, StatementOutcome};
pub use validate::{validate_identifier, validate_table_reference};
