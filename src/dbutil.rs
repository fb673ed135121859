//! Database administration helpers
//!
//! Each helper issues one fixed statement (see [`crate::statements`]) on the
//! connection it is given, then returns the driver's execution result, the
//! first column of the result set, or the `OPTIMIZE TABLE` message rows. [`DbUtil`] wraps the same helpers behind
//! a [`ConnectionProvider`] so callers can pass a connection name instead of
//! a handle.

use std::sync::Arc;

use crate::connection::{Connection, ConnectionProvider};
use crate::error::DatabaseError;
use crate::schema::{Blueprint, SchemaBuilder};
use crate::statements::{
    SHOW_DATABASES, SHOW_TABLES, TABLE_NAME_CASE_FOLDING, drop_table_statement,
    optimize_statement, show_columns_statement, truncate_statement,
};
use crate::types::{ColumnSpec, MaintenanceMessage, StatementOutcome};
use crate::validate::validate_identifier;

/// Name of the identity column added by [`create_table`]
pub const IDENTITY_COLUMN: &str = "id";

/// Empty a table with `TRUNCATE`
pub async fn truncate(
    connection: &dyn Connection,
    table: &str,
) -> Result<StatementOutcome, DatabaseError> {
    connection.execute(&truncate_statement(table)?).await
}

/// Defragment a table with `OPTIMIZE TABLE`
///
/// Returns the server's message rows. A row with `Msg_type` `Error` (such as
/// a missing table) fails the call with [`DatabaseError::Statement`] carrying
/// that row's text.
pub async fn optimize(
    connection: &dyn Connection,
    table: &str,
) -> Result<Vec<MaintenanceMessage>, DatabaseError> {
    let sql = optimize_statement(table)?;
    let messages: Vec<MaintenanceMessage> = connection
        .fetch_rows(&sql)
        .await?
        .into_iter()
        .map(MaintenanceMessage::from_row)
        .collect();

    if let Some(failed) = messages.iter().find(|message| message.is_error()) {
        return Err(DatabaseError::rejected(sql, failed.msg_text.clone()));
    }

    Ok(messages)
}

/// Remove a table with `DROP TABLE`
pub async fn drop_table(
    connection: &dyn Connection,
    table: &str,
) -> Result<StatementOutcome, DatabaseError> {
    connection.execute(&drop_table_statement(table)?).await
}

/// Column names of `table`, in the order the server reports them
pub async fn list_columns(
    connection: &dyn Connection,
    table: &str,
) -> Result<Vec<String>, DatabaseError> {
    connection
        .fetch_first_column(&show_columns_statement(table)?)
        .await
}

/// Tables of the connection's current database
pub async fn list_tables(connection: &dyn Connection) -> Result<Vec<String>, DatabaseError> {
    connection.fetch_first_column(SHOW_TABLES).await
}

/// Databases visible to the connection's user
pub async fn list_databases(connection: &dyn Connection) -> Result<Vec<String>, DatabaseError> {
    connection.fetch_first_column(SHOW_DATABASES).await
}

/// Create `table` with an `id` identity column plus one column per spec
///
/// Fails with [`DatabaseError::DuplicateTable`] without emitting any DDL when
/// `SHOW TABLES` already lists the name. The comparison ignores case only if
/// the server folds table names (`lower_case_table_names` other than `0`).
/// Columns keep the order of `columns`. `table` must be unqualified since the
/// check only sees the current database.
pub async fn create_table(
    connection: &dyn Connection,
    schema: &dyn SchemaBuilder,
    table: &str,
    columns: &[ColumnSpec],
) -> Result<StatementOutcome, DatabaseError> {
    validate_identifier(table)?;

    let existing = list_tables(connection).await?;
    if existing.iter().any(|name| name == table)
        || (existing.iter().any(|name| name.eq_ignore_ascii_case(table))
            && folds_table_names(connection).await?)
    {
        log::warn!(
            "[{}] Table {} already exists, not creating it",
            connection.name(),
            table
        );
        return Err(DatabaseError::DuplicateTable(table.to_string()));
    }

    let mut blueprint = Blueprint::new(table);
    blueprint.create().increments(IDENTITY_COLUMN);
    for spec in columns {
        blueprint.column(spec.clone());
    }

    schema.execute(connection, &blueprint).await
}

async fn folds_table_names(connection: &dyn Connection) -> Result<bool, DatabaseError> {
    let setting = connection.fetch_first_column(TABLE_NAME_CASE_FOLDING).await?;
    Ok(setting.first().is_some_and(|value| value.trim() != "0"))
}

/// Stateless helper service resolving connection names through a provider
///
/// Every method takes an optional connection name; `None` uses the
/// provider's default.
///
/// ```rust,no_run
/// use kodegen_tools_dbutil::{DbUtil, DbUtilConfig, MySqlSchemaBuilder, PoolRegistry};
///
/// # async fn example() -> anyhow::Result<()> {
/// let util = DbUtil::new(
///     PoolRegistry::new(DbUtilConfig::from_env()?),
///     MySqlSchemaBuilder,
/// );
/// for table in util.list_tables(None).await? {
///     println!("{table}: {:?}", util.list_columns(&table, None).await?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DbUtil<P, S> {
    provider: P,
    schema: S,
}

impl<P, S> DbUtil<P, S>
where
    P: ConnectionProvider,
    S: SchemaBuilder,
{
    pub fn new(provider: P, schema: S) -> Self {
        Self { provider, schema }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn resolve(&self, connection: Option<&str>) -> Result<Arc<dyn Connection>, DatabaseError> {
        self.provider.connection(connection).await
    }

    pub async fn truncate(
        &self,
        table: &str,
        connection: Option<&str>,
    ) -> Result<StatementOutcome, DatabaseError> {
        truncate(self.resolve(connection).await?.as_ref(), table).await
    }

    pub async fn optimize(
        &self,
        table: &str,
        connection: Option<&str>,
    ) -> Result<Vec<MaintenanceMessage>, DatabaseError> {
        optimize(self.resolve(connection).await?.as_ref(), table).await
    }

    pub async fn drop_table(
        &self,
        table: &str,
        connection: Option<&str>,
    ) -> Result<StatementOutcome, DatabaseError> {
        drop_table(self.resolve(connection).await?.as_ref(), table).await
    }

    pub async fn list_columns(
        &self,
        table: &str,
        connection: Option<&str>,
    ) -> Result<Vec<String>, DatabaseError> {
        list_columns(self.resolve(connection).await?.as_ref(), table).await
    }

    pub async fn list_tables(&self, connection: Option<&str>) -> Result<Vec<String>, DatabaseError> {
        list_tables(self.resolve(connection).await?.as_ref()).await
    }

    pub async fn list_databases(
        &self,
        connection: Option<&str>,
    ) -> Result<Vec<String>, DatabaseError> {
        list_databases(self.resolve(connection).await?.as_ref()).await
    }

    pub async fn create_table(
        &self,
        table: &str,
        columns: &[ColumnSpec],
        connection: Option<&str>,
    ) -> Result<StatementOutcome, DatabaseError> {
        let handle = self.resolve(connection).await?;
        create_table(handle.as_ref(), &self.schema, table, columns).await
    }
}
