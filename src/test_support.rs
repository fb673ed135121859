//! In-memory connection double for operation tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::connection::{Connection, ConnectionProvider};
use crate::error::DatabaseError;
use crate::statements::SHOW_TABLES;
use crate::types::StatementOutcome;

/// Records every statement and answers queries from canned results
///
/// `SHOW TABLES` answers from the table list; a `CREATE TABLE` adds the
/// created table to it so repeated creation sees the collision.
#[derive(Default)]
pub struct RecordingConnection {
    pub name: String,
    tables: Mutex<Vec<String>>,
    results: HashMap<String, Vec<String>>,
    rows: HashMap<String, Vec<Vec<String>>>,
    failures: HashMap<String, String>,
    affected: u64,
    log: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_tables(self, tables: &[&str]) -> Self {
        *lock(&self.tables) = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_result(mut self, sql: &str, rows: &[&str]) -> Self {
        self.results
            .insert(sql.to_string(), rows.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn with_rows(mut self, sql: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect();
        self.rows.insert(sql.to_string(), rows);
        self
    }

    /// Make `sql` fail as if the server rejected it
    pub fn with_failure(mut self, sql: &str, message: &str) -> Self {
        self.failures.insert(sql.to_string(), message.to_string());
        self
    }

    pub fn with_rows_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        lock(&self.log).clone()
    }

    fn record(&self, sql: &str) -> Result<(), DatabaseError> {
        lock(&self.log).push(sql.to_string());
        match self.failures.get(sql) {
            Some(message) => Err(DatabaseError::statement(
                sql,
                sqlx::Error::Protocol(message.clone()),
            )),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Connection for RecordingConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, sql: &str) -> Result<StatementOutcome, DatabaseError> {
        self.record(sql)?;
        if let Some(rest) = sql.strip_prefix("CREATE TABLE `")
            && let Some((table, _)) = rest.split_once('`')
        {
            lock(&self.tables).push(table.to_string());
        }
        Ok(StatementOutcome {
            rows_affected: self.affected,
        })
    }

    async fn fetch_first_column(&self, sql: &str) -> Result<Vec<String>, DatabaseError> {
        self.record(sql)?;
        if sql == SHOW_TABLES {
            return Ok(lock(&self.tables).clone());
        }
        Ok(self.results.get(sql).cloned().unwrap_or_default())
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Vec<String>>, DatabaseError> {
        self.record(sql)?;
        Ok(self.rows.get(sql).cloned().unwrap_or_default())
    }
}

/// Provider over a fixed set of named [`RecordingConnection`]s
pub struct StaticProvider {
    pub default: String,
    pub connections: HashMap<String, Arc<RecordingConnection>>,
}

impl StaticProvider {
    pub fn single(connection: RecordingConnection) -> (Self, Arc<RecordingConnection>) {
        let connection = Arc::new(connection);
        let provider = Self {
            default: connection.name.clone(),
            connections: HashMap::from([(connection.name.clone(), Arc::clone(&connection))]),
        };
        (provider, connection)
    }
}

#[async_trait]
impl ConnectionProvider for StaticProvider {
    async fn connection(&self, name: Option<&str>) -> Result<Arc<dyn Connection>, DatabaseError> {
        let name = name.unwrap_or(&self.default);
        match self.connections.get(name) {
            Some(connection) => {
                let connection: Arc<dyn Connection> = connection.clone();
                Ok(connection)
            }
            None => Err(DatabaseError::UnknownConnection(name.to_string())),
        }
    }
}
