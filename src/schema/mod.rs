//! Schema building: blueprints and the collaborator that commits them
//!
//! Callers accumulate a [`Blueprint`], then hand it to a [`SchemaBuilder`]
//! which turns it into DDL and runs it on a connection.

mod blueprint;
mod grammar;

pub use blueprint::Blueprint;
pub use grammar::MySqlGrammar;

use async_trait::async_trait;

use crate::connection::Connection;
use crate::error::DatabaseError;
use crate::types::StatementOutcome;

/// Commits blueprints as DDL
#[async_trait]
pub trait SchemaBuilder: Send + Sync {
    async fn execute(
        &self,
        connection: &dyn Connection,
        blueprint: &Blueprint,
    ) -> Result<StatementOutcome, DatabaseError>;
}

/// [`SchemaBuilder`] emitting MySQL DDL through [`MySqlGrammar`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlSchemaBuilder;

#[async_trait]
impl SchemaBuilder for MySqlSchemaBuilder {
    async fn execute(
        &self,
        connection: &dyn Connection,
        blueprint: &Blueprint,
    ) -> Result<StatementOutcome, DatabaseError> {
        let ddl = MySqlGrammar::compile(blueprint)?;
        log::info!(
            "[{}] {} table {} ({} columns)",
            connection.name(),
            if blueprint.is_creating() { "Creating" } else { "Altering" },
            blueprint.table(),
            blueprint.columns().len() + usize::from(blueprint.increments_column().is_some())
        );
        connection.execute(&ddl).await
    }
}
