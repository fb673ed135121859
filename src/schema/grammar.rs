//! MySQL DDL generation for blueprints

use std::collections::HashSet;

use super::Blueprint;
use crate::error::DatabaseError;
use crate::types::{ColumnSpec, ColumnType};
use crate::validate::{validate_identifier, validate_table_reference};

const DEFAULT_STRING_LENGTH: u32 = 200;
const DEFAULT_DECIMAL_PRECISION: u32 = 8;
const DEFAULT_DECIMAL_SCALE: u32 = 2;

/// Compiles blueprints to MySQL DDL
pub struct MySqlGrammar;

impl MySqlGrammar {
    /// Compile a blueprint to a single DDL statement
    ///
    /// ```rust
    /// use kodegen_tools_dbutil::schema::{Blueprint, MySqlGrammar};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut table = Blueprint::new("users");
    /// table.create().increments("id").string("name", 255);
    ///
    /// assert_eq!(
    ///     MySqlGrammar::compile(&table)?,
    ///     "CREATE TABLE `users` (`id` INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
    ///      `name` VARCHAR(255) NOT NULL)"
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn compile(blueprint: &Blueprint) -> Result<String, DatabaseError> {
        validate_table_reference(blueprint.table())?;
        let definitions = Self::column_definitions(blueprint)?;
        let table = wrap_table(blueprint.table());

        if blueprint.is_creating() {
            return Ok(format!("CREATE TABLE {} ({})", table, definitions.join(", ")));
        }

        if definitions.is_empty() {
            return Err(DatabaseError::Configuration(format!(
                "Blueprint for {} adds no columns",
                blueprint.table()
            )));
        }

        let additions: Vec<String> = definitions
            .iter()
            .map(|definition| format!("ADD {}", definition))
            .collect();
        Ok(format!("ALTER TABLE {} {}", table, additions.join(", ")))
    }

    fn column_definitions(blueprint: &Blueprint) -> Result<Vec<String>, DatabaseError> {
        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(blueprint.columns().len() + 1);

        if let Some(identity) = blueprint.increments_column() {
            validate_identifier(identity)?;
            seen.insert(identity.to_ascii_lowercase());
            definitions.push(format!(
                "{} INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY",
                wrap(identity)
            ));
        }

        for spec in blueprint.columns() {
            validate_identifier(&spec.name)?;
            // MySQL column names are case-insensitive
            if !seen.insert(spec.name.to_ascii_lowercase()) {
                return Err(DatabaseError::DuplicateColumn(spec.name.clone()));
            }
            definitions.push(format!("{} {} NOT NULL", wrap(&spec.name), column_type(spec)));
        }

        Ok(definitions)
    }
}

fn column_type(spec: &ColumnSpec) -> String {
    match spec.column_type {
        ColumnType::String => {
            format!("VARCHAR({})", spec.length.unwrap_or(DEFAULT_STRING_LENGTH))
        }
        ColumnType::Integer => "INT".to_string(),
        ColumnType::Float => "FLOAT".to_string(),
        ColumnType::Decimal => format!(
            "DECIMAL({}, {})",
            spec.length.unwrap_or(DEFAULT_DECIMAL_PRECISION),
            spec.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
        ),
        ColumnType::Boolean => "TINYINT(1)".to_string(),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::Date => "DATETIME".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
        ColumnType::Blob => "BLOB".to_string(),
    }
}

fn wrap(identifier: &str) -> String {
    format!("`{}`", identifier)
}

fn wrap_table(reference: &str) -> String {
    reference.split('.').map(wrap).collect::<Vec<_>>().join(".")
}
