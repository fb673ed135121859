//! Table blueprints accumulated before being committed as DDL

use crate::types::{ColumnSpec, ColumnType};

/// Accumulated definition of one table
///
/// A blueprint only records intent. Nothing reaches the server until a
/// [`super::SchemaBuilder`] executes it.
///
/// ```rust
/// use kodegen_tools_dbutil::schema::Blueprint;
///
/// let mut table = Blueprint::new("users");
/// table.create();
/// table.increments("id");
/// table.string("email", 255);
/// table.boolean("active");
/// assert_eq!(table.columns().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    table: String,
    creating: bool,
    increments: Option<String>,
    columns: Vec<ColumnSpec>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            creating: false,
            increments: None,
            columns: Vec::new(),
        }
    }

    /// Mark the blueprint as creating the table rather than altering it
    pub fn create(&mut self) -> &mut Self {
        self.creating = true;
        self
    }

    /// Add an auto-incrementing primary key
    pub fn increments(&mut self, name: impl Into<String>) -> &mut Self {
        self.increments = Some(name.into());
        self
    }

    pub fn column(&mut self, spec: ColumnSpec) -> &mut Self {
        self.columns.push(spec);
        self
    }

    pub fn string(&mut self, name: impl Into<String>, length: u32) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::String, Some(length)))
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Integer, None))
    }

    pub fn float(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Float, None))
    }

    pub fn decimal(&mut self, name: impl Into<String>, precision: u32, scale: u32) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Decimal, Some(precision)).with_scale(scale))
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Boolean, None))
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Text, None))
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Date, None))
    }

    pub fn timestamp(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Timestamp, None))
    }

    pub fn blob(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(ColumnSpec::new(name, ColumnType::Blob, None))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn increments_column(&self) -> Option<&str> {
        self.increments.as_deref()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}
