//! Administrative statement text
//!
//! Pure functions producing the SQL sent by the helpers in [`crate::dbutil`].
//! They never touch a connection. Table names are validated, not quoted, so
//! the text matches what an operator would type at the `mysql>` prompt.

use crate::error::DatabaseError;
use crate::validate::validate_table_reference;

/// Lists every table of the connection's current database
pub const SHOW_TABLES: &str = "SHOW TABLES";

/// Lists every database visible to the connection's user
pub const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Reads `lower_case_table_names` as text; anything but `0` folds table names
pub const TABLE_NAME_CASE_FOLDING: &str = "SELECT CAST(@@lower_case_table_names AS CHAR)";

/// `TRUNCATE <table>`
///
/// ```rust
/// use kodegen_tools_dbutil::statements::truncate_statement;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// assert_eq!(truncate_statement("sessions")?, "TRUNCATE sessions");
/// # assert!(truncate_statement("sessions; DROP TABLE users").is_err());
/// # Ok(())
/// # }
/// ```
pub fn truncate_statement(table: &str) -> Result<String, DatabaseError> {
    validate_table_reference(table)?;
    Ok(format!("TRUNCATE {}", table))
}

/// `OPTIMIZE TABLE <table>`
pub fn optimize_statement(table: &str) -> Result<String, DatabaseError> {
    validate_table_reference(table)?;
    Ok(format!("OPTIMIZE TABLE {}", table))
}

/// `SHOW COLUMNS FROM <table>`
pub fn show_columns_statement(table: &str) -> Result<String, DatabaseError> {
    validate_table_reference(table)?;
    Ok(format!("SHOW COLUMNS FROM {}", table))
}

/// `DROP TABLE <table>`
pub fn drop_table_statement(table: &str) -> Result<String, DatabaseError> {
    validate_table_reference(table)?;
    Ok(format!("DROP TABLE {}", table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fixed_surface() {
        assert_eq!(optimize_statement("logs").ok().as_deref(), Some("OPTIMIZE TABLE logs"));
        assert_eq!(
            show_columns_statement("shop.users").ok().as_deref(),
            Some("SHOW COLUMNS FROM shop.users")
        );
        assert_eq!(drop_table_statement("tmp_1").ok().as_deref(), Some("DROP TABLE tmp_1"));
    }

    #[test]
    fn refuses_unsafe_names() {
        assert!(matches!(
            optimize_statement("logs WHERE 1=1"),
            Err(DatabaseError::InvalidIdentifier(_))
        ));
        assert!(show_columns_statement("").is_err());
        assert!(drop_table_statement("users,accounts").is_err());
    }
}
