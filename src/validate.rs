//! Identifier validation for SQL injection prevention

use crate::error::DatabaseError;
use lazy_regex::regex_is_match;

/// Longest identifier MySQL accepts for tables, columns and databases
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Keywords rejected as bare identifiers
const RESERVED: &[&str] = &[
    "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TABLE", "INDEX", "VIEW",
    "TRIGGER", "DATABASE", "SCHEMA", "TRUNCATE", "OPTIMIZE", "SHOW", "FROM", "WHERE", "ORDER",
    "GROUP", "GRANT", "REVOKE", "BEGIN", "COMMIT", "ROLLBACK", "ANALYZE",
];

/// Validate an identifier for safe interpolation into statement text
///
/// Administrative statements like `TRUNCATE` and `SHOW COLUMNS FROM` take
/// identifiers, which cannot be bound as parameters, so every name is checked
/// against an allow-list before it reaches SQL text.
///
/// ## Validation Rules
///
/// - **Length**: 1-64 characters
/// - **Characters**: `[a-zA-Z0-9_$]`
/// - **Start character**: must not be a digit
/// - **Keywords**: cannot be a reserved keyword (SELECT, DROP, ...)
///
/// ## Example
///
/// ```rust
/// use kodegen_tools_dbutil::validate::validate_identifier;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// validate_identifier("users")?;
/// validate_identifier("order_items")?;
///
/// # assert!(validate_identifier("users; DROP TABLE users").is_err());
/// # assert!(validate_identifier("users`").is_err());
/// # assert!(validate_identifier("1users").is_err());
/// # assert!(validate_identifier("select").is_err());
/// # Ok(())
/// # }
/// ```
pub fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    if name.is_empty() {
        return Err(DatabaseError::InvalidIdentifier(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(DatabaseError::InvalidIdentifier(format!(
            "Identifier too long: {} characters (max {})",
            name.len(),
            MAX_IDENTIFIER_LEN
        )));
    }

    if !regex_is_match!(r"^[A-Za-z0-9_$]+$", name) {
        return Err(DatabaseError::InvalidIdentifier(format!(
            "'{}'. Only alphanumeric, underscore and dollar allowed",
            name
        )));
    }

    if let Some(first_char) = name.chars().next()
        && first_char.is_ascii_digit()
    {
        return Err(DatabaseError::InvalidIdentifier(format!(
            "Identifier cannot start with digit: '{}'",
            name
        )));
    }

    if RESERVED.contains(&name.to_ascii_uppercase().as_str()) {
        return Err(DatabaseError::InvalidIdentifier(format!(
            "Identifier cannot be SQL keyword: '{}'",
            name
        )));
    }

    Ok(())
}

/// Validate a table reference, either `table` or `database.table`
pub fn validate_table_reference(reference: &str) -> Result<(), DatabaseError> {
    match reference.split_once('.') {
        Some((database, table)) => {
            validate_identifier(database)?;
            validate_identifier(table)
        }
        None => validate_identifier(reference),
    }
}
