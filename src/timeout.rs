//! Statement timeout utilities

use crate::error::DatabaseError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Run one statement future, optionally under a client-side timeout
///
/// With `limit` of `None` the call waits for the driver however long the
/// statement runs. A timeout only abandons the wait; the server may still
/// finish the statement. Driver errors are wrapped as
/// [`DatabaseError::Statement`] with the SQL attached and otherwise passed
/// through unmodified. Nothing is retried.
///
/// # Example
///
/// ```rust
/// # use kodegen_tools_dbutil::timeout::execute_with_timeout;
/// # use std::time::Duration;
/// # #[tokio::main]
/// # async fn main() -> Result<(), kodegen_tools_dbutil::DatabaseError> {
/// let names = execute_with_timeout(
///     Some(Duration::from_secs(5)),
///     "SHOW TABLES",
///     async { Ok::<Vec<String>, sqlx::Error>(vec!["users".to_string()]) },
/// )
/// .await?;
/// assert_eq!(names, ["users"]);
/// # Ok(())
/// # }
/// ```
pub async fn execute_with_timeout<T, Fut>(
    limit: Option<Duration>,
    sql: &str,
    statement: Fut,
) -> Result<T, DatabaseError>
where
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let Some(limit) = limit else {
        return statement
            .await
            .map_err(|source| DatabaseError::statement(sql, source));
    };

    match timeout(limit, statement).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(source)) => Err(DatabaseError::statement(sql, source)),
        Err(_elapsed) => {
            log::warn!("Statement timed out after {:?}: {}", limit, sql);
            Err(DatabaseError::Timeout {
                sql: sql.to_string(),
                after: limit,
            })
        }
    }
}
