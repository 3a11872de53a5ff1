//! SERIALIZABLE transaction runner with a retry budget.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use tracing::warn;

use clouddrive_core::error::{AppError, ErrorKind};
use clouddrive_core::result::AppResult;

/// Failure inside a transaction body.
///
/// Business errors roll back and surface unchanged; SQL errors may be
/// retried.
#[derive(Debug)]
pub(crate) enum TxError {
    Sql(sqlx::Error),
    App(AppError),
}

impl From<sqlx::Error> for TxError {
    fn from(err: sqlx::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<AppError> for TxError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

/// Run `body` in a SERIALIZABLE transaction, retrying serialization
/// failures and deadlocks up to `max_retries` times. Exhausting the budget or
/// any other SQL failure yields `ResolutionFailed`.
pub(crate) async fn run_serializable<T, F>(
    pool: &PgPool,
    max_retries: u32,
    operation: &'static str,
    mut body: F,
) -> AppResult<T>
where
    T: Send,
    F: for<'c> FnMut(&'c mut PgConnection) -> BoxFuture<'c, Result<T, TxError>> + Send,
{
    let mut attempt: u32 = 0;
    loop {
        match attempt_once(pool, &mut body).await {
            Ok(value) => return Ok(value),
            Err(TxError::App(err)) => return Err(err),
            Err(TxError::Sql(err)) if is_retryable(&err) && attempt < max_retries => {
                attempt += 1;
                warn!(operation, attempt, error = %err, "Transaction conflict, retrying");
                tokio::time::sleep(Duration::from_millis(10 * (1 << attempt.min(6)))).await;
            }
            Err(TxError::Sql(err)) => {
                return Err(AppError::with_source(
                    ErrorKind::ResolutionFailed,
                    format!("Failed to {operation}"),
                    err,
                ));
            }
        }
    }
}

async fn attempt_once<T, F>(pool: &PgPool, body: &mut F) -> Result<T, TxError>
where
    F: for<'c> FnMut(&'c mut PgConnection) -> BoxFuture<'c, Result<T, TxError>>,
{
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    // Dropping `tx` on the error path rolls it back.
    let value = body(&mut *tx).await?;
    tx.commit().await?;
    Ok(value)
}

/// `40001` serialization_failure and `40P01` deadlock_detected.
fn is_retryable(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "40001" || code == "40P01")
}
