//! Transaction boundaries.
//!
//! Work runs against the [`DatabaseTransaction`] returned by [`begin`] and
//! its result is handed to [`finish`], which commits or rolls back.
//! Dropping an unfinished transaction (for example while unwinding a panic)
//! rolls it back.
//!
//! Calling [`begin`] on an open transaction creates a savepoint. A failed
//! statement inside a savepoint can be rolled back without aborting the
//! enclosing transaction.

use blog_common::{AppError, AppResult};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use tracing::{error, warn};

/// Open a transaction on the pool, or a savepoint inside a transaction.
pub async fn begin<C: TransactionTrait>(conn: &C) -> AppResult<DatabaseTransaction> {
    conn.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Commit on `Ok`, roll back on `Err`.
///
/// Returns the work's result, or the commit error when the commit fails.
pub async fn finish<T>(txn: DatabaseTransaction, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "Transaction rollback failed");
            }
            warn!(error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
