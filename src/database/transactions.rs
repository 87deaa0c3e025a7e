// ABOUTME: RAII transaction guard and lock-contention retry for SQLite ledger writes
// ABOUTME: Uncommitted guards roll back on drop, locked databases are retried with backoff
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction helpers
//!
//! Every ledger mutation runs inside one [`TransactionGuard`]. A business-rule
//! failure returns early with `?`, the guard is dropped and `SQLx` rolls the
//! transaction back, so the account row is untouched.
//!
//! ```text
//! let mut guard = TransactionGuard::new(pool.begin().await?);
//! sqlx::query("UPDATE accounts ...").execute(guard.executor()?).await?;
//! sqlx::query("INSERT INTO daily_completions ...").execute(guard.executor()?).await?;
//! guard.commit().await?;
//! ```

use std::future::Future;
use std::time::Duration;

use sqlx::{Database, Transaction};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult, ErrorCode};

/// Retry a transactional operation while `SQLite` reports lock contention
///
/// Only [`ErrorCode::StorageUnavailable`] errors whose detail names a locked or
/// busy database are retried. Ledger rule failures surface on the first attempt.
///
/// Backoff doubles from 20ms: 20ms, 40ms, 80ms, ...
///
/// # Errors
/// Returns the last error once `max_retries` attempts are exhausted, or the
/// first non-retryable error.
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_retries: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_retries = max_retries.max(1);
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if !is_retryable(&e) {
                    return Err(e);
                }
                if attempts >= max_retries {
                    error!(
                        attempts = attempts,
                        max_retries = max_retries,
                        error = %e,
                        "Transaction failed after max retries"
                    );
                    return Err(e);
                }
                let backoff_ms = 10 * (1_u64 << attempts.min(10));
                warn!(
                    attempt = attempts,
                    max_retries = max_retries,
                    backoff_ms = backoff_ms,
                    "Database locked, retrying transaction after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// Lock contention is the only transient failure `SQLite` produces for us
fn is_retryable(error: &AppError) -> bool {
    if error.code != ErrorCode::StorageUnavailable {
        return false;
    }
    let detail = error.message.to_lowercase();
    if detail.contains("constraint") {
        return false;
    }
    detail.contains("database is locked")
        || detail.contains("database table is locked")
        || detail.contains("busy")
}

/// RAII guard for database transactions ensuring automatic rollback on drop
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
    committed: bool,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Wrap a transaction obtained from `pool.begin().await`
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        Self {
            transaction: Some(transaction),
            committed: false,
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    /// Returns an error if the commit fails or the guard was already consumed
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot commit"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::storage(format!("Transaction commit failed: {e}")))?;
        self.committed = true;
        debug!("Transaction committed");
        Ok(())
    }

    /// Explicitly roll back the transaction and consume the guard
    ///
    /// # Errors
    /// Returns an error if the rollback fails or the guard was already consumed
    pub async fn rollback(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot rollback"))?;
        tx.rollback()
            .await
            .map_err(|e| AppError::storage(format!("Transaction rollback failed: {e}")))?;
        debug!("Transaction rolled back explicitly");
        Ok(())
    }

    /// Connection to run statements against inside the transaction
    ///
    /// # Errors
    /// Returns an error if the guard was used after commit or rollback
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() && !self.committed {
            debug!("TransactionGuard dropped without commit - rolling back");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_locked_database_is_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_transaction(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::storage("Database operation failed: database is locked"))
                } else {
                    Ok(7)
                }
            },
            3,
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rule_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_transaction(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::already_completed())
            },
            5,
        )
        .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::AlreadyCompleted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
