//! Store-level error type.

use domain::services::LendingError;
use thiserror::Error;

/// Failure of a store operation: either the engine refused the transition or
/// the database failed. Either way the transaction was rolled back.
#[derive(Debug, Error)]
pub enum LendingStoreError {
    #[error(transparent)]
    Domain(#[from] LendingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LendingStoreError {
    /// Maps a unique violation to a domain error, passing other failures through.
    pub(crate) fn on_unique_violation(error: sqlx::Error, domain: LendingError) -> Self {
        match &error {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                LendingStoreError::Domain(domain)
            }
            _ => LendingStoreError::Database(error),
        }
    }
}
