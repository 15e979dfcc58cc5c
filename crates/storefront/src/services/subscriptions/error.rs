//! Subscription service error types.

use thiserror::Error;
use yupay_core::Decision;

use crate::db::RepositoryError;

/// Errors that can occur during subscription operations.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The owner has no subscription.
    #[error("owner has no subscription")]
    NotSubscribed,

    /// The owner already has a subscription.
    #[error("owner already has a subscription")]
    AlreadySubscribed,

    /// The plan does not allow the action.
    #[error("action denied by plan")]
    Denied(Decision),

    /// The subscription kept changing between read and write.
    #[error("subscription changed concurrently {attempts} times")]
    Contended { attempts: usize },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
