//! Database operations for the Yupay `PostgreSQL` database.
//!
//! # Schema: `yupay`
//!
//! ## Tables
//!
//! - `store` - Storefronts, optionally geotagged
//! - `subscription` - One plan subscription per owner, with the monthly sales counter
//! - `product` - Products listed in a store
//!
//! Rows are read into private `*Row` structs and converted into `yupay_core`
//! types with `TryFrom`, so malformed data surfaces as
//! [`RepositoryError::DataCorruption`] instead of leaking into the domain.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p yupay-cli -- migrate
//! ```

pub mod stores;
pub mod subscriptions;
pub mod usage;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

pub use stores::StoreRepository;
pub use subscriptions::SubscriptionRepository;
pub use usage::UsageRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., a second subscription for one owner).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A failed load shared by every request waiting on the same cache entry.
    #[error(transparent)]
    Shared(Arc<RepositoryError>),
}

/// Session `search_path` for every pooled connection.
///
/// The `yupay` schema must stay off the search path: Postgres reports enum
/// columns from a schema on the path unqualified (`plan_tier`), which no
/// longer matches the `yupay.plan_tier` name the decoders expect. The default
/// path (`"$user", public`) puts it there whenever the role is named `yupay`.
pub const SEARCH_PATH: &str = "public";

/// Parse `database_url` into connect options with [`SEARCH_PATH`] pinned.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if the URL cannot be parsed.
pub fn connect_options(
    database_url: &secrecy::SecretString,
) -> Result<PgConnectOptions, sqlx::Error> {
    Ok(PgConnectOptions::from_str(database_url.expose_secret())?
        .options([("search_path", SEARCH_PATH)]))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(database_url)?)
        .await
}

/// Narrow a non-negative database integer into a domain counter.
pub(crate) fn to_count(value: i64, what: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("invalid {what} in database: {value}")))
}
