//! Counts of resources an owner holds against plan limits.

use sqlx::PgPool;

use yupay_core::{Usage, UserId};

use super::{RepositoryError, to_count};

#[derive(Debug, sqlx::FromRow)]
struct UsageRow {
    stores: i64,
    products: i64,
}

impl TryFrom<UsageRow> for Usage {
    type Error = RepositoryError;

    fn try_from(row: UsageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            products: to_count(row.products, "product count")?,
            stores: to_count(row.stores, "store count")?,
        })
    }
}

/// Repository for usage counts.
pub struct UsageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UsageRepository<'a> {
    /// Create a new usage repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count the stores and products an owner holds.
    ///
    /// Disabled stores still occupy a store slot until they are deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_owner(&self, owner_id: UserId) -> Result<Usage, RepositoryError> {
        let row = sqlx::query_as::<_, UsageRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM yupay.store WHERE owner_id = $1) AS stores,
                (SELECT COUNT(*)
                 FROM yupay.product p
                 JOIN yupay.store s ON s.id = p.store_id
                 WHERE s.owner_id = $1) AS products
            ",
        )
        .bind(owner_id)
        .fetch_one(self.pool)
        .await?;

        Usage::try_from(row)
    }
}
