//! Subscription repository.
//!
//! The monthly counter is only ever written with [`SubscriptionRepository::compare_and_swap`],
//! which refuses to overwrite a row that changed since it was read.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use yupay_core::{PlanTier, Subscription, SubscriptionId, SubscriptionStatus, UserId};

use super::{RepositoryError, to_count};

/// Internal row type for subscription queries.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: SubscriptionId,
    user_id: UserId,
    plan: PlanTier,
    status: SubscriptionStatus,
    sales_this_month: i64,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    trial_end_date: Option<DateTime<Utc>>,
    last_reset_date: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            plan: row.plan,
            status: row.status,
            sales_this_month: to_count(row.sales_this_month, "sales_this_month")?,
            start_date: row.start_date,
            end_date: row.end_date,
            trial_end_date: row.trial_end_date,
            last_reset_date: row.last_reset_date,
        })
    }
}

/// Repository for subscription database operations.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the subscription owned by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including an
    /// enum label the schema does not know.
    /// Returns `RepositoryError::DataCorruption` if the counter is negative.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT id, user_id, plan, status, sales_this_month,
                   start_date, end_date, trial_end_date, last_reset_date
            FROM yupay.subscription
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    /// Create a subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has one.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, subscription: &Subscription) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO yupay.subscription
                (id, user_id, plan, status, sales_this_month,
                 start_date, end_date, trial_end_date, last_reset_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(subscription.plan)
        .bind(subscription.status)
        .bind(i64::from(subscription.sales_this_month))
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.trial_end_date)
        .bind(subscription.last_reset_date)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("user already has a subscription".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Write `next` over `previous` if the stored counter still matches `previous`.
    ///
    /// Only the counter, its reset date and the status are written. Returns
    /// `false` when another writer got there first; the caller should reload.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn compare_and_swap(
        &self,
        previous: &Subscription,
        next: &Subscription,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE yupay.subscription
            SET sales_this_month = $3,
                last_reset_date = $4,
                status = $5,
                updated_at = NOW()
            WHERE id = $1
              AND sales_this_month = $2
              AND last_reset_date = $6
              AND status = $7
            ",
        )
        .bind(previous.id)
        .bind(i64::from(previous.sales_this_month))
        .bind(i64::from(next.sales_this_month))
        .bind(next.last_reset_date)
        .bind(next.status)
        .bind(previous.last_reset_date)
        .bind(previous.status)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
