//! Subscription service.
//!
//! Loads the owner's records, asks `yupay_core` for a decision and persists
//! the outcome. Sales are written with a compare-and-swap so two concurrent
//! requests can never both take the last unit of a monthly limit.

mod error;

pub use error::SubscriptionError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;

use yupay_core::{
    Action, Decision, Limit, PlanCatalog, PlanTier, QuotaSummary, Subscription,
    SubscriptionStatus, Usage, UserId, evaluate, quota_summary,
};

use crate::db::{RepositoryError, SubscriptionRepository, UsageRepository};

/// How many times a sale is re-evaluated after losing a race.
pub const MAX_SALE_ATTEMPTS: usize = 3;

/// Outcome of a recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleRecorded {
    pub sales_this_month: u32,
    pub status: SubscriptionStatus,
    /// Sales left this month after this one.
    pub remaining: Limit,
}

/// Subscription service.
pub struct SubscriptionService<'a> {
    subscriptions: SubscriptionRepository<'a>,
    usage: UsageRepository<'a>,
    catalog: &'a PlanCatalog,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, catalog: &'a PlanCatalog) -> Self {
        Self {
            subscriptions: SubscriptionRepository::new(pool),
            usage: UsageRepository::new(pool),
            catalog,
        }
    }

    /// Open a subscription on `plan` for an owner.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::AlreadySubscribed` if the owner has one.
    pub async fn subscribe(
        &self,
        owner_id: UserId,
        plan: PlanTier,
        now: DateTime<Utc>,
    ) -> Result<Subscription, SubscriptionError> {
        let subscription = Subscription::start(owner_id, plan, self.catalog.limits(plan), now);
        self.subscriptions
            .create(&subscription)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => SubscriptionError::AlreadySubscribed,
                other => SubscriptionError::Repository(other),
            })?;

        debug!(owner_id = %owner_id, plan = %plan, status = %subscription.status, "Opened subscription");
        Ok(subscription)
    }

    /// Summarize the owner's remaining quota.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::NotSubscribed` if the owner has no subscription.
    pub async fn quota(
        &self,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<QuotaSummary, SubscriptionError> {
        let subscription = self.load(owner_id).await?;
        let usage = self.usage.for_owner(owner_id).await?;
        Ok(quota_summary(&subscription, self.catalog, usage, now))
    }

    /// Decide whether the owner may perform `action`, without recording anything.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::NotSubscribed` if the owner has no subscription.
    pub async fn check(
        &self,
        owner_id: UserId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Decision, SubscriptionError> {
        let subscription = self.load(owner_id).await?;
        let usage = match action {
            Action::NewProduct | Action::NewStore => self.usage.for_owner(owner_id).await?,
            _ => Usage::default(),
        };

        let decision = evaluate(&subscription, self.catalog, usage, action, now);
        debug!(
            owner_id = %owner_id,
            ?action,
            allowed = decision.allowed,
            reason = ?decision.reason,
            "Evaluated action"
        );
        Ok(decision)
    }

    /// Count one sale against the owner's monthly limit.
    ///
    /// # Errors
    ///
    /// Returns `SubscriptionError::Denied` if the plan does not allow another
    /// sale, and `SubscriptionError::Contended` if the row kept changing for
    /// [`MAX_SALE_ATTEMPTS`] attempts.
    pub async fn record_sale(
        &self,
        owner_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<SaleRecorded, SubscriptionError> {
        for attempt in 1..=MAX_SALE_ATTEMPTS {
            let current = self.load(owner_id).await?;
            let limits = self.catalog.limits(current.plan);

            let decision = evaluate(&current, self.catalog, Usage::default(), Action::NewSale, now);
            debug!(
                owner_id = %owner_id,
                attempt,
                allowed = decision.allowed,
                reason = ?decision.reason,
                "Evaluated sale"
            );
            if !decision.allowed {
                return Err(SubscriptionError::Denied(decision));
            }

            let mut next = current.clone();
            let sales_this_month = next.record_sale(now, limits);

            if self.subscriptions.compare_and_swap(&current, &next).await? {
                return Ok(SaleRecorded {
                    sales_this_month,
                    status: next.status,
                    remaining: limits.max_sales_per_month.remaining(sales_this_month),
                });
            }
            debug!(owner_id = %owner_id, attempt, "Subscription changed concurrently, retrying");
        }

        Err(SubscriptionError::Contended {
            attempts: MAX_SALE_ATTEMPTS,
        })
    }

    async fn load(&self, owner_id: UserId) -> Result<Subscription, SubscriptionError> {
        self.subscriptions
            .get_by_user(owner_id)
            .await?
            .ok_or(SubscriptionError::NotSubscribed)
    }
}
