//! Store-owner subscriptions and the monthly sales counter.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::PlanLimits;
use crate::types::{PlanTier, SubscriptionId, SubscriptionStatus, UserId};

/// A store owner's subscription to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: PlanTier,
    pub status: SubscriptionStatus,
    /// Sales recorded since `last_reset_date`'s calendar month began.
    pub sales_this_month: u32,
    pub start_date: DateTime<Utc>,
    /// End of the paid period, if the plan is billed by period.
    pub end_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    /// Last time the monthly counter was zeroed. Only moves forward.
    pub last_reset_date: DateTime<Utc>,
}

impl Subscription {
    /// Open a subscription for a newly registered owner.
    ///
    /// Tiers with `trial_days > 0` start in `trial`; the rest start `activa`.
    #[must_use]
    pub fn start(user_id: UserId, plan: PlanTier, limits: &PlanLimits, now: DateTime<Utc>) -> Self {
        let (status, trial_end_date) = if limits.trial_days > 0 {
            (
                SubscriptionStatus::Trial,
                Some(now + Duration::days(i64::from(limits.trial_days))),
            )
        } else {
            (SubscriptionStatus::Active, None)
        };

        Self {
            id: SubscriptionId::generate(),
            user_id,
            plan,
            status,
            sales_this_month: 0,
            start_date: now,
            end_date: None,
            trial_end_date,
            last_reset_date: now,
        }
    }

    /// Whether `now` falls in a later calendar month than `last_reset_date`.
    ///
    /// A clock that reads earlier than the last reset never triggers a reset.
    #[must_use]
    pub fn is_new_month(&self, now: DateTime<Utc>) -> bool {
        month_key(now) > month_key(self.last_reset_date)
    }

    /// Sales counted against this month's limit as of `now`.
    #[must_use]
    pub fn sales_used_at(&self, now: DateTime<Utc>) -> u32 {
        if self.is_new_month(now) {
            0
        } else {
            self.sales_this_month
        }
    }

    /// The status as it should be evaluated at `now`.
    ///
    /// A trial past `trial_end_date` or an active period past `end_date` is
    /// `vencida`. A `limite_alcanzado` from a previous month is `activa` again.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Trial if self.trial_end_date.is_some_and(|end| end < now) => {
                SubscriptionStatus::Expired
            }
            SubscriptionStatus::Active | SubscriptionStatus::LimitReached
                if self.end_date.is_some_and(|end| end < now) =>
            {
                SubscriptionStatus::Expired
            }
            SubscriptionStatus::LimitReached if self.is_new_month(now) => {
                SubscriptionStatus::Active
            }
            status => status,
        }
    }

    /// Zero the monthly counter if `now` is in a new month.
    ///
    /// Advances `last_reset_date` to `now` and lifts `limite_alcanzado`.
    /// Returns `true` when a reset happened and the record must be persisted.
    pub fn reset_if_new_month(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_new_month(now) {
            return false;
        }
        self.sales_this_month = 0;
        self.last_reset_date = now;
        if self.status == SubscriptionStatus::LimitReached {
            self.status = SubscriptionStatus::Active;
        }
        true
    }

    /// Count one sale, applying the monthly reset first.
    ///
    /// An `activa` subscription whose counter reaches a finite monthly limit
    /// moves to `limite_alcanzado`. Returns the new counter value.
    ///
    /// This does not check whether the sale is permitted; run
    /// [`evaluate`](crate::entitlement::evaluate) first.
    pub fn record_sale(&mut self, now: DateTime<Utc>, limits: &PlanLimits) -> u32 {
        self.reset_if_new_month(now);
        self.sales_this_month = self.sales_this_month.saturating_add(1);
        if self.status == SubscriptionStatus::Active
            && limits.max_sales_per_month.is_reached(self.sales_this_month)
        {
            self.status = SubscriptionStatus::LimitReached;
        }
        self.sales_this_month
    }
}

fn month_key(at: DateTime<Utc>) -> (i32, u32) {
    (at.year(), at.month())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::plan::PlanCatalog;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn subscription(plan: PlanTier, sales: u32, last_reset: DateTime<Utc>) -> Subscription {
        Subscription {
            id: SubscriptionId::generate(),
            user_id: UserId::generate(),
            plan,
            status: SubscriptionStatus::Active,
            sales_this_month: sales,
            start_date: at(2026, 1, 1),
            end_date: None,
            trial_end_date: None,
            last_reset_date: last_reset,
        }
    }

    #[test]
    fn test_start_paid_tier_begins_trial() {
        let catalog = PlanCatalog::default();
        let now = at(2026, 3, 10);
        let sub = Subscription::start(
            UserId::generate(),
            PlanTier::Basico,
            catalog.limits(PlanTier::Basico),
            now,
        );
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert_eq!(sub.trial_end_date, Some(at(2026, 3, 24)));
        assert_eq!(sub.last_reset_date, now);
    }

    #[test]
    fn test_start_free_tier_is_active() {
        let catalog = PlanCatalog::default();
        let sub = Subscription::start(
            UserId::generate(),
            PlanTier::Free,
            catalog.limits(PlanTier::Free),
            at(2026, 3, 10),
        );
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.trial_end_date.is_none());
    }

    #[test]
    fn test_rollover_zeroes_counter() {
        let mut sub = subscription(PlanTier::Basico, 57, at(2026, 4, 30));
        let now = at(2026, 5, 1);

        assert_eq!(sub.sales_used_at(now), 0);
        assert!(sub.reset_if_new_month(now));
        assert_eq!(sub.sales_this_month, 0);
        assert_eq!(sub.last_reset_date, now);
    }

    #[test]
    fn test_same_month_keeps_counter() {
        let mut sub = subscription(PlanTier::Basico, 57, at(2026, 4, 1));
        assert!(!sub.reset_if_new_month(at(2026, 4, 30)));
        assert_eq!(sub.sales_this_month, 57);
    }

    #[test]
    fn test_same_month_number_in_next_year_resets() {
        let sub = subscription(PlanTier::Basico, 3, at(2025, 4, 15));
        assert!(sub.is_new_month(at(2026, 4, 15)));
    }

    #[test]
    fn test_clock_going_backwards_does_not_reset() {
        let mut sub = subscription(PlanTier::Basico, 9, at(2026, 6, 2));
        assert!(!sub.reset_if_new_month(at(2026, 5, 31)));
        assert_eq!(sub.sales_this_month, 9);
    }

    #[test]
    fn test_reset_lifts_limit_reached() {
        let mut sub = subscription(PlanTier::Free, 20, at(2026, 1, 20));
        sub.status = SubscriptionStatus::LimitReached;

        assert_eq!(
            sub.effective_status(at(2026, 2, 1)),
            SubscriptionStatus::Active
        );
        sub.reset_if_new_month(at(2026, 2, 1));
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_expired_trial() {
        let mut sub = subscription(PlanTier::Profesional, 0, at(2026, 1, 1));
        sub.status = SubscriptionStatus::Trial;
        sub.trial_end_date = Some(at(2026, 1, 15));

        assert_eq!(
            sub.effective_status(at(2026, 1, 14)),
            SubscriptionStatus::Trial
        );
        assert_eq!(
            sub.effective_status(at(2026, 1, 16)),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn test_active_past_end_date_is_expired() {
        let mut sub = subscription(PlanTier::Basico, 0, at(2026, 1, 1));
        sub.end_date = Some(at(2026, 1, 31));
        assert_eq!(
            sub.effective_status(at(2026, 2, 2)),
            SubscriptionStatus::Expired
        );
    }

    #[test]
    fn test_record_sale_marks_limit_reached() {
        let catalog = PlanCatalog::default();
        let limits = catalog.limits(PlanTier::Free);
        let mut sub = subscription(PlanTier::Free, 19, at(2026, 3, 1));

        assert_eq!(sub.record_sale(at(2026, 3, 2), limits), 20);
        assert_eq!(sub.status, SubscriptionStatus::LimitReached);
    }

    #[test]
    fn test_record_sale_after_rollover_starts_at_one() {
        let catalog = PlanCatalog::default();
        let limits = catalog.limits(PlanTier::Basico);
        let mut sub = subscription(PlanTier::Basico, 150, at(2026, 3, 31));

        assert_eq!(sub.record_sale(at(2026, 4, 1), limits), 1);
    }

    #[test]
    fn test_record_sale_unlimited_never_marks_limit() {
        let catalog = PlanCatalog::default();
        let limits = catalog.limits(PlanTier::Empresarial);
        let mut sub = subscription(PlanTier::Empresarial, u32::MAX - 1, at(2026, 3, 1));

        sub.record_sale(at(2026, 3, 2), limits);
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }
}
