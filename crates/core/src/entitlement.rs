//! Plan/limit evaluation.
//!
//! [`evaluate`] decides whether a store owner may perform a quota-consuming
//! action or use a gated feature. It is a pure function of the subscription,
//! the plan catalog, current usage and the evaluation instant. It never fails:
//! every input produces an allow or a deny with a reason.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::{Feature, PlanCatalog, PlanLimits};
use crate::subscription::Subscription;
use crate::types::{Limit, PlanTier, SubscriptionStatus};

/// Counts that live outside the subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Products across all of the owner's stores.
    pub products: u32,
    /// Stores owned.
    pub stores: u32,
}

/// An action whose permission depends on the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    NewSale,
    NewProduct,
    NewStore,
    /// Publish a flash offer targeting customers within `radius_km`.
    FlashOffer { radius_km: f64 },
    /// Use a feature gated by a plan flag.
    Feature { feature: Feature },
}

impl Action {
    /// Whether the action consumes quota (and is blocked by inactive statuses).
    #[must_use]
    pub const fn consumes_quota(&self) -> bool {
        !matches!(self, Self::Feature { .. })
    }
}

/// Why an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenyReason {
    /// The subscription is cancelled, expired, or has hit its monthly cap.
    InactiveSubscription { status: SubscriptionStatus },
    QuotaExceeded { limit: Limit, used: u32 },
    RadiusExceeded { requested_km: f64, max_km: Limit },
    /// Negative or non-finite radius.
    InvalidRadius { requested_km: f64 },
    FeatureNotIncluded { feature: Feature },
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InactiveSubscription { status } => write!(f, "subscription is {status}"),
            Self::QuotaExceeded { limit, used } => {
                write!(f, "plan limit of {limit} reached ({used} used)")
            }
            Self::RadiusExceeded {
                requested_km,
                max_km,
            } => write!(f, "radius {requested_km} km exceeds plan maximum of {max_km} km"),
            Self::InvalidRadius { requested_km } => write!(f, "invalid radius {requested_km}"),
            Self::FeatureNotIncluded { feature } => {
                write!(f, "feature {feature} is not included in the plan")
            }
        }
    }
}

/// Result of evaluating an action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    /// Units left before this action, for quota actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
}

impl Decision {
    const fn allow(remaining: Option<Limit>) -> Self {
        Self {
            allowed: true,
            remaining,
            reason: None,
        }
    }

    const fn deny(remaining: Option<Limit>, reason: DenyReason) -> Self {
        Self {
            allowed: false,
            remaining,
            reason: Some(reason),
        }
    }

    /// Allow or deny a counted action against `limit`.
    const fn against(limit: Limit, used: u32) -> Self {
        let remaining = Some(limit.remaining(used));
        if limit.allows_another(used) {
            Self::allow(remaining)
        } else {
            Self::deny(remaining, DenyReason::QuotaExceeded { limit, used })
        }
    }
}

/// Decide whether `action` is permitted at `now`.
///
/// Monthly sales usage is read through [`Subscription::sales_used_at`], so a
/// counter left over from a previous month never counts against this one even
/// when the caller has not yet persisted the reset.
#[must_use]
pub fn evaluate(
    subscription: &Subscription,
    catalog: &PlanCatalog,
    usage: Usage,
    action: Action,
    now: DateTime<Utc>,
) -> Decision {
    let limits = catalog.limits(subscription.plan);
    let status = subscription.effective_status(now);

    if action.consumes_quota() && status.blocks_quota() {
        let remaining = quota_limit(limits, action, subscription, usage, now)
            .map(|(limit, used)| limit.remaining(used));
        return Decision::deny(remaining, DenyReason::InactiveSubscription { status });
    }

    match action {
        Action::NewSale | Action::NewProduct | Action::NewStore => {
            match quota_limit(limits, action, subscription, usage, now) {
                Some((limit, used)) => Decision::against(limit, used),
                None => Decision::allow(None),
            }
        }
        Action::FlashOffer { radius_km } => evaluate_flash_offer(limits, radius_km),
        Action::Feature { feature } => {
            if status.blocks_features() {
                Decision::deny(None, DenyReason::InactiveSubscription { status })
            } else if limits.features.has(feature) {
                Decision::allow(None)
            } else {
                Decision::deny(None, DenyReason::FeatureNotIncluded { feature })
            }
        }
    }
}

fn quota_limit(
    limits: &PlanLimits,
    action: Action,
    subscription: &Subscription,
    usage: Usage,
    now: DateTime<Utc>,
) -> Option<(Limit, u32)> {
    match action {
        Action::NewSale => Some((
            limits.max_sales_per_month,
            subscription.sales_used_at(now),
        )),
        Action::NewProduct => Some((limits.max_products, usage.products)),
        Action::NewStore => Some((limits.max_stores, usage.stores)),
        Action::FlashOffer { .. } | Action::Feature { .. } => None,
    }
}

fn evaluate_flash_offer(limits: &PlanLimits, radius_km: f64) -> Decision {
    if !limits.features.flash_offers {
        return Decision::deny(
            None,
            DenyReason::FeatureNotIncluded {
                feature: Feature::FlashOffers,
            },
        );
    }
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Decision::deny(None, DenyReason::InvalidRadius {
            requested_km: radius_km,
        });
    }
    if limits.max_flash_offer_radius_km.admits(radius_km) {
        Decision::allow(None)
    } else {
        Decision::deny(None, DenyReason::RadiusExceeded {
            requested_km: radius_km,
            max_km: limits.max_flash_offer_radius_km,
        })
    }
}

/// One quota line of a [`QuotaSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLine {
    pub limit: Limit,
    pub used: u32,
    pub remaining: Limit,
}

impl QuotaLine {
    const fn new(limit: Limit, used: u32) -> Self {
        Self {
            limit,
            used,
            remaining: limit.remaining(used),
        }
    }
}

/// Remaining quota across all counted resources, for the owner dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSummary {
    pub plan: PlanTier,
    /// Status as evaluated at the summary instant.
    pub status: SubscriptionStatus,
    pub sales: QuotaLine,
    pub products: QuotaLine,
    pub stores: QuotaLine,
}

/// Summarize usage against every counted limit at `now`.
#[must_use]
pub fn quota_summary(
    subscription: &Subscription,
    catalog: &PlanCatalog,
    usage: Usage,
    now: DateTime<Utc>,
) -> QuotaSummary {
    let limits = catalog.limits(subscription.plan);
    QuotaSummary {
        plan: subscription.plan,
        status: subscription.effective_status(now),
        sales: QuotaLine::new(limits.max_sales_per_month, subscription.sales_used_at(now)),
        products: QuotaLine::new(limits.max_products, usage.products),
        stores: QuotaLine::new(limits.max_stores, usage.stores),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::{SubscriptionId, UserId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 14, 10, 0, 0).unwrap()
    }

    fn subscription(plan: PlanTier, status: SubscriptionStatus, sales: u32) -> Subscription {
        Subscription {
            id: SubscriptionId::generate(),
            user_id: UserId::generate(),
            plan,
            status,
            sales_this_month: sales,
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: None,
            trial_end_date: None,
            last_reset_date: Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    fn active(plan: PlanTier, sales: u32) -> Subscription {
        subscription(plan, SubscriptionStatus::Active, sales)
    }

    #[test]
    fn test_sale_denied_at_limit_and_allowed_below() {
        let catalog = PlanCatalog::default();
        for (tier, limits) in catalog.iter() {
            let Limit::Finite(max) = limits.max_sales_per_month else {
                continue;
            };
            let below = evaluate(
                &active(tier, max - 1),
                &catalog,
                Usage::default(),
                Action::NewSale,
                now(),
            );
            assert!(below.allowed, "{tier} should allow sale {max}");
            assert_eq!(below.remaining, Some(Limit::Finite(1)));

            let at = evaluate(
                &active(tier, max),
                &catalog,
                Usage::default(),
                Action::NewSale,
                now(),
            );
            assert!(!at.allowed, "{tier} should deny sale {}", max + 1);
            assert_eq!(at.remaining, Some(Limit::Finite(0)));
            assert_eq!(
                at.reason,
                Some(DenyReason::QuotaExceeded {
                    limit: Limit::Finite(max),
                    used: max
                })
            );
        }
    }

    #[test]
    fn test_unlimited_sales_always_allowed() {
        let catalog = PlanCatalog::default();
        for sales in [0, 1_000, 1_000_000, u32::MAX] {
            let decision = evaluate(
                &active(PlanTier::Empresarial, sales),
                &catalog,
                Usage::default(),
                Action::NewSale,
                now(),
            );
            assert!(decision.allowed);
            assert_eq!(decision.remaining, Some(Limit::Unlimited));
        }
    }

    #[test]
    fn test_sales_from_previous_month_do_not_count() {
        let catalog = PlanCatalog::default();
        let mut sub = active(PlanTier::Free, 20);
        sub.last_reset_date = Utc.with_ymd_and_hms(2026, 4, 3, 0, 0, 0).unwrap();

        let decision = evaluate(&sub, &catalog, Usage::default(), Action::NewSale, now());
        assert!(decision.allowed);
        assert_eq!(decision.remaining, Some(Limit::Finite(20)));
    }

    #[test]
    fn test_basico_product_limit() {
        let catalog = PlanCatalog::default();
        let sub = active(PlanTier::Basico, 0);

        let at_99 = evaluate(
            &sub,
            &catalog,
            Usage {
                products: 99,
                stores: 1,
            },
            Action::NewProduct,
            now(),
        );
        assert!(at_99.allowed);

        let at_100 = evaluate(
            &sub,
            &catalog,
            Usage {
                products: 100,
                stores: 1,
            },
            Action::NewProduct,
            now(),
        );
        assert!(!at_100.allowed);
    }

    #[test]
    fn test_store_limit() {
        let catalog = PlanCatalog::default();
        let usage = Usage {
            products: 0,
            stores: 1,
        };
        let basico = evaluate(
            &active(PlanTier::Basico, 0),
            &catalog,
            usage,
            Action::NewStore,
            now(),
        );
        assert!(!basico.allowed);

        let profesional = evaluate(
            &active(PlanTier::Profesional, 0),
            &catalog,
            usage,
            Action::NewStore,
            now(),
        );
        assert!(profesional.allowed);
        assert_eq!(profesional.remaining, Some(Limit::Finite(2)));
    }

    #[test]
    fn test_inactive_statuses_deny_quota_actions() {
        let catalog = PlanCatalog::default();
        for status in [
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Expired,
            SubscriptionStatus::LimitReached,
        ] {
            let sub = subscription(PlanTier::Empresarial, status, 0);
            for action in [
                Action::NewSale,
                Action::NewProduct,
                Action::NewStore,
                Action::FlashOffer { radius_km: 1.0 },
            ] {
                let decision = evaluate(&sub, &catalog, Usage::default(), action, now());
                assert!(!decision.allowed, "{status} should deny {action:?}");
                assert_eq!(
                    decision.reason,
                    Some(DenyReason::InactiveSubscription { status })
                );
            }
        }
    }

    #[test]
    fn test_trial_and_pending_evaluate_numerically() {
        let catalog = PlanCatalog::default();
        for status in [SubscriptionStatus::Trial, SubscriptionStatus::Pending] {
            let sub = subscription(PlanTier::Basico, status, 10);
            let decision = evaluate(&sub, &catalog, Usage::default(), Action::NewSale, now());
            assert!(decision.allowed);
        }
    }

    #[test]
    fn test_expired_trial_denies() {
        let catalog = PlanCatalog::default();
        let mut sub = subscription(PlanTier::Profesional, SubscriptionStatus::Trial, 0);
        sub.trial_end_date = Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());

        let decision = evaluate(&sub, &catalog, Usage::default(), Action::NewProduct, now());
        assert_eq!(
            decision.reason,
            Some(DenyReason::InactiveSubscription {
                status: SubscriptionStatus::Expired
            })
        );
    }

    #[test]
    fn test_flash_offer_radius() {
        let catalog = PlanCatalog::default();
        let sub = active(PlanTier::Basico, 0);

        let offer = |radius_km| {
            evaluate(
                &sub,
                &catalog,
                Usage::default(),
                Action::FlashOffer { radius_km },
                now(),
            )
        };

        assert!(offer(5.0).allowed);

        let too_far = offer(5.5);
        assert_eq!(
            too_far.reason,
            Some(DenyReason::RadiusExceeded {
                requested_km: 5.5,
                max_km: Limit::Finite(5)
            })
        );

        assert_eq!(
            offer(-1.0).reason,
            Some(DenyReason::InvalidRadius { requested_km: -1.0 })
        );
        assert!(!offer(f64::NAN).allowed);
    }

    #[test]
    fn test_flash_offer_requires_feature() {
        let catalog = PlanCatalog::default();
        let decision = evaluate(
            &active(PlanTier::Free, 0),
            &catalog,
            Usage::default(),
            Action::FlashOffer { radius_km: 0.0 },
            now(),
        );
        assert_eq!(
            decision.reason,
            Some(DenyReason::FeatureNotIncluded {
                feature: Feature::FlashOffers
            })
        );
    }

    #[test]
    fn test_feature_gate_ignores_limit_reached() {
        let catalog = PlanCatalog::default();
        let sub = subscription(PlanTier::Profesional, SubscriptionStatus::LimitReached, 1000);
        let action = Action::Feature {
            feature: Feature::Analytics,
        };
        assert!(evaluate(&sub, &catalog, Usage::default(), action, now()).allowed);

        let cancelled = subscription(PlanTier::Profesional, SubscriptionStatus::Cancelled, 0);
        assert!(!evaluate(&cancelled, &catalog, Usage::default(), action, now()).allowed);
    }

    #[test]
    fn test_quota_summary() {
        let catalog = PlanCatalog::default();
        let summary = quota_summary(
            &active(PlanTier::Basico, 150),
            &catalog,
            Usage {
                products: 40,
                stores: 1,
            },
            now(),
        );
        assert_eq!(summary.sales.remaining, Limit::Finite(50));
        assert_eq!(summary.products.remaining, Limit::Finite(60));
        assert_eq!(summary.stores.remaining, Limit::Finite(0));
    }

    #[test]
    fn test_action_wire_format() {
        let action: Action =
            serde_json::from_str(r#"{"kind":"flash_offer","radius_km":3.5}"#).unwrap();
        assert_eq!(action, Action::FlashOffer { radius_km: 3.5 });

        let action: Action =
            serde_json::from_str(r#"{"kind":"feature","feature":"ai_assistant"}"#).unwrap();
        assert_eq!(
            action,
            Action::Feature {
                feature: Feature::AiAssistant
            }
        );
    }
}
