//! Offline entitlement checks against a subscription fixture.
//!
//! ```bash
//! yupay-cli check --subscription sub.json --action new_product --products 99
//! yupay-cli check --subscription sub.json --action flash_offer --radius 12.5
//! yupay-cli check --subscription sub.json --action feature --feature analytics
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::debug;

use yupay_core::{Action, Decision, Feature, PlanCatalog, Subscription, Usage, evaluate};
use yupay_storefront::catalog;

/// Action names accepted by `--action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ActionKind {
    NewSale,
    NewProduct,
    NewStore,
    FlashOffer,
    Feature,
}

/// Inputs of the `check` command.
#[derive(Debug)]
pub struct CheckArgs<'a> {
    pub subscription: &'a Path,
    pub plans: Option<&'a Path>,
    pub action: ActionKind,
    pub usage: Usage,
    pub radius_km: Option<f64>,
    pub feature: Option<Feature>,
    pub at: Option<DateTime<Utc>>,
}

/// Parse a feature name such as `flash_offers`.
///
/// # Errors
///
/// Returns the list of known names when `value` is not one of them.
pub fn parse_feature(value: &str) -> Result<Feature, String> {
    Feature::ALL
        .into_iter()
        .find(|feature| feature.to_string() == value)
        .ok_or_else(|| {
            let known: Vec<String> = Feature::ALL.iter().map(ToString::to_string).collect();
            format!("unknown feature {value:?} (expected one of {})", known.join(", "))
        })
}

/// Build the evaluator action from command-line flags.
///
/// # Errors
///
/// Returns an error if `flash_offer` lacks `--radius` or `feature` lacks `--feature`.
pub fn build_action(
    kind: ActionKind,
    radius_km: Option<f64>,
    feature: Option<Feature>,
) -> Result<Action, String> {
    match kind {
        ActionKind::NewSale => Ok(Action::NewSale),
        ActionKind::NewProduct => Ok(Action::NewProduct),
        ActionKind::NewStore => Ok(Action::NewStore),
        ActionKind::FlashOffer => radius_km
            .map(|radius_km| Action::FlashOffer { radius_km })
            .ok_or_else(|| "--radius is required for flash_offer".to_string()),
        ActionKind::Feature => feature
            .map(|feature| Action::Feature { feature })
            .ok_or_else(|| "--feature is required for feature".to_string()),
    }
}

/// Evaluate an action for a subscription read from JSON.
///
/// # Errors
///
/// Returns an error if the fixture is not a valid subscription.
pub fn decide(
    subscription_json: &str,
    catalog: &PlanCatalog,
    usage: Usage,
    action: Action,
    now: DateTime<Utc>,
) -> Result<Decision, serde_json::Error> {
    let subscription: Subscription = serde_json::from_str(subscription_json)?;
    Ok(evaluate(&subscription, catalog, usage, action, now))
}

/// Run the `check` command and print the decision as JSON.
///
/// # Errors
///
/// Returns an error if inputs cannot be read or parsed.
pub async fn run(args: CheckArgs<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = catalog::load_or_default(args.plans).await?;
    let action = build_action(args.action, args.radius_km, args.feature)?;
    let json = tokio::fs::read_to_string(args.subscription).await?;

    let decision = decide(
        &json,
        &catalog,
        args.usage,
        action,
        args.at.unwrap_or_else(Utc::now),
    )?;
    debug!(?action, allowed = decision.allowed, "Evaluated action");

    super::print_json(&decision)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use yupay_core::{DenyReason, Limit};

    use super::*;

    const BASICO_SUBSCRIPTION: &str = r#"{
        "id": "6f1c2a8e-04b5-4c7e-9a57-2f3d6c1b9e10",
        "user_id": "0a7e4b52-3c9d-4f1a-8b6e-5d2c7f9a1e34",
        "plan": "basico",
        "status": "activa",
        "sales_this_month": 12,
        "start_date": "2026-01-05T10:00:00Z",
        "end_date": null,
        "trial_end_date": null,
        "last_reset_date": "2026-05-01T00:00:00Z"
    }"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_feature() {
        assert_eq!(parse_feature("analytics").unwrap(), Feature::Analytics);
        let err = parse_feature("teleport").unwrap_err();
        assert!(err.contains("flash_offers"));
    }

    #[test]
    fn test_build_action_requires_radius() {
        assert!(build_action(ActionKind::FlashOffer, None, None).is_err());
        assert_eq!(
            build_action(ActionKind::FlashOffer, Some(3.0), None).unwrap(),
            Action::FlashOffer { radius_km: 3.0 }
        );
    }

    #[test]
    fn test_build_action_requires_feature() {
        assert!(build_action(ActionKind::Feature, None, None).is_err());
    }

    #[test]
    fn test_decide_product_limit() {
        let catalog = PlanCatalog::default();
        let allowed = decide(
            BASICO_SUBSCRIPTION,
            &catalog,
            Usage {
                products: 99,
                stores: 1,
            },
            Action::NewProduct,
            now(),
        )
        .unwrap();
        assert!(allowed.allowed);

        let denied = decide(
            BASICO_SUBSCRIPTION,
            &catalog,
            Usage {
                products: 100,
                stores: 1,
            },
            Action::NewProduct,
            now(),
        )
        .unwrap();
        assert!(!denied.allowed);
        assert_eq!(
            denied.reason,
            Some(DenyReason::QuotaExceeded {
                limit: Limit::Finite(100),
                used: 100,
            })
        );
    }

    #[test]
    fn test_decide_rejects_bad_fixture() {
        let catalog = PlanCatalog::default();
        let fixture = BASICO_SUBSCRIPTION.replace("\"activa\"", "\"dormida\"");
        assert!(decide(&fixture, &catalog, Usage::default(), Action::NewSale, now()).is_err());
    }
}
