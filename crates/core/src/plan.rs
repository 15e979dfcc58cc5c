//! Plan configuration: per-tier limits, feature flags and pricing.
//!
//! The catalog is static configuration. [`PlanCatalog::default`] is the
//! built-in table; deployments may load an override from YAML and should run
//! [`PlanCatalog::validate`] on it before use.

use serde::{Deserialize, Serialize};

use crate::types::{Limit, PlanTier, Price};

/// A feature that a plan may or may not include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Time-boxed, geographically scoped discounts.
    FlashOffers,
    /// Sales dashboard charts and exports.
    Analytics,
    /// AI chat assistant for store owners.
    AiAssistant,
    CustomDomain,
    PrioritySupport,
}

impl Feature {
    /// All features.
    pub const ALL: [Self; 5] = [
        Self::FlashOffers,
        Self::Analytics,
        Self::AiAssistant,
        Self::CustomDomain,
        Self::PrioritySupport,
    ];
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FlashOffers => "flash_offers",
            Self::Analytics => "analytics",
            Self::AiAssistant => "ai_assistant",
            Self::CustomDomain => "custom_domain",
            Self::PrioritySupport => "priority_support",
        };
        f.write_str(name)
    }
}

/// Boolean feature flags for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PlanFeatures {
    pub flash_offers: bool,
    pub analytics: bool,
    pub ai_assistant: bool,
    pub custom_domain: bool,
    pub priority_support: bool,
}

impl PlanFeatures {
    /// Whether the flag for `feature` is set.
    #[must_use]
    pub const fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::FlashOffers => self.flash_offers,
            Feature::Analytics => self.analytics,
            Feature::AiAssistant => self.ai_assistant,
            Feature::CustomDomain => self.custom_domain,
            Feature::PrioritySupport => self.priority_support,
        }
    }
}

/// Limits and features of a single plan tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Display name shown on the pricing page.
    pub name: String,
    /// Monthly price.
    pub price: Price,
    pub max_sales_per_month: Limit,
    pub max_products: Limit,
    pub max_stores: Limit,
    /// Largest radius a flash offer may target, in kilometers.
    pub max_flash_offer_radius_km: Limit,
    /// Length of the free trial granted on sign-up (0 = no trial).
    #[serde(default)]
    pub trial_days: u32,
    #[serde(default)]
    pub features: PlanFeatures,
}

/// A violation of the catalog conventions found by [`PlanCatalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogViolation {
    /// A numeric limit decreases from a lower tier to a higher one.
    #[error("{field} decreases from {lower} ({lower_value}) to {higher} ({higher_value})")]
    DecreasingLimit {
        field: &'static str,
        lower: PlanTier,
        lower_value: Limit,
        higher: PlanTier,
        higher_value: Limit,
    },
    /// A feature included in a lower tier is missing from a higher one.
    #[error("feature {feature} is included in {lower} but not in {higher}")]
    DroppedFeature {
        feature: Feature,
        lower: PlanTier,
        higher: PlanTier,
    },
    /// Flash offers are enabled but the radius ceiling is zero.
    #[error("{tier} enables flash offers with a zero radius")]
    FlashOffersWithoutRadius { tier: PlanTier },
}

/// All plan tiers and their limits.
///
/// Every tier is always present, so [`PlanCatalog::limits`] cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub free: PlanLimits,
    pub basico: PlanLimits,
    pub profesional: PlanLimits,
    pub empresarial: PlanLimits,
}

impl PlanCatalog {
    /// Limits for `tier`.
    #[must_use]
    pub const fn limits(&self, tier: PlanTier) -> &PlanLimits {
        match tier {
            PlanTier::Free => &self.free,
            PlanTier::Basico => &self.basico,
            PlanTier::Profesional => &self.profesional,
            PlanTier::Empresarial => &self.empresarial,
        }
    }

    /// Tiers paired with their limits, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = (PlanTier, &PlanLimits)> {
        PlanTier::ALL.into_iter().map(|tier| (tier, self.limits(tier)))
    }

    /// Check that limits and features never decrease from a lower tier to a
    /// higher one.
    ///
    /// Returns every violation found; an empty vector means the catalog is
    /// consistent.
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogViolation> {
        let mut violations = Vec::new();

        for (tier, limits) in self.iter() {
            if limits.features.flash_offers
                && limits.max_flash_offer_radius_km == Limit::Finite(0)
            {
                violations.push(CatalogViolation::FlashOffersWithoutRadius { tier });
            }
        }

        for pair in PlanTier::ALL.windows(2) {
            let [lower, higher] = pair else { continue };
            let (lo, hi) = (self.limits(*lower), self.limits(*higher));

            let fields = [
                ("max_sales_per_month", lo.max_sales_per_month, hi.max_sales_per_month),
                ("max_products", lo.max_products, hi.max_products),
                ("max_stores", lo.max_stores, hi.max_stores),
                (
                    "max_flash_offer_radius_km",
                    lo.max_flash_offer_radius_km,
                    hi.max_flash_offer_radius_km,
                ),
            ];
            for (field, lower_value, higher_value) in fields {
                if higher_value < lower_value {
                    violations.push(CatalogViolation::DecreasingLimit {
                        field,
                        lower: *lower,
                        lower_value,
                        higher: *higher,
                        higher_value,
                    });
                }
            }

            for feature in Feature::ALL {
                if lo.features.has(feature) && !hi.features.has(feature) {
                    violations.push(CatalogViolation::DroppedFeature {
                        feature,
                        lower: *lower,
                        higher: *higher,
                    });
                }
            }
        }

        violations
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            free: PlanLimits {
                name: "Free".to_string(),
                price: Price::ars(0),
                max_sales_per_month: Limit::Finite(20),
                max_products: Limit::Finite(10),
                max_stores: Limit::Finite(1),
                max_flash_offer_radius_km: Limit::Finite(0),
                trial_days: 0,
                features: PlanFeatures::default(),
            },
            basico: PlanLimits {
                name: "Básico".to_string(),
                price: Price::ars(4999),
                max_sales_per_month: Limit::Finite(200),
                max_products: Limit::Finite(100),
                max_stores: Limit::Finite(1),
                max_flash_offer_radius_km: Limit::Finite(5),
                trial_days: 14,
                features: PlanFeatures {
                    flash_offers: true,
                    ..PlanFeatures::default()
                },
            },
            profesional: PlanLimits {
                name: "Profesional".to_string(),
                price: Price::ars(14999),
                max_sales_per_month: Limit::Finite(1000),
                max_products: Limit::Finite(500),
                max_stores: Limit::Finite(3),
                max_flash_offer_radius_km: Limit::Finite(20),
                trial_days: 14,
                features: PlanFeatures {
                    flash_offers: true,
                    analytics: true,
                    ai_assistant: true,
                    ..PlanFeatures::default()
                },
            },
            empresarial: PlanLimits {
                name: "Empresarial".to_string(),
                price: Price::ars(39999),
                max_sales_per_month: Limit::Unlimited,
                max_products: Limit::Unlimited,
                max_stores: Limit::Unlimited,
                max_flash_offer_radius_km: Limit::Finite(50),
                trial_days: 14,
                features: PlanFeatures {
                    flash_offers: true,
                    analytics: true,
                    ai_assistant: true,
                    custom_domain: true,
                    priority_support: true,
                },
            },
        }
    }
}
