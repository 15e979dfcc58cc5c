//! Plan tier and subscription status enums.
//!
//! Wire and database names are the Spanish keys used by the dashboard
//! (`basico`, `activa`, `limite_alcanzado`, ...). Variant names are English.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Subscription plan tier.
///
/// Tiers are ordered: `Free < Basico < Profesional < Empresarial`. Plan limits
/// are expected to be non-decreasing along this order (see
/// [`PlanCatalog::validate`](crate::plan::PlanCatalog::validate)).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "yupay.plan_tier", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Basico,
    Profesional,
    Empresarial,
}

impl PlanTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 4] = [Self::Free, Self::Basico, Self::Profesional, Self::Empresarial];

    /// The wire name of this tier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Basico => "basico",
            Self::Profesional => "profesional",
            Self::Empresarial => "empresarial",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("plan tier", s))
    }
}

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "yupay.subscription_status"))]
pub enum SubscriptionStatus {
    /// Paid-tier features granted without payment until the trial ends.
    #[default]
    #[serde(rename = "trial")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "trial"))]
    Trial,
    #[serde(rename = "activa")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "activa"))]
    Active,
    /// Awaiting payment confirmation from the provider.
    #[serde(rename = "pendiente")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "pendiente"))]
    Pending,
    #[serde(rename = "cancelada")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "cancelada"))]
    Cancelled,
    #[serde(rename = "vencida")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "vencida"))]
    Expired,
    /// Monthly sales cap reached; restored to `Active` on the monthly reset.
    #[serde(rename = "limite_alcanzado")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "limite_alcanzado"))]
    LimitReached,
}

impl SubscriptionStatus {
    /// All statuses.
    pub const ALL: [Self; 6] = [
        Self::Trial,
        Self::Active,
        Self::Pending,
        Self::Cancelled,
        Self::Expired,
        Self::LimitReached,
    ];

    /// The wire name of this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "activa",
            Self::Pending => "pendiente",
            Self::Cancelled => "cancelada",
            Self::Expired => "vencida",
            Self::LimitReached => "limite_alcanzado",
        }
    }

    /// Whether quota-consuming actions are blocked regardless of usage.
    #[must_use]
    pub const fn blocks_quota(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired | Self::LimitReached)
    }

    /// Whether plan features are withheld entirely.
    #[must_use]
    pub const fn blocks_features(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Expired)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("subscription status", s))
    }
}
