//! Usage ceilings that may be unlimited.
//!
//! Stored plan configuration uses `-1` to mean "unlimited". Inside the crate
//! that sentinel never survives parsing: it becomes [`Limit::Unlimited`] and
//! every comparison matches on the variant instead of doing arithmetic on `-1`.

use serde::{Deserialize, Serialize};

/// Sentinel used by stored configuration for an unlimited ceiling.
pub const UNLIMITED_SENTINEL: i64 = -1;

/// Errors that can occur when converting a raw integer into a [`Limit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    /// Negative values other than the `-1` sentinel.
    #[error("limit must be -1 (unlimited) or non-negative, got {0}")]
    Negative(i64),
    /// The value does not fit in a `u32`.
    #[error("limit {0} is too large")]
    TooLarge(i64),
}

/// A usage ceiling.
///
/// Ordering treats `Unlimited` as greater than every finite value, so
/// `Finite(5) < Finite(10) < Unlimited`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Limit {
    Finite(u32),
    Unlimited,
}

impl Limit {
    /// Whether one more unit may be consumed when `used` units already are.
    #[must_use]
    pub const fn allows_another(&self, used: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Finite(max) => used < *max,
        }
    }

    /// Whether a measured value (e.g. a radius in km) fits under the ceiling.
    #[must_use]
    pub fn admits(&self, value: f64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Finite(max) => value <= f64::from(*max),
        }
    }

    /// Units left after `used`, saturating at zero.
    #[must_use]
    pub const fn remaining(&self, used: u32) -> Self {
        match self {
            Self::Unlimited => Self::Unlimited,
            Self::Finite(max) => Self::Finite(max.saturating_sub(used)),
        }
    }

    /// Whether `used` has reached the ceiling.
    #[must_use]
    pub const fn is_reached(&self, used: u32) -> bool {
        !self.allows_another(used)
    }

    /// Raw representation with `-1` for unlimited.
    #[must_use]
    pub fn to_sentinel(&self) -> i64 {
        match self {
            Self::Unlimited => UNLIMITED_SENTINEL,
            Self::Finite(max) => i64::from(*max),
        }
    }

    /// The finite ceiling, or `None` when unlimited.
    #[must_use]
    pub const fn finite(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Finite(max) => Some(*max),
        }
    }
}

impl TryFrom<i64> for Limit {
    type Error = LimitError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw == UNLIMITED_SENTINEL {
            return Ok(Self::Unlimited);
        }
        if raw < 0 {
            return Err(LimitError::Negative(raw));
        }
        u32::try_from(raw)
            .map(Self::Finite)
            .map_err(|_| LimitError::TooLarge(raw))
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        limit.to_sentinel()
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Finite(max) => write!(f, "{max}"),
        }
    }
}
