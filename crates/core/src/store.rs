//! Stores owned by subscribers.

use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;
use crate::types::{StoreId, UserId};

/// A storefront owned by exactly one user.
///
/// Disabled stores keep their row with `is_active = false`; they are only
/// hard-deleted by an explicit admin cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the store is, if the owner geotagged it.
    #[serde(default)]
    pub location: Option<GeoLocation>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Store {
    /// Drop inactive stores, keeping input order.
    pub fn active(stores: impl IntoIterator<Item = Self>) -> Vec<Self> {
        stores.into_iter().filter(|store| store.is_active).collect()
    }
}
