//! Store repository.

use sqlx::PgPool;
use tracing::warn;

use yupay_core::{GeoLocation, Store, StoreId, UserId};

use super::RepositoryError;

/// Internal row type for store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    owner_id: UserId,
    name: String,
    description: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    locality: Option<String>,
    province: Option<String>,
    is_active: bool,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let location = match (row.lat, row.lng) {
            (Some(lat), Some(lng)) => {
                let mut location = GeoLocation::new(lat, lng).map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid coordinates for store {}: {e}",
                        row.id
                    ))
                })?;
                if let Some(address) = row.address {
                    location = location.with_address(address);
                }
                if let Some(locality) = row.locality {
                    location = location.with_locality(locality);
                }
                if let Some(province) = row.province {
                    location = location.with_province(province);
                }
                Some(location)
            }
            (None, None) => None,
            _ => {
                warn!(store_id = %row.id, "Store has only one coordinate; treating as unlocated");
                None
            }
        };

        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            location,
            is_active: row.is_active,
        })
    }
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every active store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds invalid coordinates.
    pub async fn list_active(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, owner_id, name, description,
                   lat, lng, address, locality, province, is_active
            FROM yupay.store
            WHERE is_active
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Store::try_from).collect()
    }
}
