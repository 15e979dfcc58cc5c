//! Nearby store discovery.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use yupay_core::{GeoLocation, NearbyStore, filter_stores_by_distance};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for `/api/stores/nearby`.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in kilometers; `0` restricts the search to `locality`.
    pub radius_km: f64,
    pub locality: Option<String>,
}

impl NearbyQuery {
    fn origin(&self) -> Result<GeoLocation> {
        let origin = GeoLocation::new(self.lat, self.lng)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(match &self.locality {
            Some(locality) => origin.with_locality(locality.clone()),
            None => origin,
        })
    }

    fn radius_km(&self) -> Result<f64> {
        if self.radius_km.is_finite() && self.radius_km >= 0.0 {
            Ok(self.radius_km)
        } else {
            Err(AppError::BadRequest(format!(
                "radius_km must be a non-negative number, got {}",
                self.radius_km
            )))
        }
    }
}

#[derive(Serialize)]
struct NearbyResponse<'a> {
    count: usize,
    stores: Vec<NearbyStore<'a>>,
}

/// Active stores within `radius_km` of a point, nearest first.
#[instrument(skip(state))]
pub async fn nearby(
    State(state): State<AppState>,
    query: std::result::Result<Query<NearbyQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let origin = query.origin()?;
    let radius_km = query.radius_km()?;

    let stores = state.active_stores().await?;
    let nearby = filter_stores_by_distance(&stores, &origin, radius_km);
    debug!(
        candidates = stores.len(),
        matched = nearby.len(),
        radius_km,
        "Filtered nearby stores"
    );

    Ok(Json(NearbyResponse {
        count: nearby.len(),
        stores: nearby,
    })
    .into_response())
}
