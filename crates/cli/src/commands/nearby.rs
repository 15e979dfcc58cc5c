//! Offline nearby-store search over a JSON store list.

use std::path::Path;

use serde_json::Value;

use yupay_core::{GeoLocation, Store, filter_stores_by_distance};

/// Filter the active stores in `stores_json` around `origin`, as JSON.
///
/// # Errors
///
/// Returns an error if the fixture is not a JSON array of stores.
pub fn search(
    stores_json: &str,
    origin: &GeoLocation,
    radius_km: f64,
) -> Result<Value, serde_json::Error> {
    let stores = Store::active(serde_json::from_str::<Vec<Store>>(stores_json)?);
    let nearby = filter_stores_by_distance(&stores, origin, radius_km);
    serde_json::to_value(nearby)
}

/// Run the `nearby` command and print the matches as JSON.
///
/// # Errors
///
/// Returns an error for invalid coordinates or an unreadable fixture.
pub async fn run(
    stores: &Path,
    lat: f64,
    lng: f64,
    radius_km: f64,
    locality: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut origin = GeoLocation::new(lat, lng)?;
    if let Some(locality) = locality {
        origin = origin.with_locality(locality);
    }

    let json = tokio::fs::read_to_string(stores).await?;
    let matches = search(&json, &origin, radius_km)?;
    super::print_json(&matches)
}
