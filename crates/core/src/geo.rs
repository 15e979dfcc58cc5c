//! Geolocation values and nearest-store discovery.
//!
//! Distances are great-circle distances computed with the haversine formula on
//! a sphere of radius [`EARTH_RADIUS_KM`]. Coordinates are decimal degrees.

use serde::{Deserialize, Serialize};

use crate::store::Store;

/// Mean Earth radius used for distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors that can occur when constructing a [`GeoLocation`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude must be between -90 and 90, got {0}")]
    InvalidLatitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude must be between -180 and 180, got {0}")]
    InvalidLongitude(f64),
}

/// A point on the map with optional postal details.
///
/// Immutable once built. Coordinates are validated on construction and on
/// deserialization, so every `GeoLocation` holds finite, in-range degrees.
///
/// ```
/// use yupay_core::GeoLocation;
///
/// let obelisco = GeoLocation::new(-34.6037, -58.3816)
///     .unwrap()
///     .with_locality("Buenos Aires");
/// assert_eq!(obelisco.locality(), Some("Buenos Aires"));
///
/// assert!(GeoLocation::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoLocationRepr")]
pub struct GeoLocation {
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    province: Option<String>,
}

#[derive(Deserialize)]
struct GeoLocationRepr {
    lat: f64,
    lng: f64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    province: Option<String>,
}

impl TryFrom<GeoLocationRepr> for GeoLocation {
    type Error = GeoError;

    fn try_from(repr: GeoLocationRepr) -> Result<Self, Self::Error> {
        let mut location = Self::new(repr.lat, repr.lng)?;
        location.address = repr.address;
        location.locality = repr.locality;
        location.province = repr.province;
        Ok(location)
    }
}

impl GeoLocation {
    /// Build a location from decimal-degree coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::InvalidLongitude(lng));
        }
        Ok(Self {
            lat,
            lng,
            address: None,
            locality: None,
            province: None,
        })
    }

    /// Set the street address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Set the locality (city or town).
    #[must_use]
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Set the province.
    #[must_use]
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        self.locality.as_deref()
    }

    #[must_use]
    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    /// Great-circle distance to `other` in kilometers.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }

    /// Whether both locations name the same locality, ignoring case and
    /// surrounding whitespace. Missing or blank localities never match.
    #[must_use]
    pub fn same_locality(&self, other: &Self) -> bool {
        match (
            self.locality().and_then(normalize_locality),
            other.locality().and_then(normalize_locality),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Lowercased, trimmed locality, or `None` when it is blank.
fn normalize_locality(locality: &str) -> Option<String> {
    let trimmed = locality.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Haversine great-circle distance between two points, in kilometers.
///
/// Symmetric in its arguments and zero for identical points.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `a` marginally past 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// A store that passed the distance filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStore<'a> {
    #[serde(flatten)]
    pub store: &'a Store,
    pub distance_km: f64,
}

/// Stores reachable from `origin` within `radius_km`, nearest first.
///
/// - Stores without a location are always excluded.
/// - `radius_km == 0` means "same locality only": a store matches when its
///   locality equals the origin's ignoring case. An origin with a missing or
///   blank locality matches nothing.
/// - Otherwise a store matches when its distance is `<= radius_km`. A negative
///   or NaN radius therefore matches nothing.
/// - Ordering is by ascending distance; ties keep their input order.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn filter_stores_by_distance<'a>(
    stores: &'a [Store],
    origin: &GeoLocation,
    radius_km: f64,
) -> Vec<NearbyStore<'a>> {
    let same_locality_only = radius_km == 0.0;

    let mut nearby: Vec<NearbyStore<'a>> = stores
        .iter()
        .filter_map(|store| {
            let location = store.location.as_ref()?;
            let distance_km = origin.distance_km(location);
            let reachable = if same_locality_only {
                origin.same_locality(location)
            } else {
                distance_km <= radius_km
            };
            reachable.then_some(NearbyStore { store, distance_km })
        })
        .collect();

    // `sort_by` is stable, which keeps equal distances in input order.
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}
