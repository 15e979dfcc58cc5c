//! Loading the plan catalog.
//!
//! The built-in [`PlanCatalog::default`] is used unless `YUPAY_PLANS_FILE`
//! points at a YAML document with one entry per tier:
//!
//! ```yaml
//! free:
//!   name: Free
//!   price: { amount: "0" }
//!   max_sales_per_month: 20
//!   max_products: 10
//!   max_stores: 1
//!   max_flash_offer_radius_km: 0
//! basico:
//!   # ...
//! ```
//!
//! `-1` means unlimited. A catalog is rejected unless every limit and feature
//! grows (or stays equal) from one tier to the next.

use std::path::Path;

use thiserror::Error;
use yupay_core::{CatalogViolation, PlanCatalog};

/// Errors that can occur when loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read plan catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse plan catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("plan catalog has {} violation(s)", .0.len())]
    Invalid(Vec<CatalogViolation>),
}

/// Parse and validate a YAML catalog.
///
/// # Errors
///
/// Returns `CatalogError::Parse` for malformed YAML or limits, and
/// `CatalogError::Invalid` when tiers are out of order.
pub fn parse_catalog(yaml: &str) -> Result<PlanCatalog, CatalogError> {
    let catalog: PlanCatalog = serde_yaml::from_str(yaml)?;
    let violations = catalog.validate();
    if violations.is_empty() {
        Ok(catalog)
    } else {
        Err(CatalogError::Invalid(violations))
    }
}

/// Read, parse and validate a YAML catalog file.
///
/// # Errors
///
/// See [`parse_catalog`]; additionally `CatalogError::Io` if the file cannot be read.
pub async fn load_catalog(path: &Path) -> Result<PlanCatalog, CatalogError> {
    let yaml = tokio::fs::read_to_string(path).await?;
    parse_catalog(&yaml)
}

/// Load the catalog from `path`, or the built-in one when no file is configured.
///
/// # Errors
///
/// See [`load_catalog`].
pub async fn load_or_default(path: Option<&Path>) -> Result<PlanCatalog, CatalogError> {
    match path {
        Some(path) => {
            let catalog = load_catalog(path).await?;
            tracing::info!(path = %path.display(), "Loaded plan catalog");
            Ok(catalog)
        }
        None => Ok(PlanCatalog::default()),
    }
}
