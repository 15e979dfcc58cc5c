//! Plan catalog commands.

use std::path::Path;

use tracing::{error, info};

use yupay_storefront::catalog::{self, CatalogError};

/// Print the catalog (built-in, or loaded from `file`) as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or fails validation.
pub async fn show(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = catalog::load_or_default(file).await?;
    super::print_json(&catalog)
}

/// Validate a YAML catalog, logging every violation.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or has violations.
pub async fn validate(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %file.display(), "Validating plan catalog");

    match catalog::load_catalog(file).await {
        Ok(_) => {
            info!("Plan catalog is valid");
            Ok(())
        }
        Err(CatalogError::Invalid(violations)) => {
            error!("Plan catalog validation failed:");
            for violation in &violations {
                error!("  - {violation}");
            }
            Err(format!("{} validation errors found", violations.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
