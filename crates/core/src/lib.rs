//! Yupay Core - Domain types and business rules.
//!
//! This crate provides the shared domain used by every Yupay component:
//! - `storefront` - JSON API for the storefront and the owner dashboard
//! - `cli` - Command-line tools for migrations and plan catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Callers fetch records, then ask the core what is
//! allowed or reachable.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, limits, tiers and statuses
//! - [`plan`] - Per-tier limits, feature flags and the plan catalog
//! - [`subscription`] - Subscriptions and the monthly sales counter
//! - [`entitlement`] - The plan/limit evaluator
//! - [`store`] - Stores owned by subscribers
//! - [`geo`] - Haversine distance and nearest-store filtering

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entitlement;
pub mod geo;
pub mod plan;
pub mod store;
pub mod subscription;
pub mod types;

pub use entitlement::{Action, Decision, DenyReason, QuotaSummary, Usage, evaluate, quota_summary};
pub use geo::{GeoError, GeoLocation, NearbyStore, filter_stores_by_distance, haversine_km};
pub use plan::{CatalogViolation, Feature, PlanCatalog, PlanFeatures, PlanLimits};
pub use store::Store;
pub use subscription::Subscription;
pub use types::*;
