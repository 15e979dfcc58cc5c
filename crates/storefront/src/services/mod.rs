//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `subscriptions` - Plan evaluation, quota summaries and sale accounting

pub mod subscriptions;

pub use subscriptions::{SaleRecorded, SubscriptionError, SubscriptionService};
