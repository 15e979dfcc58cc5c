//! Core value types for Yupay.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod limit;
pub mod price;
pub mod status;

pub use id::*;
pub use limit::{Limit, LimitError, UNLIMITED_SENTINEL};
pub use price::{CurrencyCode, Price};
pub use status::*;
