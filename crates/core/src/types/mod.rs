//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;

pub use contact::{Email, EmailError, Phone, PhoneError};
pub use id::*;
pub use price::{CurrencyCode, format_amount};
