//! Promtech Core - storefront domain logic.
//!
//! This crate holds everything the storefront computes without talking to the
//! outside world:
//! - [`types`] - Newtype IDs, contact details and prices
//! - [`catalog`] - Category tree, attribute facets and pagination math
//! - [`stores`] - Cart and favorites reducers with pluggable persistence
//! - [`collation`] - Russian alphabetical ordering for user-facing lists
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no HTTP clients and no
//! filesystem access. Persistence is injected through [`stores::Persistence`],
//! so the reducers are testable without a session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod collation;
pub mod stores;
pub mod types;

pub use types::*;
