//! Catalog logic shared by the JSON API, the product feed and the sitemap.
//!
//! - [`tree`] - Parent/child index over the flat category list
//! - [`attributes`] - Typed product characteristics and filter facets
//! - [`pagination`] - Page math for listings

pub mod attributes;
pub mod pagination;
pub mod tree;

pub use attributes::{AttributeFacet, AttributeValue, FacetValues, ProductAttribute, aggregate_facets};
pub use pagination::Pagination;
pub use tree::{CategoryNode, CategoryTree, FlatCategory};
