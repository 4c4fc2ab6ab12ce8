//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Health check
//!
//! # Catalog
//! GET    /api/categories                - Category listing (?parent=root|slug)
//! GET    /api/categories/{slug}         - Category detail
//! GET    /api/categories/{slug}/children - Whole subtree below a category
//! GET    /api/products                  - Product listing with filters
//! GET    /api/products/{slug}           - Product detail
//! GET    /api/product-attributes        - Filter facets for a subtree
//!
//! # Blog
//! GET    /api/blog/sections             - Blog sections
//! GET    /api/blog/articles             - Article listing (?section=slug)
//! GET    /api/blog/articles/{slug}      - Article with rendered HTML and related articles
//!
//! # Lookups
//! GET    /api/currency-rate             - Roubles per unit (?code=USD)
//! GET    /api/geo/reverse               - City for coordinates (?lat&lon)
//! GET    /api/cities                    - City search (?q)
//!
//! # Cart and favorites (session)
//! GET    /api/cart                      - Cart contents
//! POST   /api/cart/items                - Add a row
//! PATCH  /api/cart/items/{id}           - Set quantity
//! DELETE /api/cart/items/{id}           - Remove a row
//! DELETE /api/cart                      - Empty the cart
//! GET    /api/favorites                 - Favorites
//! POST   /api/favorites/items           - Add a favorite
//! DELETE /api/favorites/items/{id}      - Remove a favorite
//!
//! # Forms (rate limited)
//! POST   /api/forms/lead                - Callback / price request
//! POST   /api/forms/order               - Order draft
//! POST   /api/forms/test-request        - Equipment test request
//!
//! # SEO
//! GET    /feed.yml                      - YML product feed
//! GET    /sitemap.xml                   - Sitemap
//! ```

pub mod blog;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod forms;
pub mod lookups;
pub mod seo;

use axum::{
    Json, Router,
    routing::{get, patch, post},
};
use promtech_core::catalog::Pagination;
use promtech_core::stores::{MAX_QUANTITY, MAX_UNIT_PRICE};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::forms_rate_limiter;
use crate::state::AppState;

// =============================================================================
// Response envelope
// =============================================================================

/// Success body: `{ data, meta? }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T, M = ()> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
}

/// `meta` for paginated CMS listings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ListMeta {
    pub pagination: Pagination,
}

/// Wrap `data` without metadata.
pub const fn data<T>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse { data, meta: None })
}

/// Wrap `data` with metadata.
pub const fn data_with_meta<T, M>(data: T, meta: M) -> Json<DataResponse<T, M>> {
    Json(DataResponse {
        data,
        meta: Some(meta),
    })
}

// =============================================================================
// Item validation
// =============================================================================

/// Longest product title or SKU accepted from a client.
pub(crate) const MAX_ITEM_TEXT_LENGTH: usize = 200;

/// Reject negative prices and prices above [`MAX_UNIT_PRICE`].
pub(crate) fn check_price(label: &str, price: Decimal) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(AppError::BadRequest(format!("{label} must not be negative")));
    }
    if price > Decimal::from(MAX_UNIT_PRICE) {
        return Err(AppError::BadRequest(format!(
            "{label} must not exceed {MAX_UNIT_PRICE}"
        )));
    }
    Ok(())
}

/// Reject quantities above [`MAX_QUANTITY`].
pub(crate) fn check_quantity(label: &str, quantity: u32) -> Result<()> {
    if quantity > MAX_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "{label} must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

/// Trim a title or SKU and reject it when longer than [`MAX_ITEM_TEXT_LENGTH`].
pub(crate) fn item_text(label: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.chars().count() > MAX_ITEM_TEXT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{label} must be at most {MAX_ITEM_TEXT_LENGTH} characters"
        )));
    }
    Ok(value.to_string())
}

// =============================================================================
// Routers
// =============================================================================

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(catalog::categories))
        .route("/api/categories/{slug}", get(catalog::category))
        .route(
            "/api/categories/{slug}/children",
            get(catalog::category_children),
        )
        .route("/api/products", get(catalog::products))
        .route("/api/products/{slug}", get(catalog::product))
        .route("/api/product-attributes", get(catalog::product_attributes))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/sections", get(blog::sections))
        .route("/articles", get(blog::articles))
        .route("/articles/{slug}", get(blog::article))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{id}",
            patch(cart::update_quantity).delete(cart::remove),
        )
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::show))
        .route("/items", post(favorites::add))
        .route("/items/{id}", axum::routing::delete(favorites::remove))
}

/// Create the form routes router (rate limited per client IP).
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/lead", post(forms::lead))
        .route("/order", post(forms::order))
        .route("/test-request", post(forms::test_request))
        .layer(forms_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(catalog_routes())
        .nest("/api/blog", blog_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/favorites", favorites_routes())
        .nest("/api/forms", form_routes())
        .route("/api/currency-rate", get(lookups::currency_rate))
        .route("/api/geo/reverse", get(lookups::reverse_geocode))
        .route("/api/cities", get(lookups::cities))
        .route("/feed.yml", get(seo::feed))
        .route("/sitemap.xml", get(seo::sitemap))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstreams.
async fn health() -> &'static str {
    "ok"
}
