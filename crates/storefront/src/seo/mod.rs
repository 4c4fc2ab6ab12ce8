//! Machine-readable SEO surfaces: the YML product feed and the sitemap.
//!
//! Both are rendered from askama XML templates (auto-escaped) and served with
//! an hourly public cache lifetime.

pub mod feed;
pub mod sitemap;

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

pub use feed::{feed_scope, render_feed};
pub use sitemap::{SitemapSources, render_sitemap};

/// `Cache-Control` for generated XML documents.
pub const XML_CACHE_CONTROL: &str = "public, max-age=3600";

/// Wrap a rendered XML document in a cacheable response.
#[must_use]
pub fn xml_response(body: String) -> Response {
    (
        [
            (CONTENT_TYPE, "application/xml; charset=utf-8"),
            (CACHE_CONTROL, XML_CACHE_CONTROL),
        ],
        body,
    )
        .into_response()
}
