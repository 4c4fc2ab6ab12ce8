//! Product feed and sitemap handlers.

use axum::{extract::State, response::Response};
use chrono::Utc;
use tracing::instrument;

use crate::cms::{CmsError, ProductFilter};
use crate::error::{AppError, Result};
use crate::seo::{SitemapSources, feed_scope, render_feed, render_sitemap, xml_response};
use crate::state::AppState;

/// Keep a sitemap source, or log why it is missing and use an empty one.
fn or_empty<T: Default>(source: &'static str, result: std::result::Result<T, CmsError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(source, error = %e, "Sitemap source unavailable");
        T::default()
    })
}

/// YML product feed.
#[instrument(skip(state))]
pub async fn feed(State(state): State<AppState>) -> Result<Response> {
    let config = state.config();
    let tree = state.cms().category_tree().await?;
    let scope = feed_scope(&tree, config.shop.feed_root_category.as_deref());

    let filter = ProductFilter {
        category_ids: scope.clone(),
        ..ProductFilter::default()
    };
    let products = state.cms().all_products(&filter).await?;

    let xml = render_feed(config, &tree, &products, scope.as_deref(), Utc::now())
        .map_err(|e| AppError::Internal(format!("feed template: {e}")))?;

    tracing::info!(offers = products.len(), "Rendered product feed");
    Ok(xml_response(xml))
}

/// Sitemap. Every CMS source is optional.
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> Result<Response> {
    let cms = state.cms();
    let all_products = ProductFilter::default();

    let (services, categories, products, sections, articles) = tokio::join!(
        cms.services(),
        cms.category_tree(),
        cms.all_products(&all_products),
        cms.blog_sections(),
        cms.all_articles(),
    );

    let sources = SitemapSources {
        services: or_empty("services", services),
        categories: or_empty("categories", categories),
        products: or_empty("products", products),
        sections: or_empty("blog sections", sections),
        articles: or_empty("articles", articles),
    };

    let xml = render_sitemap(state.config(), &sources)
        .map_err(|e| AppError::Internal(format!("sitemap template: {e}")))?;
    Ok(xml_response(xml))
}
