//! Catalog route handlers.
//!
//! Categories and products are proxied from the CMS. Category-scoped
//! queries resolve the whole subtree through [`CategoryTree`] first, so a
//! product filed under a sub-sub-category still shows up on its top-level
//! category page.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use promtech_core::CategoryId;
use promtech_core::catalog::{AttributeFacet, CategoryTree, Pagination, aggregate_facets};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::cms::{Category, ParentFilter, Product, ProductFilter, ProductSort};
use crate::error::{AppError, Result};
use crate::routes::{DataResponse, ListMeta, data, data_with_meta};
use crate::state::AppState;

// =============================================================================
// Query parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// `root` for top-level categories, or a parent slug.
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Category slug; the whole subtree is included.
    pub category: Option<String>,
    pub part: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
}

#[derive(Debug, Deserialize)]
pub struct AttributesQuery {
    pub category: Option<String>,
    pub part: Option<bool>,
}

// =============================================================================
// Helpers
// =============================================================================

fn parent_filter(parent: Option<&str>) -> ParentFilter {
    match parent.map(str::trim).filter(|p| !p.is_empty()) {
        None => ParentFilter::Any,
        Some("root") => ParentFilter::Root,
        Some(slug) => ParentFilter::Slug(slug.to_string()),
    }
}

/// IDs of the category with `slug` and everything below it.
fn subtree_ids(tree: &CategoryTree, slug: &str) -> Result<Vec<CategoryId>> {
    let root = tree
        .find_by_slug(slug)
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

    let mut ids = vec![root.id];
    ids.extend(tree.descendant_ids(root.id));
    Ok(ids)
}

/// Resolve an optional category slug into a subtree filter.
async fn category_scope(state: &AppState, slug: Option<&str>) -> Result<Option<Vec<CategoryId>>> {
    let Some(slug) = slug.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let tree = state.cms().category_tree().await?;
    subtree_ids(&tree, slug).map(Some)
}

fn attributes_cache_key(category: Option<&str>, part: Option<bool>) -> String {
    let part = match part {
        Some(true) => "parts",
        Some(false) => "equipment",
        None => "any",
    };
    format!(
        "product-attributes:{}:{part}",
        category.map_or("all", str::trim)
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// List categories, optionally under a parent.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    query: std::result::Result<Query<CategoriesQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<Category>, ListMeta>>> {
    let Query(query) = query?;
    let parent = parent_filter(query.parent.as_deref());
    let (page, page_size) = Pagination::clamp_params(query.page, query.page_size);
    let page = state.cms().categories(parent, page, page_size).await?;

    Ok(data_with_meta(
        page.items,
        ListMeta {
            pagination: page.pagination,
        },
    ))
}

/// Show a single category.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<DataResponse<Category>>> {
    let Path(slug) = path?;
    let category = state.cms().category_by_slug(&slug).await?;
    Ok(data(category))
}

/// Every category below `slug` (the category itself excluded), each with
/// its parent reference.
#[instrument(skip(state))]
pub async fn category_children(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(slug) = path?;
    let tree = state.cms().category_tree().await?;
    let root = tree
        .find_by_slug(&slug)
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

    let children: Vec<_> = tree
        .descendant_ids(root.id)
        .into_iter()
        .filter_map(|id| tree.get_flat(id))
        .collect();

    Ok(data(children).into_response())
}

/// List products with filters.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductsQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<Product>, ListMeta>>> {
    let Query(query) = query?;
    if let (Some(min), Some(max)) = (query.min_price, query.max_price)
        && min > max
    {
        return Err(AppError::BadRequest(
            "min_price must not exceed max_price".to_string(),
        ));
    }

    let filter = ProductFilter {
        category_ids: category_scope(&state, query.category.as_deref()).await?,
        is_part: query.part,
        min_price: query.min_price,
        max_price: query.max_price,
        search: query.q,
        sort: query.sort,
    };

    let (page, page_size) = Pagination::clamp_params(query.page, query.page_size);
    let page = state.cms().products(&filter, page, page_size).await?;

    Ok(data_with_meta(
        page.items,
        ListMeta {
            pagination: page.pagination,
        },
    ))
}

/// Show a single product.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<DataResponse<Product>>> {
    let Path(slug) = path?;
    let product = state.cms().product_by_slug(&slug).await?;
    Ok(data(product))
}

/// Filter facets across a category subtree.
///
/// Aggregating means walking every product in the subtree, so results are
/// kept in the two-tier cache for the configured catalog TTL.
#[instrument(skip(state))]
pub async fn product_attributes(
    State(state): State<AppState>,
    query: std::result::Result<Query<AttributesQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<AttributeFacet>>>> {
    let Query(query) = query?;
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let key = attributes_cache_key(category, query.part);
    let cache_config = &state.config().cache;
    let version = Some(cache_config.version.as_str());

    if let Some(facets) = state.cache().get::<Vec<AttributeFacet>>(&key, version).await {
        tracing::debug!(key, "Cache hit for product attributes");
        return Ok(data(facets));
    }

    let filter = ProductFilter {
        category_ids: category_scope(&state, category).await?,
        is_part: query.part,
        ..ProductFilter::default()
    };
    let products = state.cms().all_products(&filter).await?;
    let facets = aggregate_facets(products.iter().flat_map(|product| &product.attributes));

    state
        .cache()
        .set(&key, &facets, cache_config.catalog_ttl, version)
        .await;

    Ok(data(facets))
}
