//! Headless CMS REST client.
//!
//! # Architecture
//!
//! - The CMS is the source of truth for the catalog, blog and submissions
//! - Responses are deserialised into strict per-collection wire types
//!   ([`raw`]) and converted into domain types ([`types`])
//! - The category snapshot and single products are cached in memory via
//!   `moka` (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use promtech_storefront::cms::{CmsClient, ProductFilter};
//!
//! let cms = CmsClient::new(&config.cms)?;
//! let tree = cms.category_tree().await?;
//! let page = cms.products(&ProductFilter::default(), 1, 24).await?;
//! ```

mod conversions;
mod query;
pub mod raw;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use promtech_core::SubmissionId;
use promtech_core::catalog::{CategoryTree, Pagination};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CmsConfig;

pub use conversions::media_url;
pub use query::{CmsQuery, FilterOp, ProductFilter, ProductSort};
pub use types::*;

use conversions::{
    convert_article, convert_category, convert_pagination, convert_product, convert_section,
    convert_service,
};
use raw::{
    Created, CreateRequest, ErrorResponse, ListResponse, RawArticle, RawBlogSection, RawCategory,
    RawProduct, RawService,
};

/// Page size used when walking a whole collection.
const WALK_PAGE_SIZE: u32 = Pagination::MAX_PAGE_SIZE;

/// Upper bound on pages fetched when walking a whole collection.
const MAX_WALK_PAGES: u32 = 50;

/// Errors that can occur when talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CMS returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client could not be configured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Product(String),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Product(Box<Product>),
}

// =============================================================================
// CmsClient
// =============================================================================

/// Client for the CMS REST API.
#[derive(Clone)]
pub struct CmsClient {
    inner: Arc<CmsClientInner>,
}

struct CmsClientInner {
    client: reqwest::Client,
    api_url: String,
    media_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CmsClient {
    /// Create a new CMS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.api_token.expose_secret()
        ))
        .map_err(|e| CmsError::Config(format!("Invalid API token format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(CmsClientInner {
                client,
                api_url: format!("{}/api", config.url.trim_end_matches('/')),
                media_url: config.media_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL that relative media paths resolve against.
    #[must_use]
    pub fn media_base(&self) -> &str {
        &self.inner.media_url
    }

    /// Read a response body, turning non-success statuses into `CmsError::Api`.
    async fn read_body(response: reqwest::Response) -> Result<String, CmsError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "CMS returned non-success status"
            );
            let message = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |e| match e.error.name {
                    Some(name) => format!("{name}: {}", e.error.message),
                    None => e.error.message,
                },
            );
            return Err(CmsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, CmsError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse CMS response"
            );
            CmsError::Parse(e)
        })
    }

    /// `GET /api/{collection}?{query}`
    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &CmsQuery,
    ) -> Result<ListResponse<T>, CmsError> {
        let url = format!(
            "{}/{collection}?{}",
            self.inner.api_url,
            query.to_query_string()
        );
        let response = self.inner.client.get(&url).send().await?;
        let body = Self::read_body(response).await?;
        Self::parse(&body)
    }

    /// `POST /api/{collection}` with `{ data }`.
    async fn create<T: Serialize + Sync>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<SubmissionId, CmsError> {
        let url = format!("{}/{collection}", self.inner.api_url);
        let response = self
            .inner
            .client
            .post(&url)
            .json(&CreateRequest { data: record })
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let created: raw::SingleResponse<Created> = Self::parse(&body)?;
        Ok(SubmissionId::new(created.data.id))
    }

    /// Walk every page of a collection.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &CmsQuery,
    ) -> Result<Vec<T>, CmsError> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let response: ListResponse<T> = self
                .fetch(collection, &query.clone().page(page, WALK_PAGE_SIZE))
                .await?;
            let received = response.data.len();
            items.extend(response.data);

            let page_count = response.meta.pagination.map_or(page, |p| p.page_count);
            if page >= page_count || received == 0 {
                break;
            }
            if page >= MAX_WALK_PAGES {
                tracing::warn!(collection, page_count, "Stopped walking collection at page limit");
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Get one page of categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(
        &self,
        parent: ParentFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Category>, CmsError> {
        let mut query = category_query().page(page, page_size);
        query = match &parent {
            ParentFilter::Any => query,
            ParentFilter::Root => query.filter(&["parent", "id"], FilterOp::Null, true),
            ParentFilter::Slug(slug) => query.filter(&["parent", "slug"], FilterOp::Eq, slug),
        };

        let response: ListResponse<RawCategory> = self.fetch("categories", &query).await?;
        let pagination = convert_pagination(response.meta.pagination, response.data.len());
        let base = self.media_base();
        Ok(Page {
            items: response
                .data
                .into_iter()
                .map(|raw| convert_category(base, raw))
                .collect(),
            pagination,
        })
    }

    /// Get every category (cached snapshot).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn all_categories(&self) -> Result<Arc<Vec<Category>>, CmsError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let raw: Vec<RawCategory> = self.fetch_all("categories", &category_query()).await?;
        let base = self.media_base();
        let categories: Arc<Vec<Category>> = Arc::new(
            raw.into_iter()
                .map(|raw| convert_category(base, raw))
                .collect(),
        );

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Build the category tree from the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn category_tree(&self) -> Result<CategoryTree, CmsError> {
        let categories = self.all_categories().await?;
        Ok(CategoryTree::new(categories.iter().map(Category::to_node)))
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `CmsError::NotFound` if no category has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn category_by_slug(&self, slug: &str) -> Result<Category, CmsError> {
        let query = category_query()
            .filter(&["slug"], FilterOp::Eq, slug)
            .page(1, 1);
        let response: ListResponse<RawCategory> = self.fetch("categories", &query).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|raw| convert_category(self.media_base(), raw))
            .ok_or_else(|| CmsError::NotFound("Category".to_string()))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Get one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, filter))]
    pub async fn products(
        &self,
        filter: &ProductFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Product>, CmsError> {
        let query = filter.apply(product_query()).page(page, page_size);
        let response: ListResponse<RawProduct> = self.fetch("products", &query).await?;
        let pagination = convert_pagination(response.meta.pagination, response.data.len());
        let base = self.media_base();
        Ok(Page {
            items: response
                .data
                .into_iter()
                .map(|raw| convert_product(base, raw))
                .collect(),
            pagination,
        })
    }

    /// Get every product matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self, filter))]
    pub async fn all_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CmsError> {
        let raw: Vec<RawProduct> = self
            .fetch_all("products", &filter.apply(product_query()))
            .await?;
        let base = self.media_base();
        Ok(raw
            .into_iter()
            .map(|raw| convert_product(base, raw))
            .collect())
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `CmsError::NotFound` if no product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, CmsError> {
        let cache_key = CacheKey::Product(slug.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let query = product_query()
            .filter(&["slug"], FilterOp::Eq, slug)
            .page(1, 1);
        let response: ListResponse<RawProduct> = self.fetch("products", &query).await?;
        let product = response
            .data
            .into_iter()
            .next()
            .map(|raw| convert_product(self.media_base(), raw))
            .ok_or_else(|| CmsError::NotFound("Product".to_string()))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Blog and services
    // =========================================================================

    /// Get every blog section.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn blog_sections(&self) -> Result<Vec<BlogSection>, CmsError> {
        let raw: Vec<RawBlogSection> = self
            .fetch_all("blog-sections", &CmsQuery::new().sort("title", false))
            .await?;
        Ok(raw.into_iter().map(convert_section).collect())
    }

    /// Get one page of articles, newest first, optionally within a section.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn articles(
        &self,
        section: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Article>, CmsError> {
        let mut query = article_query().page(page, page_size);
        if let Some(section) = section {
            query = query.filter(&["section", "slug"], FilterOp::Eq, section);
        }

        let response: ListResponse<RawArticle> = self.fetch("articles", &query).await?;
        let pagination = convert_pagination(response.meta.pagination, response.data.len());
        let base = self.media_base();
        Ok(Page {
            items: response
                .data
                .into_iter()
                .map(|raw| convert_article(base, raw))
                .collect(),
            pagination,
        })
    }

    /// Get every article (sitemap).
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn all_articles(&self) -> Result<Vec<Article>, CmsError> {
        let raw: Vec<RawArticle> = self.fetch_all("articles", &article_query()).await?;
        let base = self.media_base();
        Ok(raw
            .into_iter()
            .map(|raw| convert_article(base, raw))
            .collect())
    }

    /// Get an article by its slug.
    ///
    /// # Errors
    ///
    /// Returns `CmsError::NotFound` if no article has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn article_by_slug(&self, slug: &str) -> Result<Article, CmsError> {
        let query = article_query()
            .filter(&["slug"], FilterOp::Eq, slug)
            .page(1, 1);
        let response: ListResponse<RawArticle> = self.fetch("articles", &query).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|raw| convert_article(self.media_base(), raw))
            .ok_or_else(|| CmsError::NotFound("Article".to_string()))
    }

    /// Get up to `limit` other articles from the same section.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, article), fields(slug = %article.slug))]
    pub async fn related_articles(
        &self,
        article: &Article,
        limit: u32,
    ) -> Result<Vec<Article>, CmsError> {
        let Some(section) = &article.section else {
            return Ok(Vec::new());
        };

        let query = article_query()
            .filter(&["section", "slug"], FilterOp::Eq, &section.slug)
            .filter(&["id"], FilterOp::Ne, article.id)
            .page(1, limit);
        let response: ListResponse<RawArticle> = self.fetch("articles", &query).await?;
        let base = self.media_base();
        Ok(response
            .data
            .into_iter()
            .map(|raw| convert_article(base, raw))
            .collect())
    }

    /// Get every service page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn services(&self) -> Result<Vec<Service>, CmsError> {
        let raw: Vec<RawService> = self
            .fetch_all("services", &CmsQuery::new().sort("title", false))
            .await?;
        Ok(raw.into_iter().map(convert_service).collect())
    }

    // =========================================================================
    // Submissions
    // =========================================================================

    /// Store a lead or test request.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS rejects the record.
    #[instrument(skip(self, lead), fields(kind = ?lead.kind))]
    pub async fn create_lead(&self, lead: &NewLead) -> Result<SubmissionId, CmsError> {
        self.create("leads", lead).await
    }

    /// Store an order draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS rejects the record.
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<SubmissionId, CmsError> {
        self.create("orders", order).await
    }
}

/// Parent constraint for category listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFilter {
    Any,
    /// Top-level categories only.
    Root,
    /// Direct children of the category with this slug.
    Slug(String),
}

fn category_query() -> CmsQuery {
    CmsQuery::new()
        .populate("parent")
        .populate("children")
        .populate("image")
        .sort("name", false)
}

fn product_query() -> CmsQuery {
    CmsQuery::new()
        .populate("category")
        .populate("images")
        .populate("attributes")
}

fn article_query() -> CmsQuery {
    CmsQuery::new()
        .populate("cover")
        .populate("section")
        .sort("publishedAt", true)
}
