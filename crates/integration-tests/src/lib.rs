//! Integration tests for the Promtech storefront.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`.
//! Every upstream (CMS, bot API, exchange rates, geocoder) is a single
//! `wiremock` server, so no network or running services are needed.
//!
//! ```bash
//! cargo test -p promtech-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Categories, products and attribute facets
//! - `blog` - Sections, articles and related content
//! - `session_stores` - Cart and favorites across requests
//! - `forms` - Lead, order and test-request relay
//! - `lookups` - Currency rate, reverse geocoding and city search
//! - `seo` - Product feed and sitemap

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use promtech_storefront::config::{
    CacheConfig, CmsConfig, ShopConfig, StorefrontConfig, TelegramConfig, UpstreamConfig,
};
use promtech_storefront::services::{City, CityDirectory};
use promtech_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bot token used by the test configuration.
pub const BOT_TOKEN: &str = "test-bot-token";

/// Path the bot API is called on.
pub fn bot_path() -> String {
    format!("/bot{BOT_TOKEN}/sendMessage")
}

/// Storefront configuration pointing every upstream at `upstream`.
pub fn test_config(upstream: &str, cache_dir: Option<PathBuf>) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "https://promtech.test".to_string(),
        cms: CmsConfig {
            url: upstream.to_string(),
            api_token: SecretString::from("test-cms-token"),
            media_url: upstream.to_string(),
        },
        telegram: TelegramConfig {
            api_url: upstream.to_string(),
            bot_token: SecretString::from(BOT_TOKEN),
            chat_id: "-1001234567890".to_string(),
        },
        upstreams: UpstreamConfig {
            currency_url: format!("{upstream}/daily_json.js"),
            geocoder_url: upstream.to_string(),
        },
        cache: CacheConfig {
            dir: cache_dir,
            capacity: 100,
            catalog_ttl: Duration::from_secs(300),
            version: "it".to_string(),
        },
        shop: ShopConfig {
            name: "Промтех".to_string(),
            company: "ООО Промтех".to_string(),
            feed_root_category: None,
        },
        cities_path: PathBuf::from("data/cities.json"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie set by this response, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("promtech_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// Router plus its mocked upstream.
pub struct TestContext {
    pub upstream: MockServer,
    pub app: Router,
    /// Keeps the durable cache directory alive for the test's duration.
    pub cache_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build a context after adjusting the test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let upstream = MockServer::start().await;
        let cache_dir = tempfile::tempdir().unwrap();

        let mut config = test_config(&upstream.uri(), Some(cache_dir.path().to_path_buf()));
        adjust(&mut config);

        let cities = CityDirectory::new(
            [
                ("Москва", "Москва"),
                ("Мурманск", "Мурманская область"),
                ("Орёл", "Орловская область"),
                ("Казань", "Республика Татарстан"),
                ("Королёв", "Московская область"),
            ]
            .into_iter()
            .map(|(name, region)| City {
                name: name.to_string(),
                region: Some(region.to_string()),
            })
            .collect(),
        );

        let state = AppState::new(config, cities).unwrap();
        let app = promtech_storefront::app(state);

        Self {
            upstream,
            app,
            cache_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Send a JSON body. Form routes key their rate limit on the client IP,
    /// so every request carries a forwarded address.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: &Value,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::delete(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    // =========================================================================
    // Upstream fixtures
    // =========================================================================

    /// Serve `data` as a single-page CMS collection.
    pub async fn mock_collection(&self, collection: &str, data: Value) {
        let total = data.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path(format!("/api/{collection}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(data, total)))
            .mount(&self.upstream)
            .await;
    }

    /// Serve `data` for a CMS query filtered by slug.
    pub async fn mock_by_slug(&self, collection: &str, slug: &str, data: Value) {
        let total = data.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path(format!("/api/{collection}")))
            .and(query_param("filters[slug][$eq]", slug))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(data, total)))
            .with_priority(1)
            .mount(&self.upstream)
            .await;
    }

    /// Answer every request for a collection with an error.
    pub async fn mock_collection_error(&self, collection: &str, status: u16) {
        Mock::given(path(format!("/api/{collection}")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "data": null,
                "error": { "status": status, "name": "InternalServerError", "message": "boom" }
            })))
            .mount(&self.upstream)
            .await;
    }

    /// Accept record creation in `collection`, answering with `id`.
    pub async fn mock_create(&self, collection: &str, id: i64) {
        Mock::given(method("POST"))
            .and(path(format!("/api/{collection}")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": id } })))
            .mount(&self.upstream)
            .await;
    }

    pub async fn mock_bot(&self, ok: bool) {
        let response = if ok {
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": { "message_id": 1 } }))
        } else {
            ResponseTemplate::new(403)
                .set_body_json(json!({ "ok": false, "description": "Forbidden: bot was kicked" }))
        };
        Mock::given(method("POST"))
            .and(path(bot_path()))
            .respond_with(response)
            .mount(&self.upstream)
            .await;
    }
}

fn list_body(data: Value, total: usize) -> Value {
    json!({
        "data": data,
        "meta": {
            "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": total }
        }
    })
}

/// Category fixture: machines > presses > hydraulic, plus tools.
pub fn categories() -> Value {
    json!([
        { "id": 1, "name": "Станки", "slug": "machines", "parent": null, "children": [{ "id": 2 }] },
        { "id": 2, "name": "Прессы", "slug": "presses", "parent": { "id": 1 }, "children": [{ "id": 3 }] },
        { "id": 3, "name": "Гидравлические прессы", "slug": "hydraulic", "parent": { "id": 2 } },
        { "id": 4, "name": "Инструмент", "slug": "tools", "parent": null }
    ])
}

/// Product fixture filed under `category_id`.
pub fn product(id: i64, slug: &str, category_id: i64, attributes: Value) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "name": format!("Пресс {id}"),
        "sku": format!("PR-{id}"),
        "price": 150_000,
        "oldPrice": 170_000,
        "isPart": false,
        "inStock": true,
        "description": "Гидравлический пресс",
        "category": { "id": category_id, "name": "Прессы", "slug": "presses" },
        "images": [{ "url": format!("/uploads/{slug}.jpg"), "alternativeText": null }],
        "attributes": attributes,
        "updatedAt": "2026-02-10T12:00:00.000Z"
    })
}
