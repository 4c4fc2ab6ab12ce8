//! Product feed and sitemap.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use promtech_integration_tests::{TestContext, categories, product};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_feed_lists_whole_catalog() {
    let ctx = TestContext::new().await;
    ctx.mock_collection("categories", categories()).await;
    ctx.mock_collection(
        "products",
        json!([
            product(10, "press-10", 3, json!([])),
            product(11, "drill-11", 4, json!([]))
        ]),
    )
    .await;

    let response = ctx.get("/feed.yml").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("application/xml; charset=utf-8")
    );
    assert_eq!(response.header("cache-control"), Some("public, max-age=3600"));

    let xml = response.text();
    assert!(xml.contains("<name>Промтех</name>"));
    assert!(xml.contains("<category id=\"1\">Станки</category>"));
    assert!(xml.contains("<category id=\"3\" parentId=\"2\">Гидравлические прессы</category>"));
    assert!(xml.contains("<offer id=\"10\" available=\"true\">"));
    assert!(xml.contains("<offer id=\"11\" available=\"true\">"));
    assert!(xml.contains("<url>https://promtech.test/product/press-10</url>"));
    assert!(xml.contains("<price>150000</price>"));
}

#[tokio::test]
async fn test_feed_limited_to_configured_subtree() {
    let ctx = TestContext::with_config(|config| {
        config.shop.feed_root_category = Some("presses".to_string());
    })
    .await;
    ctx.mock_collection("categories", categories()).await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("filters[category][id][$in][0]", "2"))
        .and(query_param("filters[category][id][$in][1]", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [product(10, "press-10", 3, json!([]))],
            "meta": { "pagination": { "page": 1, "pageSize": 100, "pageCount": 1, "total": 1 } }
        })))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.get("/feed.yml").await;

    assert_eq!(response.status, StatusCode::OK);
    let xml = response.text();
    assert!(xml.contains("<category id=\"2\">Прессы</category>"));
    assert!(!xml.contains("<category id=\"1\">"));
    assert!(!xml.contains("<category id=\"4\">"));
    assert!(xml.contains("<offer id=\"10\""));
}

#[tokio::test]
async fn test_feed_fails_without_catalog() {
    let ctx = TestContext::new().await;
    ctx.mock_collection_error("categories", 500).await;

    let response = ctx.get("/feed.yml").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_sitemap_lists_every_source() {
    let ctx = TestContext::new().await;
    ctx.mock_collection("categories", categories()).await;
    ctx.mock_collection("products", json!([product(10, "press-10", 3, json!([]))]))
        .await;
    ctx.mock_collection(
        "services",
        json!([{ "id": 1, "title": "Пусконаладка", "slug": "commissioning" }]),
    )
    .await;
    ctx.mock_collection(
        "blog-sections",
        json!([{ "id": 1, "title": "Новости", "slug": "news" }]),
    )
    .await;
    ctx.mock_collection(
        "articles",
        json!([{
            "id": 5,
            "title": "Как выбрать пресс",
            "slug": "press-guide",
            "section": { "id": 1, "title": "Новости", "slug": "news" },
            "publishedAt": "2026-01-20T08:00:00.000Z"
        }]),
    )
    .await;

    let response = ctx.get("/sitemap.xml").await;

    assert_eq!(response.status, StatusCode::OK);
    let xml = response.text();
    assert!(xml.contains("<loc>https://promtech.test/</loc>"));
    assert!(xml.contains("<loc>https://promtech.test/services/commissioning</loc>"));
    assert!(xml.contains("<loc>https://promtech.test/catalog/machines/presses/hydraulic</loc>"));
    assert!(xml.contains("<loc>https://promtech.test/product/press-10</loc>"));
    assert!(xml.contains("<lastmod>2026-02-10</lastmod>"));
    assert!(xml.contains("<loc>https://promtech.test/blog/news/press-guide</loc>"));
    assert!(xml.contains("<lastmod>2026-01-20</lastmod>"));
}

#[tokio::test]
async fn test_sitemap_skips_failing_sources() {
    let ctx = TestContext::new().await;
    ctx.mock_collection("categories", categories()).await;
    ctx.mock_collection_error("products", 500).await;
    ctx.mock_collection_error("services", 404).await;
    ctx.mock_collection("blog-sections", json!([])).await;
    ctx.mock_collection("articles", json!([])).await;

    let response = ctx.get("/sitemap.xml").await;

    assert_eq!(response.status, StatusCode::OK);
    let xml = response.text();
    assert!(xml.contains("<loc>https://promtech.test/catalog/tools</loc>"));
    assert!(!xml.contains("/product/"));
    assert!(!xml.contains("/services/"));
}
