//! Blog endpoints against a mocked CMS.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use promtech_integration_tests::TestContext;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn section() -> Value {
    json!({ "id": 1, "title": "Новости", "slug": "news" })
}

fn article(id: i64, slug: &str, content: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Статья {id}"),
        "slug": slug,
        "excerpt": "Кратко",
        "content": content,
        "section": section(),
        "publishedAt": "2026-01-20T08:00:00.000Z"
    })
}

#[tokio::test]
async fn test_sections() {
    let ctx = TestContext::new().await;
    ctx.mock_collection("blog-sections", json!([section()])).await;

    let response = ctx.get("/api/blog/sections").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"][0]["slug"], "news");
}

#[tokio::test]
async fn test_articles_filtered_by_section() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("filters[section][slug][$eq]", "news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [article(1, "first", "")],
            "meta": { "pagination": { "page": 1, "pageSize": 24, "pageCount": 1, "total": 1 } }
        })))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.get("/api/blog/articles?section=news").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["data"][0]["slug"], "first");
    assert_eq!(body["meta"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_article_renders_markdown_with_related() {
    let ctx = TestContext::new().await;
    ctx.mock_by_slug(
        "articles",
        "press-guide",
        json!([article(5, "press-guide", "## Выбор пресса\n\n<script>alert(1)</script>")]),
    )
    .await;
    ctx.mock_collection("articles", json!([article(6, "lathe-guide", "")]))
        .await;

    let response = ctx.get("/api/blog/articles/press-guide").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    let data = &body["data"];
    assert_eq!(data["slug"], "press-guide");

    let html = data["html"].as_str().unwrap();
    assert!(html.contains("Выбор пресса"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains("<script>"));

    assert_eq!(data["related"][0]["slug"], "lathe-guide");
}

#[tokio::test]
async fn test_article_served_when_related_lookup_fails() {
    let ctx = TestContext::new().await;
    ctx.mock_by_slug("articles", "press-guide", json!([article(5, "press-guide", "Текст")]))
        .await;
    Mock::given(path("/api/articles"))
        .and(query_param("filters[id][$ne]", "5"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.get("/api/blog/articles/press-guide").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["data"]["related"], json!([]));
}

#[tokio::test]
async fn test_missing_article_is_not_found() {
    let ctx = TestContext::new().await;
    ctx.mock_collection("articles", json!([])).await;

    let response = ctx.get("/api/blog/articles/nope").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"]["message"], "Article not found");
}
