//! Currency rates, reverse geocoding and city search.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use promtech_integration_tests::TestContext;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn number(value: &Value) -> f64 {
    value
        .as_str()
        .map_or_else(|| value.as_f64().unwrap(), |s| s.parse().unwrap())
}

async fn mock_daily_rates(ctx: &TestContext, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/daily_json.js"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Date": "2026-03-14T11:30:00+03:00",
            "Valute": {
                "USD": { "CharCode": "USD", "Nominal": 1, "Value": 92.5 },
                "CNY": { "CharCode": "CNY", "Nominal": 10, "Value": 127.4 }
            }
        })))
        .expect(expected_calls)
        .mount(&ctx.upstream)
        .await;
}

#[tokio::test]
async fn test_currency_rate_defaults_to_usd_and_is_cached() {
    let ctx = TestContext::new().await;
    mock_daily_rates(&ctx, 1).await;

    let first = ctx.get("/api/currency-rate").await;
    let second = ctx.get("/api/currency-rate?code=usd").await;

    assert_eq!(first.status, StatusCode::OK);
    let body = first.json();
    assert_eq!(body["data"]["code"], "USD");
    assert!((number(&body["data"]["rate"]) - 92.5).abs() < 1e-9);
    assert_eq!(body["data"]["date"], "2026-03-14T11:30:00+03:00");
    assert_eq!(second.json(), body);
}

#[tokio::test]
async fn test_currency_rate_divides_by_nominal() {
    let ctx = TestContext::new().await;
    mock_daily_rates(&ctx, 1).await;

    let response = ctx.get("/api/currency-rate?code=CNY").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!((number(&response.json()["data"]["rate"]) - 12.74).abs() < 1e-9);
}

#[tokio::test]
async fn test_rouble_rate_needs_no_upstream() {
    let ctx = TestContext::new().await;
    mock_daily_rates(&ctx, 0).await;

    let response = ctx.get("/api/currency-rate?code=RUB").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!((number(&response.json()["data"]["rate"]) - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unknown_currency_is_rejected() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/currency-rate?code=XYZ").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_currency_upstream_failure() {
    let ctx = TestContext::new().await;
    Mock::given(path("/daily_json.js"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&ctx.upstream)
        .await;

    let response = ctx.get("/api/currency-rate?code=USD").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"]["message"], "External service error");
}

#[tokio::test]
async fn test_reverse_geocode() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("lat", "55.75"))
        .and(query_param("lon", "37.62"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Москва, Россия",
            "address": { "city": "Москва", "state": "Москва", "country": "Россия" }
        })))
        .expect(1)
        .mount(&ctx.upstream)
        .await;

    let response = ctx.get("/api/geo/reverse?lat=55.75&lon=37.62").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["data"],
        json!({ "city": "Москва", "region": "Москва" })
    );
}

#[tokio::test]
async fn test_reverse_geocode_validates_coordinates() {
    let ctx = TestContext::new().await;

    let out_of_range = ctx.get("/api/geo/reverse?lat=95&lon=37.62").await;
    assert_eq!(out_of_range.status, StatusCode::BAD_REQUEST);

    let missing = ctx.get("/api/geo/reverse?lat=55.75").await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_city_search_folds_yo_and_case() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/cities?q=%D0%BE%D1%80%D0%B5%D0%BB").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["data"], json!([{ "name": "Орёл", "region": "Орловская область" }]));
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["meta"]["hasMore"], false);
}

#[tokio::test]
async fn test_city_list_is_sorted_and_paged() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/cities?page=1&page_size=2").await;

    let body = response.json();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Казань", "Королёв"]);
    assert_eq!(body["meta"]["total"], 5);
    assert_eq!(body["meta"]["hasMore"], true);
}

#[tokio::test]
async fn test_city_paging_must_be_numeric() {
    let ctx = TestContext::new().await;

    let response = ctx.get("/api/cities?page=two").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"]["name"], "ValidationError");
}
