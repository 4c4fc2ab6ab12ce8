//! Wire types for CMS REST responses and submissions.
//!
//! Each collection has its own strict shape. Unknown fields are ignored,
//! missing required fields fail deserialisation at the boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelopes
// =============================================================================

/// `{ data: [...], meta: { pagination } }`
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: ResponseMeta,
}

/// `{ data: {...} }`
#[derive(Debug, Deserialize)]
pub struct SingleResponse<T> {
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseMeta {
    pub pagination: Option<RawPagination>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

/// `{ error: { status, name, message } }`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: RawError,
}

#[derive(Debug, Deserialize)]
pub struct RawError {
    #[serde(default)]
    pub name: Option<String>,
    pub message: String,
}

/// Body for record creation: `{ data: {...} }`
#[derive(Debug, Serialize)]
pub struct CreateRequest<'a, T> {
    pub data: &'a T,
}

#[derive(Debug, Deserialize)]
pub struct Created {
    pub id: i64,
}

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    pub url: String,
    #[serde(default)]
    pub alternative_text: Option<String>,
}

/// A populated relation; only the identifying fields are read.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRelation {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategoryRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<RawMedia>,
    #[serde(default)]
    pub parent: Option<RawRelation>,
    #[serde(default)]
    pub children: Vec<RawRelation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub is_part: bool,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<RawCategoryRef>,
    #[serde(default)]
    pub images: Vec<RawMedia>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// Characteristic components, discriminated by the CMS component name.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__component")]
pub enum RawAttribute {
    #[serde(rename = "attributes.string")]
    String {
        name: String,
        #[serde(default)]
        unit: Option<String>,
        value: String,
    },
    #[serde(rename = "attributes.number")]
    Number {
        name: String,
        #[serde(default)]
        unit: Option<String>,
        value: f64,
    },
    #[serde(rename = "attributes.boolean")]
    Boolean { name: String, value: bool },
    #[serde(rename = "attributes.range")]
    Range {
        name: String,
        #[serde(default)]
        unit: Option<String>,
        min: f64,
        max: f64,
    },
}

// =============================================================================
// Content
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawBlogSection {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub cover: Option<RawMedia>,
    #[serde(default)]
    pub section: Option<RawBlogSection>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawService {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_with_attribute_components() {
        let raw: RawProduct = serde_json::from_value(json!({
            "id": 7,
            "slug": "press-pg-100",
            "name": "Пресс ПГ-100",
            "price": 1_250_000,
            "oldPrice": "1300000.00",
            "isPart": false,
            "category": { "id": 2, "name": "Прессы", "slug": "presses" },
            "images": [{ "url": "/uploads/press.jpg", "alternativeText": null }],
            "attributes": [
                { "__component": "attributes.number", "name": "Усилие", "unit": "т", "value": 100 },
                { "__component": "attributes.boolean", "name": "ЧПУ", "value": true },
                { "__component": "attributes.range", "name": "Ход", "unit": "мм", "min": 10, "max": 250 }
            ]
        }))
        .unwrap();

        assert_eq!(raw.price, Decimal::new(1_250_000, 0));
        assert_eq!(raw.old_price, Some(Decimal::new(1_300_000, 0)));
        assert!(raw.in_stock);
        assert_eq!(raw.attributes.len(), 3);
        assert!(matches!(
            raw.attributes.first(),
            Some(RawAttribute::Number { value, .. }) if (*value - 100.0).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn test_unknown_component_is_rejected() {
        let result = serde_json::from_value::<RawAttribute>(json!({
            "__component": "attributes.color",
            "name": "Цвет",
            "value": "red"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_response_without_meta() {
        let response: ListResponse<RawRelation> =
            serde_json::from_value(json!({ "data": [{ "id": 1 }, { "id": 2 }] })).unwrap();
        assert_eq!(response.data.len(), 2);
        assert!(response.meta.pagination.is_none());
    }
}
