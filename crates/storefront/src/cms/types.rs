//! Domain types served by the storefront API.
//!
//! Built from the CMS wire types in [`super::raw`] after validation; media
//! URLs are already absolute.

use chrono::{DateTime, Utc};
use promtech_core::catalog::{CategoryNode, Pagination, ProductAttribute};
use promtech_core::{ArticleId, CategoryId, ProductId, SectionId, ServiceId};
use rust_decimal::Decimal;
use serde::Serialize;

/// An image with an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<Image>,
    pub parent_id: Option<CategoryId>,
    pub children: Vec<CategoryId>,
}

impl Category {
    /// The tree node for this category.
    #[must_use]
    pub fn to_node(&self) -> CategoryNode {
        CategoryNode {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            parent_id: self.parent_id,
            children: self.children.clone(),
        }
    }
}

/// The category a product belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product or spare part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    /// Spare parts are listed separately from primary equipment.
    pub is_part: bool,
    pub in_stock: bool,
    pub description: Option<String>,
    pub category: Option<CategoryRef>,
    pub images: Vec<Image>,
    pub attributes: Vec<ProductAttribute>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image, used as the thumbnail and feed picture.
    #[must_use]
    pub fn main_image(&self) -> Option<&Image> {
        self.images.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogSection {
    pub id: SectionId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

/// A blog article. `content` is markdown as stored in the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover: Option<Image>,
    pub section: Option<BlogSection>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A service offering (installation, repair, testing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

// =============================================================================
// Submissions
// =============================================================================

/// Lead kinds accepted by the lead collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadKind {
    /// Callback or price request.
    Lead,
    /// Request to test equipment on the customer's material.
    TestRequest,
}

/// A new lead record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLead {
    pub kind: LeadKind,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub comment: Option<String>,
    /// Product the lead is about, if sent from a product page.
    pub product: Option<String>,
    pub city: Option<String>,
    /// Page the form was submitted from.
    pub source: Option<String>,
}

/// One order line as stored in the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub sku: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// A new order draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub comment: Option<String>,
    pub company: Option<String>,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
}
