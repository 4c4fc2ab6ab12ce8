//! Conversions from CMS wire types to domain types.

use promtech_core::catalog::{AttributeValue, Pagination, ProductAttribute};
use promtech_core::{ArticleId, CategoryId, ProductId, SectionId, ServiceId};

use super::raw::{
    RawArticle, RawAttribute, RawBlogSection, RawCategory, RawMedia, RawPagination, RawProduct,
    RawService,
};
use super::types::{Article, BlogSection, Category, CategoryRef, Image, Product, Service};

/// Resolve a CMS media path against the media base URL.
///
/// Absolute URLs (including protocol-relative ones) pass through unchanged.
#[must_use]
pub fn media_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//") {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

fn convert_image(base: &str, media: RawMedia) -> Image {
    Image {
        url: media_url(base, &media.url),
        alt: media.alternative_text.filter(|alt| !alt.trim().is_empty()),
    }
}

pub fn convert_pagination(raw: Option<RawPagination>, fallback_len: usize) -> Pagination {
    raw.map_or_else(
        || {
            let total = fallback_len as u64;
            let size = u32::try_from(fallback_len).unwrap_or(u32::MAX).max(1);
            Pagination::from_total(1, size, total)
        },
        |p| Pagination {
            page: p.page,
            page_size: p.page_size,
            page_count: p.page_count,
            total: p.total,
        },
    )
}

pub fn convert_category(base: &str, raw: RawCategory) -> Category {
    Category {
        id: CategoryId::new(raw.id),
        name: raw.name,
        slug: raw.slug,
        description: raw.description,
        image: raw.image.map(|media| convert_image(base, media)),
        parent_id: raw.parent.map(|parent| CategoryId::new(parent.id)),
        children: raw
            .children
            .into_iter()
            .map(|child| CategoryId::new(child.id))
            .collect(),
    }
}

fn convert_attribute(raw: RawAttribute) -> ProductAttribute {
    match raw {
        RawAttribute::String { name, unit, value } => ProductAttribute {
            name,
            unit,
            value: AttributeValue::String { value },
        },
        RawAttribute::Number { name, unit, value } => ProductAttribute {
            name,
            unit,
            value: AttributeValue::Number { value },
        },
        RawAttribute::Boolean { name, value } => ProductAttribute {
            name,
            unit: None,
            value: AttributeValue::Boolean { value },
        },
        RawAttribute::Range {
            name,
            unit,
            min,
            max,
        } => ProductAttribute {
            name,
            unit,
            value: AttributeValue::Range { min, max },
        },
    }
}

pub fn convert_product(base: &str, raw: RawProduct) -> Product {
    Product {
        id: ProductId::new(raw.id),
        slug: raw.slug,
        name: raw.name,
        sku: raw.sku.filter(|sku| !sku.trim().is_empty()),
        price: raw.price,
        // A previous price only makes sense above the current one
        old_price: raw.old_price.filter(|old| *old > raw.price),
        is_part: raw.is_part,
        in_stock: raw.in_stock,
        description: raw.description,
        category: raw.category.map(|category| CategoryRef {
            id: CategoryId::new(category.id),
            name: category.name,
            slug: category.slug,
        }),
        images: raw
            .images
            .into_iter()
            .map(|media| convert_image(base, media))
            .collect(),
        attributes: raw.attributes.into_iter().map(convert_attribute).collect(),
        updated_at: raw.updated_at,
    }
}

pub fn convert_section(raw: RawBlogSection) -> BlogSection {
    BlogSection {
        id: SectionId::new(raw.id),
        title: raw.title,
        slug: raw.slug,
        description: raw.description,
    }
}

pub fn convert_article(base: &str, raw: RawArticle) -> Article {
    Article {
        id: ArticleId::new(raw.id),
        title: raw.title,
        slug: raw.slug,
        excerpt: raw.excerpt,
        content: raw.content,
        cover: raw.cover.map(|media| convert_image(base, media)),
        section: raw.section.map(convert_section),
        published_at: raw.published_at,
        updated_at: raw.updated_at,
    }
}

pub fn convert_service(raw: RawService) -> Service {
    Service {
        id: ServiceId::new(raw.id),
        title: raw.title,
        slug: raw.slug,
        summary: raw.summary,
        updated_at: raw.updated_at,
    }
}
