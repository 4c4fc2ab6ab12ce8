//! YML product feed for marketplace aggregators.

use std::collections::HashSet;

use askama::Template;
use chrono::{DateTime, Utc};
use promtech_core::CategoryId;
use promtech_core::catalog::CategoryTree;
use rust_decimal::Decimal;

use crate::cms::Product;
use crate::config::StorefrontConfig;

/// Aggregators reject offer descriptions longer than this.
const MAX_DESCRIPTION_CHARS: usize = 3000;

pub struct FeedCategory {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
}

pub struct FeedOffer {
    pub id: i64,
    pub available: bool,
    pub url: String,
    pub price: String,
    pub old_price: Option<String>,
    pub category_id: Option<i64>,
    pub picture: Option<String>,
    pub name: String,
    pub vendor_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Template)]
#[template(path = "feed.xml")]
pub struct YmlCatalog<'a> {
    pub date: String,
    pub shop_name: &'a str,
    pub company: &'a str,
    pub url: &'a str,
    pub categories: Vec<FeedCategory>,
    pub offers: Vec<FeedOffer>,
}

/// Categories the feed is limited to: the configured root and everything
/// below it.
///
/// `None` means the whole catalog. An unknown root slug also falls back to
/// the whole catalog, with a warning.
#[must_use]
pub fn feed_scope(tree: &CategoryTree, root_slug: Option<&str>) -> Option<Vec<CategoryId>> {
    let slug = root_slug?;
    let Some(root) = tree.find_by_slug(slug) else {
        tracing::warn!(slug, "Feed root category not found, exporting whole catalog");
        return None;
    };

    let mut ids = vec![root.id];
    ids.extend(tree.descendant_ids(root.id));
    Some(ids)
}

fn price_text(price: Decimal) -> String {
    price.round_dp(2).normalize().to_string()
}

fn description_text(description: &str) -> Option<String> {
    let description = description.trim();
    if description.is_empty() {
        return None;
    }
    Some(description.chars().take(MAX_DESCRIPTION_CHARS).collect())
}

fn offer(config: &StorefrontConfig, product: &Product) -> FeedOffer {
    FeedOffer {
        id: product.id.as_i64(),
        available: product.in_stock,
        url: config.absolute_url(&format!("product/{}", product.slug)),
        price: price_text(product.price),
        old_price: product.old_price.map(price_text),
        category_id: product.category.as_ref().map(|c| c.id.as_i64()),
        picture: product.main_image().map(|image| image.url.clone()),
        name: product.name.clone(),
        vendor_code: product.sku.clone(),
        description: product.description.as_deref().and_then(description_text),
    }
}

/// Render the feed.
///
/// Categories come from the tree with their resolved parents. With a
/// `scope`, only categories in it are listed and only products filed under
/// them are offered.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_feed(
    config: &StorefrontConfig,
    tree: &CategoryTree,
    products: &[Product],
    scope: Option<&[CategoryId]>,
    generated_at: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let scope: Option<HashSet<CategoryId>> = scope.map(|ids| ids.iter().copied().collect());
    let in_scope = |id: CategoryId| scope.as_ref().is_none_or(|scope| scope.contains(&id));

    let categories = tree
        .flatten()
        .into_iter()
        .filter(|category| in_scope(category.id))
        .map(|category| FeedCategory {
            id: category.id.as_i64(),
            // A parent outside the scope would dangle, so the category
            // becomes a root of the exported tree.
            parent_id: category
                .parent_id
                .filter(|parent| in_scope(*parent))
                .map(|parent| parent.as_i64()),
            name: category.name.to_string(),
        })
        .collect();

    let offers = products
        .iter()
        .filter(|product| {
            scope.is_none()
                || product
                    .category
                    .as_ref()
                    .is_some_and(|category| in_scope(category.id))
        })
        .map(|product| offer(config, product))
        .collect();

    YmlCatalog {
        date: generated_at.format("%Y-%m-%d %H:%M").to_string(),
        shop_name: &config.shop.name,
        company: &config.shop.company,
        url: &config.base_url,
        categories,
        offers,
    }
    .render()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use promtech_core::ProductId;
    use promtech_core::catalog::CategoryNode;

    use super::*;
    use crate::cms::{CategoryRef, Image};
    use crate::config::tests::test_config;

    fn node(id: i64, slug: &str, parent: Option<i64>) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            name: format!("Категория {slug}"),
            slug: slug.to_string(),
            parent_id: parent.map(CategoryId::new),
            children: Vec::new(),
        }
    }

    fn product(id: i64, category: i64) -> Product {
        Product {
            id: ProductId::new(id),
            slug: format!("press-{id}"),
            name: format!("Пресс \"П-{id}\" & Co"),
            sku: Some(format!("P-{id}")),
            price: Decimal::new(12_500_050, 2),
            old_price: Some(Decimal::new(130_000, 0)),
            is_part: false,
            in_stock: id % 2 == 1,
            description: Some("Гидравлический пресс <усилие 40 т>".to_string()),
            category: Some(CategoryRef {
                id: CategoryId::new(category),
                name: String::new(),
                slug: String::new(),
            }),
            images: vec![Image {
                url: format!("https://cms.test/uploads/{id}.jpg"),
                alt: None,
            }],
            attributes: Vec::new(),
            updated_at: None,
        }
    }

    fn tree() -> CategoryTree {
        CategoryTree::new([
            node(1, "machines", None),
            node(2, "presses", Some(1)),
            node(3, "hydraulic", Some(2)),
            node(4, "tools", None),
        ])
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_feed_lists_categories_and_offers() {
        let config = test_config("http://cms.test");
        let xml = render_feed(
            &config,
            &tree(),
            &[product(1, 3), product(2, 4)],
            None,
            generated_at(),
        )
        .unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<yml_catalog date=\"2026-03-14 09:30\">"));
        assert!(xml.contains("<currency id=\"RUB\" rate=\"1\"/>"));
        assert!(xml.contains("<category id=\"1\">Категория machines</category>"));
        assert!(xml.contains("<category id=\"3\" parentId=\"2\">Категория hydraulic</category>"));
        assert!(xml.contains("<offer id=\"1\" available=\"true\">"));
        assert!(xml.contains("<offer id=\"2\" available=\"false\">"));
        assert!(xml.contains("<url>https://promtech.test/product/press-1</url>"));
        assert!(xml.contains("<price>125000.5</price>"));
        assert!(xml.contains("<oldprice>130000</oldprice>"));
        assert!(xml.contains("<categoryId>3</categoryId>"));
        assert!(xml.contains("<picture>https://cms.test/uploads/1.jpg</picture>"));
        assert!(xml.contains("<vendorCode>P-1</vendorCode>"));
    }

    #[test]
    fn test_feed_escapes_text() {
        let config = test_config("http://cms.test");
        let xml = render_feed(&config, &tree(), &[product(1, 3)], None, generated_at()).unwrap();

        assert!(xml.contains("Пресс &#34;П-1&#34; &#38; Co") || xml.contains("Пресс &quot;П-1&quot; &amp; Co"));
        assert!(!xml.contains("<усилие"));
    }

    #[test]
    fn test_scope_includes_root_and_descendants() {
        let tree = tree();
        let scope = feed_scope(&tree, Some("presses")).unwrap();
        assert_eq!(scope, vec![CategoryId::new(2), CategoryId::new(3)]);
        assert!(feed_scope(&tree, Some("missing")).is_none());
        assert!(feed_scope(&tree, None).is_none());

        let config = test_config("http://cms.test");
        let xml = render_feed(
            &config,
            &tree,
            &[product(1, 3), product(2, 4)],
            Some(&scope),
            generated_at(),
        )
        .unwrap();

        // The scope root has its parent outside the feed, so it is listed as a root.
        assert!(xml.contains("<category id=\"2\">Категория presses</category>"));
        assert!(xml.contains("<category id=\"3\" parentId=\"2\">"));
        assert!(!xml.contains("<category id=\"1\">"));
        assert!(!xml.contains("<category id=\"4\">"));
        assert!(xml.contains("<offer id=\"1\""));
        assert!(!xml.contains("<offer id=\"2\""));
    }

    #[test]
    fn test_price_text() {
        assert_eq!(price_text(Decimal::new(100_000, 2)), "1000");
        assert_eq!(price_text(Decimal::new(99_955, 3)), "99.96");
    }
}
