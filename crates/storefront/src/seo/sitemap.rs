//! XML sitemap.

use askama::Template;
use chrono::{DateTime, Utc};
use promtech_core::catalog::CategoryTree;

use crate::cms::{Article, BlogSection, Product, Service};
use crate::config::StorefrontConfig;

/// Pages that exist regardless of CMS content, with their priorities.
const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("", "daily", "1.0"),
    ("catalog", "daily", "0.9"),
    ("parts", "daily", "0.8"),
    ("services", "weekly", "0.7"),
    ("blog", "weekly", "0.6"),
    ("about", "monthly", "0.5"),
    ("delivery", "monthly", "0.5"),
    ("contacts", "monthly", "0.5"),
];

pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct Sitemap {
    pub entries: Vec<SitemapEntry>,
}

/// Everything the sitemap lists besides static pages.
///
/// Each source is loaded on its own; one that failed to load is simply
/// empty here.
#[derive(Debug, Default)]
pub struct SitemapSources {
    pub services: Vec<Service>,
    pub categories: CategoryTree,
    pub products: Vec<Product>,
    pub sections: Vec<BlogSection>,
    pub articles: Vec<Article>,
}

fn lastmod(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|at| at.format("%Y-%m-%d").to_string())
}

/// URL path of an article.
#[must_use]
pub fn article_path(article: &Article) -> String {
    match &article.section {
        Some(section) => format!("blog/{}/{}", section.slug, article.slug),
        None => format!("blog/{}", article.slug),
    }
}

/// Collect every sitemap entry in a stable order.
#[must_use]
pub fn entries(config: &StorefrontConfig, sources: &SitemapSources) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = STATIC_PAGES
        .iter()
        .map(|&(path, changefreq, priority)| SitemapEntry {
            loc: config.absolute_url(path),
            lastmod: None,
            changefreq,
            priority,
        })
        .collect();

    entries.extend(sources.services.iter().map(|service| SitemapEntry {
        loc: config.absolute_url(&format!("services/{}", service.slug)),
        lastmod: lastmod(service.updated_at),
        changefreq: "monthly",
        priority: "0.6",
    }));

    entries.extend(sources.categories.flatten().into_iter().map(|category| {
        let path: Vec<&str> = sources
            .categories
            .path_to(category.id)
            .into_iter()
            .map(|node| node.slug.as_str())
            .collect();
        SitemapEntry {
            loc: config.absolute_url(&format!("catalog/{}", path.join("/"))),
            lastmod: None,
            changefreq: "weekly",
            priority: "0.8",
        }
    }));

    entries.extend(sources.products.iter().map(|product| SitemapEntry {
        loc: config.absolute_url(&format!("product/{}", product.slug)),
        lastmod: lastmod(product.updated_at),
        changefreq: "weekly",
        priority: "0.7",
    }));

    entries.extend(sources.sections.iter().map(|section| SitemapEntry {
        loc: config.absolute_url(&format!("blog/{}", section.slug)),
        lastmod: None,
        changefreq: "weekly",
        priority: "0.5",
    }));

    entries.extend(sources.articles.iter().map(|article| SitemapEntry {
        loc: config.absolute_url(&article_path(article)),
        lastmod: lastmod(article.updated_at.or(article.published_at)),
        changefreq: "monthly",
        priority: "0.5",
    }));

    entries
}

/// Render the sitemap.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_sitemap(
    config: &StorefrontConfig,
    sources: &SitemapSources,
) -> Result<String, askama::Error> {
    Sitemap {
        entries: entries(config, sources),
    }
    .render()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use promtech_core::catalog::CategoryNode;
    use promtech_core::{ArticleId, CategoryId, SectionId, ServiceId};

    use super::*;
    use crate::config::tests::test_config;

    fn node(id: i64, slug: &str, parent: Option<i64>) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            name: slug.to_string(),
            slug: slug.to_string(),
            parent_id: parent.map(CategoryId::new),
            children: Vec::new(),
        }
    }

    fn section() -> BlogSection {
        BlogSection {
            id: SectionId::new(1),
            title: "Новости".to_string(),
            slug: "news".to_string(),
            description: None,
        }
    }

    fn article(slug: &str, section: Option<BlogSection>) -> Article {
        Article {
            id: ArticleId::new(1),
            title: "Статья".to_string(),
            slug: slug.to_string(),
            excerpt: None,
            content: String::new(),
            cover: None,
            section,
            published_at: Some(Utc.with_ymd_and_hms(2026, 1, 20, 8, 0, 0).unwrap()),
            updated_at: None,
        }
    }

    #[test]
    fn test_static_pages_only_when_sources_empty() {
        let config = test_config("http://cms.test");
        let entries = entries(&config, &SitemapSources::default());

        assert_eq!(entries.len(), STATIC_PAGES.len());
        assert_eq!(entries[0].loc, "https://promtech.test/");
        assert_eq!(entries[1].loc, "https://promtech.test/catalog");
    }

    #[test]
    fn test_sitemap_includes_every_source() {
        let config = test_config("http://cms.test");
        let sources = SitemapSources {
            services: vec![Service {
                id: ServiceId::new(1),
                title: "Пусконаладка".to_string(),
                slug: "commissioning".to_string(),
                summary: None,
                updated_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()),
            }],
            categories: CategoryTree::new([
                node(1, "machines", None),
                node(2, "presses", Some(1)),
            ]),
            products: Vec::new(),
            sections: vec![section()],
            articles: vec![article("new-press", Some(section())), article("loose", None)],
        };

        let xml = render_sitemap(&config, &sources).unwrap();

        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>https://promtech.test/services/commissioning</loc>"));
        assert!(xml.contains("<lastmod>2026-02-01</lastmod>"));
        assert!(xml.contains("<loc>https://promtech.test/catalog/machines</loc>"));
        assert!(xml.contains("<loc>https://promtech.test/catalog/machines/presses</loc>"));
        assert!(xml.contains("<loc>https://promtech.test/blog/news</loc>"));
        assert!(xml.contains("<loc>https://promtech.test/blog/news/new-press</loc>"));
        assert!(xml.contains("<loc>https://promtech.test/blog/loose</loc>"));
        assert!(xml.contains("<lastmod>2026-01-20</lastmod>"));
    }
}
