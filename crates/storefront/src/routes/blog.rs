//! Blog route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use comrak::{Options, markdown_to_html};
use promtech_core::catalog::Pagination;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cms::{Article, BlogSection};
use crate::error::Result;
use crate::routes::{DataResponse, ListMeta, data, data_with_meta};
use crate::state::AppState;

/// Number of related articles shown under an article.
const RELATED_LIMIT: u32 = 3;

#[derive(Debug, Deserialize)]
pub struct ArticlesQuery {
    pub section: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// An article with its body rendered and a few related articles.
#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub html: String,
    pub related: Vec<Article>,
}

/// Render article markdown to HTML.
///
/// Raw HTML in the source is escaped rather than passed through.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    options.render.escape = true;

    markdown_to_html(content, &options)
}

/// List blog sections.
#[instrument(skip(state))]
pub async fn sections(State(state): State<AppState>) -> Result<Json<DataResponse<Vec<BlogSection>>>> {
    let sections = state.cms().blog_sections().await?;
    Ok(data(sections))
}

/// List articles, newest first.
#[instrument(skip(state))]
pub async fn articles(
    State(state): State<AppState>,
    query: std::result::Result<Query<ArticlesQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<Article>, ListMeta>>> {
    let Query(query) = query?;
    let section = query
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (page, page_size) = Pagination::clamp_params(query.page, query.page_size);
    let page = state.cms().articles(section, page, page_size).await?;

    Ok(data_with_meta(
        page.items,
        ListMeta {
            pagination: page.pagination,
        },
    ))
}

/// Show an article.
///
/// Related articles are a nice-to-have: if the lookup fails the article is
/// still served, with an empty list.
#[instrument(skip(state))]
pub async fn article(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<DataResponse<ArticleDetail>>> {
    let Path(slug) = path?;
    let article = state.cms().article_by_slug(&slug).await?;

    let related = match state.cms().related_articles(&article, RELATED_LIMIT).await {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!(slug = %article.slug, error = %e, "Failed to load related articles");
            Vec::new()
        }
    };

    Ok(data(ArticleDetail {
        html: render_markdown(&article.content),
        article,
        related,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_tables_and_headings() {
        let html = render_markdown("## Гидравлика\n\n| Усилие | Ход |\n|---|---|\n| 40 т | 250 мм |");
        assert!(html.contains("<h2>"));
        assert!(html.contains("Гидравлика"));
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>40 т</td>"));
    }

    #[test]
    fn test_render_markdown_escapes_raw_html() {
        let html = render_markdown("text <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
