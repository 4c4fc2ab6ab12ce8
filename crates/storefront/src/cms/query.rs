//! Query-string builder for the CMS REST API.
//!
//! The CMS reads nested parameters in bracket notation:
//! `pagination[page]=2&filters[category][slug][$eq]=presses&sort[0]=price:asc`.

use promtech_core::CategoryId;
use promtech_core::catalog::Pagination;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::form_urlencoded;

/// Comparison operators understood by the CMS filter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    ContainsI,
    In,
    Null,
}

impl FilterOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::ContainsI => "$containsi",
            Self::In => "$in",
            Self::Null => "$null",
        }
    }
}

/// Builder for a CMS collection query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmsQuery {
    params: Vec<(String, String)>,
    sort_count: usize,
    populate_count: usize,
}

impl CmsQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one page. Page size is capped at [`Pagination::MAX_PAGE_SIZE`].
    #[must_use]
    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        let (page, page_size) = Pagination::clamp_params(Some(page), Some(page_size));
        self.params
            .push(("pagination[page]".to_string(), page.to_string()));
        self.params
            .push(("pagination[pageSize]".to_string(), page_size.to_string()));
        self
    }

    /// Add a filter on a (possibly nested) field path such as `["category", "slug"]`.
    #[must_use]
    pub fn filter(mut self, path: &[&str], op: FilterOp, value: impl ToString) -> Self {
        let key = format!("filters{}[{}]", bracketed(path), op.as_str());
        self.params.push((key, value.to_string()));
        self
    }

    /// Add an `$in` filter matching any of `values`.
    ///
    /// An empty list is sent as-is and matches nothing.
    #[must_use]
    pub fn filter_in<V: ToString>(
        mut self,
        path: &[&str],
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let prefix = format!("filters{}[{}]", bracketed(path), FilterOp::In.as_str());
        let mut any = false;
        for (index, value) in values.into_iter().enumerate() {
            self.params
                .push((format!("{prefix}[{index}]"), value.to_string()));
            any = true;
        }
        if !any {
            self.params.push((prefix, String::new()));
        }
        self
    }

    /// Sort by `field`, ascending or descending. Calls accumulate.
    #[must_use]
    pub fn sort(mut self, field: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.params.push((
            format!("sort[{}]", self.sort_count),
            format!("{field}:{direction}"),
        ));
        self.sort_count += 1;
        self
    }

    /// Populate a relation or media field. Calls accumulate.
    #[must_use]
    pub fn populate(mut self, field: &str) -> Self {
        self.params.push((
            format!("populate[{}]", self.populate_count),
            field.to_string(),
        ));
        self.populate_count += 1;
        self
    }

    /// Encode as a URL query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }
}

// =============================================================================
// Product listing filters
// =============================================================================

/// Product list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    NameAsc,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl ProductSort {
    fn apply(self, query: CmsQuery) -> CmsQuery {
        match self {
            Self::NameAsc => query.sort("name", false),
            Self::PriceAsc => query.sort("price", false).sort("name", false),
            Self::PriceDesc => query.sort("price", true).sort("name", false),
            Self::Newest => query.sort("createdAt", true),
        }
    }
}

/// Filters for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Categories a product may belong to (a whole subtree, root included).
    pub category_ids: Option<Vec<CategoryId>>,
    /// `Some(true)` for spare parts only, `Some(false)` for equipment only.
    pub is_part: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Add these filters to `query`.
    #[must_use]
    pub fn apply(&self, mut query: CmsQuery) -> CmsQuery {
        if let Some(ids) = &self.category_ids {
            query = query.filter_in(&["category", "id"], ids.iter().map(CategoryId::as_i64));
        }
        if let Some(is_part) = self.is_part {
            query = query.filter(&["isPart"], FilterOp::Eq, is_part);
        }
        if let Some(min) = self.min_price {
            query = query.filter(&["price"], FilterOp::Gte, min);
        }
        if let Some(max) = self.max_price {
            query = query.filter(&["price"], FilterOp::Lte, max);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(&["name"], FilterOp::ContainsI, search);
        }
        self.sort.apply(query)
    }
}

fn bracketed(path: &[&str]) -> String {
    path.iter().map(|segment| format!("[{segment}]")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(query: &CmsQuery) -> Vec<(String, String)> {
        form_urlencoded::parse(query.to_query_string().as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_pagination_is_clamped() {
        let query = CmsQuery::new().page(0, 500);
        assert_eq!(
            decoded(&query),
            vec![
                ("pagination[page]".to_string(), "1".to_string()),
                ("pagination[pageSize]".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_filter_and_sort() {
        let query = CmsQuery::new()
            .filter(&["category", "slug"], FilterOp::Eq, "presses")
            .filter(&["price"], FilterOp::Gte, 1000)
            .sort("price", false)
            .sort("name", true);

        assert_eq!(
            decoded(&query),
            vec![
                ("filters[category][slug][$eq]".to_string(), "presses".to_string()),
                ("filters[price][$gte]".to_string(), "1000".to_string()),
                ("sort[0]".to_string(), "price:asc".to_string()),
                ("sort[1]".to_string(), "name:desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_in_filter_lists_values() {
        let query = CmsQuery::new().filter_in(&["category", "id"], [3, 5]);
        assert_eq!(
            decoded(&query),
            vec![
                ("filters[category][id][$in][0]".to_string(), "3".to_string()),
                ("filters[category][id][$in][1]".to_string(), "5".to_string()),
            ]
        );

        let empty = CmsQuery::new().filter_in(&["id"], Vec::<i64>::new());
        assert_eq!(
            decoded(&empty),
            vec![("filters[id][$in]".to_string(), String::new())]
        );
    }

    #[test]
    fn test_query_string_is_percent_encoded() {
        let query = CmsQuery::new()
            .filter(&["name"], FilterOp::ContainsI, "пресс 5")
            .populate("images");
        let encoded = query.to_query_string();

        assert!(encoded.contains("filters%5Bname%5D%5B%24containsi%5D="));
        assert!(!encoded.contains(' '));
        assert!(encoded.ends_with("populate%5B0%5D=images"));
    }

    #[test]
    fn test_product_filter_builds_subtree_query() {
        let filter = ProductFilter {
            category_ids: Some(vec![CategoryId::new(1), CategoryId::new(4)]),
            is_part: Some(true),
            min_price: Some(Decimal::new(1000, 0)),
            max_price: None,
            search: Some("  ".to_string()),
            sort: ProductSort::PriceDesc,
        };

        assert_eq!(
            decoded(&filter.apply(CmsQuery::new())),
            vec![
                ("filters[category][id][$in][0]".to_string(), "1".to_string()),
                ("filters[category][id][$in][1]".to_string(), "4".to_string()),
                ("filters[isPart][$eq]".to_string(), "true".to_string()),
                ("filters[price][$gte]".to_string(), "1000".to_string()),
                ("sort[0]".to_string(), "price:desc".to_string()),
                ("sort[1]".to_string(), "name:asc".to_string()),
            ]
        );
    }
}
