//! City directory for the delivery city picker.
//!
//! Loaded once at startup from a JSON array of `{ name, region }` records and
//! kept sorted in Russian alphabetical order.

use std::path::Path;

use promtech_core::catalog::Pagination;
use promtech_core::collation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Pagination metadata for city search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPage {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
}

/// Sorted, searchable city list.
#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    cities: Vec<City>,
}

impl CityDirectory {
    /// Build a directory, sorting by name (Russian collation) and dropping
    /// blank names.
    #[must_use]
    pub fn new(cities: Vec<City>) -> Self {
        let mut cities: Vec<City> = cities
            .into_iter()
            .filter(|city| !city.name.trim().is_empty())
            .collect();
        cities.sort_by(|a, b| collation::compare(&a.name, &b.name));
        Self { cities }
    }

    /// Load from a JSON file. A missing or malformed file yields an empty
    /// directory and a warning.
    pub async fn load(path: &Path) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "City list unavailable");
                return Self::default();
            }
        };

        match serde_json::from_slice::<Vec<City>>(&bytes) {
            Ok(cities) => {
                let directory = Self::new(cities);
                tracing::info!(count = directory.len(), "Loaded city list");
                directory
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "City list is malformed");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Cities whose name contains `query` (case-insensitive, `ё` = `е`),
    /// in Russian alphabetical order. An empty query matches every city.
    #[must_use]
    pub fn search(&self, query: &str, page: Option<u32>, page_size: Option<u32>) -> (Vec<&City>, CityPage) {
        let matches: Vec<&City> = self
            .cities
            .iter()
            .filter(|city| collation::contains_folded(&city.name, query))
            .collect();

        let (page, page_size) = Pagination::clamp_params(page, page_size);
        let pagination = Pagination::from_total(page, page_size, matches.len() as u64);
        let items = pagination.slice(&matches).to_vec();

        let meta = CityPage {
            page: pagination.page,
            page_size: pagination.page_size,
            total: pagination.total,
            has_more: pagination.has_more(),
        };
        (items, meta)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn city(name: &str) -> City {
        City {
            name: name.to_string(),
            region: None,
        }
    }

    fn directory() -> CityDirectory {
        CityDirectory::new(vec![
            city("Мурманск"),
            city("Москва"),
            city("Орёл"),
            city("Казань"),
            city(" "),
        ])
    }

    #[test]
    fn test_search_moscow() {
        let directory = directory();
        let (items, meta) = directory.search("моск", None, None);

        assert_eq!(items.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Москва"]);
        assert_eq!(meta.total, 1);
        assert!(!meta.has_more);
    }

    #[test]
    fn test_search_folds_yo() {
        let directory = directory();
        let (items, _) = directory.search("ОРЕЛ", None, None);
        assert_eq!(items.first().map(|c| c.name.as_str()), Some("Орёл"));
    }

    #[test]
    fn test_search_query_is_trimmed_and_folded() {
        let directory = directory();

        let (items, _) = directory.search("  ЁЛ ", None, None);
        assert_eq!(items.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), ["Орёл"]);

        let (all, meta) = directory.search("   ", None, None);
        assert_eq!(all.len(), directory.len());
        assert_eq!(meta.total, 4);
    }

    #[test]
    fn test_empty_query_lists_all_sorted_and_paginates() {
        let directory = directory();
        assert_eq!(directory.len(), 4);

        let (items, meta) = directory.search("", Some(1), Some(3));
        assert_eq!(
            items.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            ["Казань", "Москва", "Мурманск"]
        );
        assert_eq!(meta.total, 4);
        assert!(meta.has_more);

        let (rest, meta) = directory.search("", Some(2), Some(3));
        assert_eq!(rest.len(), 1);
        assert!(!meta.has_more);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let directory = CityDirectory::load(Path::new("/nonexistent/cities.json")).await;
        assert!(directory.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cities.json");
        std::fs::write(&path, r#"[{"name":"Тула","region":"Тульская область"},{"name":"Омск"}]"#)
            .unwrap();

        let directory = CityDirectory::load(&path).await;
        let (items, _) = directory.search("", None, None);
        assert_eq!(items.first().map(|c| c.name.as_str()), Some("Омск"));
        assert_eq!(items.get(1).and_then(|c| c.region.as_deref()), Some("Тульская область"));
    }
}
