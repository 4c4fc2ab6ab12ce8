//! Favorites list reducer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TotalOverflow;
use crate::types::ProductId;

/// A product saved to favorites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub sku: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Favorites with running totals. Each product appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorites {
    pub items: Vec<FavoriteItem>,
    pub total_price: Decimal,
    pub total_count: u32,
}

impl Favorites {
    /// Add a product unless it is already saved. Returns whether it was added.
    ///
    /// # Errors
    ///
    /// Returns [`TotalOverflow`] and leaves the list untouched when the new
    /// total price would not fit a [`Decimal`].
    pub fn add_item(&mut self, item: FavoriteItem) -> Result<bool, TotalOverflow> {
        if self.contains(item.id) {
            return Ok(false);
        }
        self.total_price = self.total_price.checked_add(item.price).ok_or(TotalOverflow)?;
        self.total_count = self.total_count.saturating_add(1);
        self.items.push(item);
        Ok(true)
    }

    /// Remove the product with `id`. Returns the removed entry.
    pub fn remove_item(&mut self, id: ProductId) -> Option<FavoriteItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(position);
        self.total_price = self
            .items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.price));
        self.total_count = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        Some(removed)
    }

    /// Whether the product is saved.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Forget every saved product.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, price: i64) -> FavoriteItem {
        FavoriteItem {
            id: ProductId::new(id),
            title: format!("Пресс {id}"),
            price: Decimal::new(price, 0),
            sku: format!("PR-{id}"),
            image: None,
            slug: None,
        }
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut favorites = Favorites::default();
        assert_eq!(favorites.add_item(item(1, 100)), Ok(true));
        assert_eq!(favorites.add_item(item(1, 100)), Ok(false));

        assert_eq!(favorites.items.len(), 1);
        assert_eq!(favorites.total_count, 1);
        assert_eq!(favorites.total_price, Decimal::new(100, 0));
    }

    #[test]
    fn test_add_then_remove_restores_totals() {
        let mut favorites = Favorites::default();
        favorites.add_item(item(1, 100)).unwrap();
        let before = favorites.clone();

        favorites.add_item(item(2, 250)).unwrap();
        assert!(favorites.contains(ProductId::new(2)));
        assert!(favorites.remove_item(ProductId::new(2)).is_some());

        assert_eq!(favorites, before);
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut favorites = Favorites::default();
        assert!(favorites.remove_item(ProductId::new(5)).is_none());
        assert_eq!(favorites.total_count, 0);
    }

    #[test]
    fn test_add_overflowing_total_is_rejected() {
        let mut favorites = Favorites::default();
        favorites.add_item(item(1, 100)).unwrap();
        let before = favorites.clone();

        let mut huge = item(2, 0);
        huge.price = Decimal::MAX;
        assert_eq!(favorites.add_item(huge), Err(TotalOverflow));
        assert_eq!(favorites, before);
    }
}
