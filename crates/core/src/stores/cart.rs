//! Shopping cart reducer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TotalOverflow;
use crate::types::ProductId;

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub sku: String,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub slug: Option<String>,
}

impl CartItem {
    /// Price of the whole row, or `None` when it does not fit a [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Cart contents with running totals.
///
/// The same product may occupy several rows: adding never merges into an
/// existing row, and quantities are tracked per row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
    pub total_count: u32,
}

impl Cart {
    /// Append a row. Quantities below one are raised to one.
    ///
    /// # Errors
    ///
    /// Returns [`TotalOverflow`] and leaves the cart untouched when the new
    /// total price would not fit a [`Decimal`].
    pub fn add_item(&mut self, mut item: CartItem) -> Result<(), TotalOverflow> {
        item.quantity = item.quantity.max(1);
        let total_price = item
            .line_total()
            .and_then(|line| self.total_price.checked_add(line))
            .ok_or(TotalOverflow)?;

        self.total_price = total_price;
        self.total_count = self.total_count.saturating_add(item.quantity);
        self.items.push(item);
        Ok(())
    }

    /// Remove the first row for `id` and recompute the totals.
    ///
    /// Returns the removed row, or `None` when no row matches.
    pub fn remove_item(&mut self, id: ProductId) -> Option<CartItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        let removed = self.items.remove(position);
        self.recompute_totals();
        Some(removed)
    }

    /// Set the quantity of the first row for `id`.
    ///
    /// Quantities below one leave the cart untouched; dropping a row takes an
    /// explicit [`Cart::remove_item`]. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`TotalOverflow`] and leaves the cart untouched when the new
    /// total price would not fit a [`Decimal`].
    pub fn update_item_quantity(
        &mut self,
        id: ProductId,
        quantity: i64,
    ) -> Result<bool, TotalOverflow> {
        if quantity < 1 {
            return Ok(false);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        let previous = item.quantity;
        let total_price = item
            .price
            .checked_mul(Decimal::from(quantity) - Decimal::from(previous))
            .and_then(|delta| self.total_price.checked_add(delta))
            .ok_or(TotalOverflow)?;

        item.quantity = quantity;
        self.total_price = total_price;
        self.total_count = self
            .total_count
            .saturating_sub(previous)
            .saturating_add(quantity);
        Ok(true)
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn recompute_totals(&mut self) {
        self.total_price = self.items.iter().fold(Decimal::ZERO, |acc, item| {
            acc.saturating_add(item.line_total().unwrap_or(Decimal::MAX))
        });
        self.total_count = self
            .items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity));
    }
}
