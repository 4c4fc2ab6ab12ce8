//! Cart and favorites state with pluggable persistence.
//!
//! The reducers ([`Cart`], [`Favorites`]) are plain values: every mutation is
//! synchronous and updates the running totals in place. Where that state
//! lives between requests is decided by a [`Persistence`] implementation
//! handed to [`PersistedStore`], which saves after every mutation.
//!
//! # Example
//!
//! ```rust
//! use promtech_core::stores::{Favorites, MemoryPersistence, PersistedStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut store = PersistedStore::<Favorites, _>::open(MemoryPersistence::default())
//!     .await
//!     .unwrap();
//! store.update(Favorites::clear).await.unwrap();
//! assert_eq!(store.state().total_count, 0);
//! # }
//! ```

mod cart;
mod favorites;

use std::convert::Infallible;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

pub use cart::{Cart, CartItem};
pub use favorites::{FavoriteItem, Favorites};

/// Largest unit price, in whole roubles, accepted into a cart, favorites or an order.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;

/// Largest quantity accepted for a single row.
pub const MAX_QUANTITY: u32 = 100_000;

/// A mutation was refused because the running total would not fit a
/// [`rust_decimal::Decimal`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("total price is out of range")]
pub struct TotalOverflow;

/// Storage for a store's state between uses.
pub trait Persistence<T> {
    /// Error raised by the underlying storage.
    type Error;

    /// Load the previously saved state, if any.
    fn load(&self) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send;

    /// Save the current state, replacing whatever was stored.
    fn save(&self, state: &T) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A store state bound to its persistence.
///
/// Construct one per unit of work (e.g. per request), apply mutations through
/// [`PersistedStore::update`], and read the result with
/// [`PersistedStore::state`].
#[derive(Debug)]
pub struct PersistedStore<T, P> {
    state: T,
    persistence: P,
}

impl<T, P> PersistedStore<T, P>
where
    T: Default + Sync,
    P: Persistence<T> + Sync,
{
    /// Load the saved state, or start from the default when none exists.
    ///
    /// # Errors
    ///
    /// Returns the persistence error if loading fails.
    pub async fn open(persistence: P) -> Result<Self, P::Error> {
        let state = persistence.load().await?.unwrap_or_default();
        Ok(Self { state, persistence })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &T {
        &self.state
    }

    /// Consume the store, returning the state.
    #[must_use]
    pub fn into_state(self) -> T {
        self.state
    }

    /// Apply a mutation and persist the result immediately.
    ///
    /// # Errors
    ///
    /// Returns the persistence error if saving fails. The in-memory state
    /// keeps the mutation either way.
    pub async fn update<R>(&mut self, mutate: impl FnOnce(&mut T) -> R) -> Result<R, P::Error> {
        let out = mutate(&mut self.state);
        self.persistence.save(&self.state).await?;
        Ok(out)
    }
}

/// In-process persistence, shared between clones.
///
/// Used in tests and anywhere a throwaway store is enough.
#[derive(Debug)]
pub struct MemoryPersistence<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Default for MemoryPersistence<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T> Clone for MemoryPersistence<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> MemoryPersistence<T> {
    /// Start with an already saved state.
    #[must_use]
    pub fn with_state(state: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(state))),
        }
    }
}

impl<T> Persistence<T> for MemoryPersistence<T>
where
    T: Clone + Send + Sync,
{
    type Error = Infallible;

    async fn load(&self) -> Result<Option<T>, Self::Error> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn save(&self, state: &T) -> Result<(), Self::Error> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::ProductId;

    fn favorite(id: i64, price: i64) -> FavoriteItem {
        FavoriteItem {
            id: ProductId::new(id),
            title: format!("Станок {id}"),
            price: Decimal::new(price, 0),
            sku: format!("SKU-{id}"),
            image: None,
            slug: None,
        }
    }

    #[tokio::test]
    async fn test_open_starts_from_default() {
        let store = PersistedStore::<Cart, _>::open(MemoryPersistence::default())
            .await
            .unwrap();
        assert!(store.state().items.is_empty());
        assert_eq!(store.state().total_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_update_persists_immediately() {
        let persistence = MemoryPersistence::default();
        let mut store = PersistedStore::<Favorites, _>::open(persistence.clone())
            .await
            .unwrap();

        store
            .update(|favorites| favorites.add_item(favorite(1, 500)))
            .await
            .unwrap()
            .unwrap();

        let reopened = PersistedStore::<Favorites, _>::open(persistence)
            .await
            .unwrap();
        assert_eq!(reopened.state().total_count, 1);
        assert_eq!(reopened.state().total_price, Decimal::new(500, 0));
    }

    #[tokio::test]
    async fn test_favorites_add_then_remove_round_trip() {
        let mut initial = Favorites::default();
        initial.add_item(favorite(1, 700)).unwrap();
        let persistence = MemoryPersistence::with_state(initial.clone());

        let mut store = PersistedStore::<Favorites, _>::open(persistence)
            .await
            .unwrap();
        store
            .update(|favorites| favorites.add_item(favorite(2, 300)))
            .await
            .unwrap()
            .unwrap();
        store
            .update(|favorites| favorites.remove_item(ProductId::new(2)))
            .await
            .unwrap();

        assert_eq!(store.state().total_count, initial.total_count);
        assert_eq!(store.state().total_price, initial.total_price);
    }
}
