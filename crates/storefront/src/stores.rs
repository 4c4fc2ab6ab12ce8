//! Session-backed persistence for the cart and favorites.
//!
//! The reducers live in `promtech_core::stores`; this module binds them to
//! the visitor's `tower-sessions` session so every mutation is saved before
//! the response goes out.

use std::marker::PhantomData;

use promtech_core::stores::{Cart, Favorites, PersistedStore, Persistence};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

/// Session key holding the cart.
pub const CART_KEY: &str = "cart";

/// Session key holding the favorites.
pub const FAVORITES_KEY: &str = "favorites";

/// Stores a value under one session key.
#[derive(Debug, Clone)]
pub struct SessionPersistence<T> {
    session: Session,
    key: &'static str,
    _state: PhantomData<fn() -> T>,
}

impl<T> SessionPersistence<T> {
    #[must_use]
    pub const fn new(session: Session, key: &'static str) -> Self {
        Self {
            session,
            key,
            _state: PhantomData,
        }
    }
}

impl<T> Persistence<T> for SessionPersistence<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Error = tower_sessions::session::Error;

    async fn load(&self) -> Result<Option<T>, Self::Error> {
        self.session.get(self.key).await
    }

    async fn save(&self, state: &T) -> Result<(), Self::Error> {
        self.session.insert(self.key, state).await
    }
}

pub type CartStore = PersistedStore<Cart, SessionPersistence<Cart>>;
pub type FavoritesStore = PersistedStore<Favorites, SessionPersistence<Favorites>>;

/// Open the visitor's cart.
///
/// # Errors
///
/// Returns the session error if the stored cart cannot be read.
pub async fn open_cart(session: Session) -> Result<CartStore, tower_sessions::session::Error> {
    PersistedStore::open(SessionPersistence::new(session, CART_KEY)).await
}

/// Open the visitor's favorites.
///
/// # Errors
///
/// Returns the session error if the stored favorites cannot be read.
pub async fn open_favorites(
    session: Session,
) -> Result<FavoritesStore, tower_sessions::session::Error> {
    PersistedStore::open(SessionPersistence::new(session, FAVORITES_KEY)).await
}
