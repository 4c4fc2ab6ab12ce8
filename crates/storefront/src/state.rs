//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::TwoTierCache;
use crate::cms::{CmsClient, CmsError};
use crate::config::StorefrontConfig;
use crate::services::{
    CityDirectory, CurrencyService, GeoService, NotifyError, TelegramClient, UpstreamError,
};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("CMS client: {0}")]
    Cms(#[from] CmsError),
    #[error("notification client: {0}")]
    Notify(#[from] NotifyError),
    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// upstream clients, the shared cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cms: CmsClient,
    telegram: TelegramClient,
    cache: TwoTierCache,
    currency: CurrencyService,
    geo: GeoService,
    cities: CityDirectory,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients cannot be built.
    pub fn new(config: StorefrontConfig, cities: CityDirectory) -> Result<Self, StateError> {
        let cms = CmsClient::new(&config.cms)?;
        let telegram = TelegramClient::new(&config.telegram)?;
        let cache = TwoTierCache::from_config(&config.cache);
        let currency = CurrencyService::new(
            reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .map_err(UpstreamError::from)?,
            config.upstreams.currency_url.clone(),
            cache.clone(),
        );
        let geo = GeoService::new(config.upstreams.geocoder_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                cms,
                telegram,
                cache,
                currency,
                geo,
                cities,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }

    /// Get a reference to the notification bot client.
    #[must_use]
    pub fn telegram(&self) -> &TelegramClient {
        &self.inner.telegram
    }

    /// Get a reference to the two-tier catalog cache.
    #[must_use]
    pub fn cache(&self) -> &TwoTierCache {
        &self.inner.cache
    }

    /// Get a reference to the exchange rate service.
    #[must_use]
    pub fn currency(&self) -> &CurrencyService {
        &self.inner.currency
    }

    /// Get a reference to the reverse geocoder.
    #[must_use]
    pub fn geo(&self) -> &GeoService {
        &self.inner.geo
    }

    /// Get a reference to the city directory.
    #[must_use]
    pub fn cities(&self) -> &CityDirectory {
        &self.inner.cities
    }
}
