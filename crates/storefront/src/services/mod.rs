//! Clients for everything outside the CMS.
//!
//! # Services
//!
//! - `telegram` - Lead and order notifications through the bot API
//! - `currency` - Daily exchange rates for the price widget
//! - `geo` - Reverse geocoding for the city picker
//! - `cities` - Local city directory with Russian-aware search

pub mod cities;
pub mod currency;
pub mod geo;
pub mod telegram;

pub use cities::{City, CityDirectory, CityPage};
pub use currency::{CurrencyRate, CurrencyService};
pub use geo::{Coordinates, GeoLocation, GeoService, InvalidCoordinates};
pub use telegram::{MAX_MESSAGE_LENGTH, NotifyError, TelegramClient, TelegramMessage};

use thiserror::Error;

/// Errors from third-party lookups (exchange rates, geocoder).
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response lacked the requested data.
    #[error("Missing data: {0}")]
    Missing(String),
}

/// Send a GET request and decode a JSON body, mapping failures to `UpstreamError`.
async fn get_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Api {
            status: status.as_u16(),
            message: message.chars().take(200).collect(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::Parse(e.to_string()))
}
