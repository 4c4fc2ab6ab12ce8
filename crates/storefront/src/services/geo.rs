//! Reverse geocoding for the city picker.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use super::{UpstreamError, get_json};

/// Coordinates outside the valid latitude/longitude ranges.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid coordinates: lat={lat}, lon={lon}")]
pub struct InvalidCoordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A validated WGS 84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    /// Validate `lat` in `-90..=90` and `lon` in `-180..=180`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` for out-of-range or non-finite values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinates> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Ok(Self { lat, lon })
        } else {
            Err(InvalidCoordinates { lat, lon })
        }
    }

    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}

/// Place resolved from coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoLocation {
    pub city: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    region: Option<String>,
}

impl From<Address> for GeoLocation {
    fn from(address: Address) -> Self {
        Self {
            city: address.city.or(address.town).or(address.village),
            region: address.state.or(address.region),
        }
    }
}

/// Reverse geocoder client.
#[derive(Clone)]
pub struct GeoService {
    client: reqwest::Client,
    base_url: String,
}

impl GeoService {
    /// Create a geocoder client. Requests identify the storefront in the
    /// `User-Agent` and ask for Russian place names.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: String) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("promtech-storefront/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Resolve coordinates to a city and region.
    ///
    /// # Errors
    ///
    /// Returns error if the geocoder request fails.
    #[instrument(skip(self))]
    pub async fn reverse(&self, at: Coordinates) -> Result<GeoLocation, UpstreamError> {
        let request = self.client.get(format!(
            "{}/reverse?format=jsonv2&zoom=10&lat={}&lon={}",
            self.base_url, at.lat, at.lon
        ));

        let response: ReverseResponse = get_json(request).await?;
        Ok(response.address.map_or(
            GeoLocation {
                city: None,
                region: None,
            },
            GeoLocation::from,
        ))
    }
}
