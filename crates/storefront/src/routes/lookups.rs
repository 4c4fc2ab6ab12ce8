//! Small lookup endpoints: exchange rates, reverse geocoding and cities.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use promtech_core::CurrencyCode;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::{DataResponse, data, data_with_meta};
use crate::services::{City, CityPage, Coordinates, CurrencyRate, GeoLocation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

fn parse_currency(code: Option<&str>) -> Result<CurrencyCode> {
    match code.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(CurrencyCode::USD),
        Some(code) => code
            .parse::<CurrencyCode>()
            .map_err(|e| AppError::BadRequest(e.to_string())),
    }
}

/// Roubles per one unit of a foreign currency.
#[instrument(skip(state))]
pub async fn currency_rate(
    State(state): State<AppState>,
    query: std::result::Result<Query<CurrencyQuery>, QueryRejection>,
) -> Result<Json<DataResponse<CurrencyRate>>> {
    let Query(query) = query?;
    let code = parse_currency(query.code.as_deref())?;
    let rate = state.currency().rate(code).await?;
    Ok(data(rate))
}

/// City and region for a pair of coordinates.
#[instrument(skip(state, query))]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    query: std::result::Result<Query<ReverseQuery>, QueryRejection>,
) -> Result<Json<DataResponse<GeoLocation>>> {
    let Query(query) = query?;
    let at = Coordinates::new(query.lat, query.lon)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let location = state.geo().reverse(at).await?;
    Ok(data(location))
}

/// Search the city directory.
#[instrument(skip(state))]
pub async fn cities(
    State(state): State<AppState>,
    query: std::result::Result<Query<CitiesQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Vec<City>, CityPage>>> {
    let Query(query) = query?;
    let (items, meta) = state
        .cities()
        .search(&query.q, query.page, query.page_size);
    Ok(data_with_meta(items.into_iter().cloned().collect(), meta))
}
