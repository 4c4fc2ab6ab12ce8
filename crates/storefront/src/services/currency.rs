//! Daily exchange rates for the price widget.
//!
//! Reads the central bank's daily JSON document and reports how many roubles
//! one unit of a foreign currency costs. Rates are cached for an hour in the
//! [`TwoTierCache`].

use std::collections::HashMap;
use std::time::Duration;

use promtech_core::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{UpstreamError, get_json};
use crate::cache::TwoTierCache;

const RATE_TTL: Duration = Duration::from_secs(3600);

/// Roubles per one unit of `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub code: CurrencyCode,
    pub rate: Decimal,
    /// Date the upstream published the rate, as reported.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DailyRates {
    #[serde(default)]
    date: Option<String>,
    valute: HashMap<String, Valute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Valute {
    nominal: u32,
    value: Decimal,
}

/// Exchange rate lookups.
#[derive(Clone)]
pub struct CurrencyService {
    client: reqwest::Client,
    url: String,
    cache: TwoTierCache,
}

impl CurrencyService {
    #[must_use]
    pub const fn new(client: reqwest::Client, url: String, cache: TwoTierCache) -> Self {
        Self { client, url, cache }
    }

    /// Current rate for `code`. Roubles are always `1`.
    ///
    /// # Errors
    ///
    /// Returns error if the upstream fails or does not list the currency.
    #[instrument(skip(self))]
    pub async fn rate(&self, code: CurrencyCode) -> Result<CurrencyRate, UpstreamError> {
        if code == CurrencyCode::RUB {
            return Ok(CurrencyRate {
                code,
                rate: Decimal::ONE,
                date: None,
            });
        }

        let key = format!("currency-rate:{code}");
        if let Some(rate) = self.cache.get::<CurrencyRate>(&key, None).await {
            return Ok(rate);
        }

        let daily: DailyRates = get_json(self.client.get(&self.url)).await?;
        let rate = extract_rate(daily, code)?;
        self.cache.set(&key, &rate, RATE_TTL, None).await;
        Ok(rate)
    }
}

fn extract_rate(daily: DailyRates, code: CurrencyCode) -> Result<CurrencyRate, UpstreamError> {
    let valute = daily
        .valute
        .get(code.code())
        .ok_or_else(|| UpstreamError::Missing(format!("no rate for {code}")))?;

    if valute.nominal == 0 {
        return Err(UpstreamError::Parse(format!("zero nominal for {code}")));
    }

    Ok(CurrencyRate {
        code,
        rate: (valute.value / Decimal::from(valute.nominal)).round_dp(4),
        date: daily.date,
    })
}
