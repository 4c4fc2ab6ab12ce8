//! Currency codes and human-readable price formatting.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes the storefront deals with.
///
/// Catalog prices are always in roubles; the other codes exist for the
/// exchange-rate widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    RUB,
    USD,
    EUR,
    CNY,
}

impl CurrencyCode {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::RUB => "RUB",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::CNY => "CNY",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::RUB => "₽",
            Self::USD => "$",
            Self::EUR => "€",
            Self::CNY => "¥",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned for unsupported currency codes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RUB" | "RUR" => Ok(Self::RUB),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "CNY" => Ok(Self::CNY),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// Format an amount the way Russian price tags read: space-grouped thousands,
/// comma decimals (omitted for whole amounts) and a trailing symbol.
///
/// ```
/// use promtech_core::{CurrencyCode, format_amount};
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(1_234_500, 0), CurrencyCode::RUB), "1 234 500 ₽");
/// assert_eq!(format_amount(Decimal::new(99_950, 2), CurrencyCode::RUB), "999,50 ₽");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let abs = rounded.abs();
    let whole = abs.trunc();
    let fraction = ((abs - whole) * Decimal::ONE_HUNDRED).trunc();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }

    if fraction.is_zero() {
        format!("{sign}{grouped} {}", currency.symbol())
    } else {
        format!("{sign}{grouped},{:0>2} {}", fraction.to_string(), currency.symbol())
    }
}
