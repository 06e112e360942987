//! Pricing

use std::num::NonZeroU32;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Errors that can occur while parsing or converting prices.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// Price string was not in the `AMOUNT CURRENCY` form.
    #[error("invalid price format: {0}")]
    InvalidFormat(String),

    /// Amount could not be parsed or does not fit in minor units.
    #[error("invalid price amount: {0}")]
    InvalidAmount(String),

    /// Amount is below zero.
    #[error("negative price: {0}")]
    Negative(String),

    /// Currency code is not an ISO 4217 code known to `rusty_money`.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Look up an ISO currency by its alpha code (e.g. `"BRL"`).
///
/// # Errors
///
/// Returns [`PriceError::UnknownCurrency`] if the code is not recognised.
pub fn currency(code: &str) -> Result<&'static Currency, PriceError> {
    iso::find(code).ok_or_else(|| PriceError::UnknownCurrency(code.to_string()))
}

/// Parse a price string (e.g. `"99.90 BRL"`) into money.
///
/// # Errors
///
/// Returns an error if the string is not in the form `AMOUNT CURRENCY`, if the
/// amount is not a non-negative decimal, or if the currency is unknown.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, PriceError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(PriceError::InvalidFormat(format!(
            "expected 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = currency(code)?;
    let minor_units = parse_amount(amount, currency)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse a bare decimal amount (e.g. `"99.90"`) into minor units of `currency`.
///
/// # Errors
///
/// Returns an error if the amount is not a decimal, is negative, or overflows.
pub fn parse_amount(amount: &str, currency: &Currency) -> Result<i64, PriceError> {
    let value = amount
        .parse::<Decimal>()
        .map_err(|_err| PriceError::InvalidAmount(amount.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(PriceError::Negative(amount.to_string()));
    }

    decimal_to_minor(value, currency).ok_or_else(|| PriceError::InvalidAmount(amount.to_string()))
}

/// Convert a decimal amount into minor units of `currency`, rounding to the
/// currency's exponent.
pub fn decimal_to_minor(value: Decimal, currency: &Currency) -> Option<i64> {
    let scale = 10_i64.checked_pow(currency.exponent)?;

    value
        .checked_mul(Decimal::from(scale))
        .and_then(|scaled| scaled.round_dp(0).to_i64())
}

/// Express minor units of `currency` as a decimal amount (e.g. `9990` BRL is `99.90`).
pub fn minor_to_decimal(minor_units: i64, currency: &Currency) -> Decimal {
    Decimal::new(minor_units, currency.exponent)
}

/// Decimal amount of a money value, formatted with the currency's exponent.
pub fn format_amount(money: &Money<'_, Currency>) -> String {
    minor_to_decimal(money.to_minor_units(), money.currency()).to_string()
}

/// Price of `quantity` units at `unit_price`.
///
/// Saturates rather than overflowing minor units.
pub fn line_total<'a>(
    unit_price: &Money<'a, Currency>,
    quantity: NonZeroU32,
) -> Money<'a, Currency> {
    Money::from_minor(
        unit_price
            .to_minor_units()
            .saturating_mul(i64::from(quantity.get())),
        unit_price.currency(),
    )
}

/// Sum a set of prices in `currency`.
///
/// An empty set sums to zero.
pub fn total_price<'a, I>(prices: I, currency: &'a Currency) -> Money<'a, Currency>
where
    I: IntoIterator<Item = Money<'a, Currency>>,
{
    let total = prices
        .into_iter()
        .fold(0_i64, |acc, price| acc.saturating_add(price.to_minor_units()));

    Money::from_minor(total, currency)
}
