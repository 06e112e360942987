//! Cart snapshots
//!
//! The serialised form of a cart as kept in the durable medium:
//!
//! ```json
//! {"version":1,"currency":"BRL","items":[
//!   {"product_id":2,"selected_size":"M","name":"Camiseta Bear Signature",
//!    "unit_price":"119.90","image_url":"/assets/bear.jpeg",
//!    "category":"oversized","quantity":2}
//! ]}
//! ```
//!
//! The subtotal is never stored; it is recomputed from the items.

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLine, NewCartLine},
    pricing::{self, PriceError, format_amount},
    products::ProductId,
};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors encoding or decoding a cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot is not valid JSON or does not match the expected shape.
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot was written by an unknown format version.
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u32),

    /// Currency or price could not be parsed.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Snapshot lines violate cart invariants.
    #[error(transparent)]
    Cart(#[from] CartError),
}

#[derive(Debug, Serialize, Deserialize)]
struct CartSnapshot {
    version: u32,
    currency: String,
    items: Vec<LineSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LineSnapshot {
    product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_size: Option<String>,
    name: String,
    unit_price: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    category: String,
    quantity: NonZeroU32,
}

impl From<&CartLine> for LineSnapshot {
    fn from(line: &CartLine) -> Self {
        LineSnapshot {
            product_id: line.product_id(),
            selected_size: line.selected_size().map(str::to_string),
            name: line.name().to_string(),
            unit_price: format_amount(line.unit_price()),
            image_url: line.image_url().to_string(),
            category: line.category().to_string(),
            quantity: line.quantity(),
        }
    }
}

impl LineSnapshot {
    fn into_line(self, currency: &'static Currency) -> Result<CartLine, PriceError> {
        let minor_units = pricing::parse_amount(&self.unit_price, currency)?;

        let mut line = NewCartLine::new(
            self.product_id,
            self.name,
            Money::from_minor(minor_units, currency),
        )
        .with_image(self.image_url)
        .with_category(self.category)
        .with_quantity(self.quantity);

        if let Some(size) = self.selected_size {
            line = line.with_size(size);
        }

        Ok(CartLine::from_new(line))
    }
}

/// Serialise a cart.
///
/// # Errors
///
/// Returns a `SnapshotError` if serialisation fails.
pub fn encode(cart: &Cart) -> Result<String, SnapshotError> {
    let snapshot = CartSnapshot {
        version: SNAPSHOT_VERSION,
        currency: cart.currency().iso_alpha_code.to_string(),
        items: cart.lines().iter().map(LineSnapshot::from).collect(),
    };

    Ok(serde_json::to_string(&snapshot)?)
}

/// Deserialise a cart.
///
/// # Errors
///
/// Returns a `SnapshotError` if the snapshot is malformed, from an unknown
/// version, names an unknown currency, holds an invalid price, or repeats a
/// line.
pub fn decode(raw: &str) -> Result<Cart, SnapshotError> {
    let snapshot: CartSnapshot = serde_json::from_str(raw)?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }

    let currency = pricing::currency(&snapshot.currency)?;

    let lines = snapshot
        .items
        .into_iter()
        .map(|item| item.into_line(currency))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart::with_lines(currency, lines)?)
}
