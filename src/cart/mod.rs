//! Cart

use std::num::NonZeroU32;

use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::warn;

use crate::pricing::total_price;

mod line;
pub mod store;

pub use line::{CartLine, LineKey, NewCartLine};

/// Errors related to cart construction.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The same product and size appeared on more than one line.
    #[error("duplicate cart line {0}")]
    DuplicateLine(LineKey),

    /// A line was priced in a currency other than the cart's.
    #[error("cart line {line} is priced in {found}, cart is in {expected}")]
    CurrencyMismatch {
        /// Offending line
        line: LineKey,
        /// Cart currency
        expected: String,
        /// Line currency
        found: String,
    },

    /// A line had a negative unit price.
    #[error("cart line {0} has a negative price")]
    NegativePrice(LineKey),
}

/// Observable cart state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// No lines.
    Empty,

    /// At least one line.
    NonEmpty,
}

/// Shopping cart: ordered lines, at most one per product and size.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: &'static Currency,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a cart with the given lines, in order.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if two lines share the same key.
    pub fn with_lines(
        currency: &'static Currency,
        lines: impl IntoIterator<Item = CartLine>,
    ) -> Result<Self, CartError> {
        let mut cart = Cart::new(currency);

        for line in lines {
            check_price(currency, line.key(), line.unit_price())?;

            if cart.position(line.key()).is_some() {
                return Err(CartError::DuplicateLine(line.key().clone()));
            }

            cart.lines.push(line);
        }

        Ok(cart)
    }

    /// Add a product snapshot.
    ///
    /// Merges into the existing line for the same product and size, keeping
    /// its position; otherwise appends a new line. Returns the line's new
    /// quantity, or `None` if the snapshot is priced in another currency or
    /// below zero, in which case the cart is left unchanged.
    pub fn add_line(&mut self, candidate: NewCartLine) -> Option<NonZeroU32> {
        if let Err(err) = check_price(self.currency, &candidate.key, &candidate.unit_price) {
            warn!(error = %err, "ignoring cart line");

            return None;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.key() == &candidate.key)
        {
            line.increase(candidate.quantity);

            return Some(line.quantity());
        }

        let line = CartLine::from_new(candidate);
        let quantity = line.quantity();

        self.lines.push(line);

        Some(quantity)
    }

    /// Take one unit off a line, never going below one.
    ///
    /// Returns `true` if the quantity changed. Unknown keys are ignored.
    pub fn decrease_qty(&mut self, key: &LineKey) -> bool {
        self.lines
            .iter_mut()
            .find(|line| line.key() == key)
            .is_some_and(CartLine::decrease)
    }

    /// Remove a line regardless of quantity.
    ///
    /// Returns the removed line. Unknown keys are ignored.
    pub fn remove_line(&mut self, key: &LineKey) -> Option<CartLine> {
        self.position(key).map(|idx| self.lines.remove(idx))
    }

    /// Remove every line. Returns `true` if there was anything to remove.
    pub fn clear(&mut self) -> bool {
        let had_lines = !self.lines.is_empty();

        self.lines.clear();

        had_lines
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a line by key.
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.key() == key)
    }

    /// Sum of unit price times quantity over all lines, computed on demand.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        total_price(self.lines.iter().map(CartLine::line_total), self.currency)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity().get()))
            .sum()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Observable state of the cart.
    pub fn state(&self) -> CartState {
        if self.is_empty() {
            CartState::Empty
        } else {
            CartState::NonEmpty
        }
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.lines.iter().position(|line| line.key() == key)
    }
}

fn check_price(
    currency: &Currency,
    key: &LineKey,
    price: &Money<'static, Currency>,
) -> Result<(), CartError> {
    if price.currency() != currency {
        return Err(CartError::CurrencyMismatch {
            line: key.clone(),
            expected: currency.iso_alpha_code.to_string(),
            found: price.currency().iso_alpha_code.to_string(),
        });
    }

    if price.to_minor_units() < 0 {
        return Err(CartError::NegativePrice(key.clone()));
    }

    Ok(())
}
