//! Cart Store
//!
//! The store is the single owner and mutator of a [`Cart`]. Every mutation that
//! changes the cart is announced to subscribed listeners before the call
//! returns, so a persistence listener always sees the state the caller sees.

use std::{fmt, num::NonZeroU32};

use rusty_money::{Money, iso::Currency};
use tracing::{debug, info};

use crate::{
    cart::{Cart, CartLine, CartState, LineKey, NewCartLine},
    checkout::CheckoutSnapshot,
    persistence::{
        KeyValueStore,
        listener::{PersistCart, load_cart},
    },
};

/// A change applied to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// Units were added to a line (new or merged).
    Added {
        /// Line that changed.
        key: LineKey,
        /// Quantity after the change.
        quantity: NonZeroU32,
    },

    /// One unit was taken off a line.
    Decreased {
        /// Line that changed.
        key: LineKey,
        /// Quantity after the change.
        quantity: NonZeroU32,
    },

    /// A line was removed.
    Removed {
        /// Line that was removed.
        key: LineKey,
    },

    /// All lines were removed.
    Cleared,
}

/// Receives a notification after each cart mutation.
pub trait CartListener {
    /// Called with the event and the cart as it is after the change.
    fn on_change(&mut self, event: &CartEvent, cart: &Cart);
}

impl<F> CartListener for F
where
    F: FnMut(&CartEvent, &Cart),
{
    fn on_change(&mut self, event: &CartEvent, cart: &Cart) {
        self(event, cart);
    }
}

/// Cart Store
pub struct CartStore {
    cart: Cart,
    listeners: Vec<Box<dyn CartListener>>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Create the application's cart store.
///
/// Rehydrates the cart from `storage` (an empty cart when there is no usable
/// snapshot) and subscribes a listener that writes the snapshot back after
/// every mutation.
pub fn create_cart_store<S>(storage: S, currency: &'static Currency) -> CartStore
where
    S: KeyValueStore + 'static,
{
    let cart = load_cart(&storage, currency);

    info!(
        lines = cart.len(),
        items = cart.item_count(),
        "cart store ready"
    );

    let mut store = CartStore::new(cart);

    store.subscribe(PersistCart::new(storage));

    store
}

impl CartStore {
    /// Create a store around an existing cart, with no listeners.
    pub fn new(cart: Cart) -> Self {
        Self {
            cart,
            listeners: Vec::new(),
        }
    }

    /// Create a store around an empty cart.
    pub fn empty(currency: &'static Currency) -> Self {
        Self::new(Cart::new(currency))
    }

    /// Register a listener. Listeners are notified in subscription order.
    pub fn subscribe(&mut self, listener: impl CartListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Add a product snapshot, merging with an existing line for the same
    /// product and size. A snapshot priced in another currency or below zero
    /// is ignored.
    pub fn add_line(&mut self, candidate: NewCartLine) {
        let key = candidate.key().clone();

        if let Some(quantity) = self.cart.add_line(candidate) {
            self.emit(&CartEvent::Added { key, quantity });
        }
    }

    /// Take one unit off a line. A line at quantity one is left alone; use
    /// [`CartStore::remove_line`] to delete it.
    pub fn decrease_qty(&mut self, key: &LineKey) {
        if !self.cart.decrease_qty(key) {
            debug!(line = %key, "decrease ignored");
            return;
        }

        if let Some(line) = self.cart.line(key) {
            let event = CartEvent::Decreased {
                key: key.clone(),
                quantity: line.quantity(),
            };

            self.emit(&event);
        }
    }

    /// Remove a line entirely. Unknown keys are ignored.
    pub fn remove_line(&mut self, key: &LineKey) {
        if self.cart.remove_line(key).is_none() {
            debug!(line = %key, "remove ignored");
            return;
        }

        self.emit(&CartEvent::Removed { key: key.clone() });
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        if self.cart.clear() {
            self.emit(&CartEvent::Cleared);
        }
    }

    /// Signal from the order backend that the checked-out order was accepted.
    pub fn order_confirmed(&mut self) {
        info!(items = self.cart.item_count(), "order confirmed, clearing cart");

        self.clear();
    }

    /// Immutable copy of the lines and subtotal for checkout.
    ///
    /// Returns `None` when the cart is empty.
    pub fn checkout_snapshot(&self) -> Option<CheckoutSnapshot> {
        if self.cart.is_empty() {
            return None;
        }

        Some(CheckoutSnapshot {
            lines: self.cart.lines().to_vec(),
            subtotal: self.cart.subtotal(),
        })
    }

    /// Read-only view of the cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Current subtotal.
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.cart.subtotal()
    }

    /// Total units in the cart.
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Observable state of the cart.
    pub fn state(&self) -> CartState {
        self.cart.state()
    }

    fn emit(&mut self, event: &CartEvent) {
        debug!(?event, items = self.cart.item_count(), "cart changed");

        for listener in &mut self.listeners {
            listener.on_change(event, &self.cart);
        }
    }
}
