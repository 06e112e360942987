//! Cart persistence listener

use rusty_money::iso::Currency;
use tracing::{debug, error, info, warn};

use crate::{
    cart::{
        Cart,
        store::{CartEvent, CartListener},
    },
    persistence::{CART_STORAGE_KEY, KeyValueStore, PersistenceError, snapshot},
};

/// Rehydrate the cart from `store`.
///
/// Never fails: a missing, unreadable or corrupt snapshot, or one priced in a
/// different currency, yields an empty cart.
pub fn load_cart<S>(store: &S, currency: &'static Currency) -> Cart
where
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(CART_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no stored cart, starting empty");
            return Cart::new(currency);
        }
        Err(err) => {
            warn!(error = %err, "failed to read stored cart, starting empty");
            return Cart::new(currency);
        }
    };

    match snapshot::decode(&raw) {
        Ok(cart) if cart.currency() == currency => {
            info!(lines = cart.len(), "rehydrated cart");
            cart
        }
        Ok(cart) => {
            warn!(
                stored = cart.currency().iso_alpha_code,
                expected = currency.iso_alpha_code,
                "stored cart uses another currency, starting empty"
            );
            Cart::new(currency)
        }
        Err(err) => {
            warn!(error = %err, "discarding corrupt cart snapshot");
            Cart::new(currency)
        }
    }
}

/// Write the cart snapshot to `store`.
///
/// # Errors
///
/// Returns a `PersistenceError` if the snapshot cannot be encoded or written.
pub fn save_cart<S>(store: &mut S, cart: &Cart) -> Result<(), PersistenceError>
where
    S: KeyValueStore + ?Sized,
{
    let raw = snapshot::encode(cart)?;

    store.set(CART_STORAGE_KEY, &raw)?;

    Ok(())
}

/// Listener writing the cart snapshot after every change.
#[derive(Debug)]
pub struct PersistCart<S> {
    store: S,
}

impl<S: KeyValueStore> PersistCart<S> {
    /// Persist into `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> CartListener for PersistCart<S> {
    fn on_change(&mut self, event: &CartEvent, cart: &Cart) {
        match save_cart(&mut self.store, cart) {
            Ok(()) => debug!(?event, lines = cart.len(), "persisted cart"),
            Err(err) => error!(?event, error = %err, "failed to persist cart"),
        }
    }
}
