//! Storefront
//!
//! Client-side state for a storefront: the shopping cart store and its durable
//! snapshot, the product catalog it snapshots from, the signed-in session,
//! delivery addresses and the checkout hand-off to the order backend.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod persistence;
pub mod prelude;
pub mod pricing;
pub mod products;
