//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    addresses::{Address, AddressBook, AddressId, Cep, CepError, NewAddress},
    auth::{Role, Session, User},
    cart::{
        Cart, CartError, CartLine, CartState, LineKey, NewCartLine,
        store::{CartEvent, CartListener, CartStore, create_cart_store},
    },
    catalog::{Catalog, CatalogError},
    checkout::{
        CheckoutError, CheckoutSnapshot, GatewayError, OrderConfirmation, OrderDraft,
        OrderGateway, OrderId, PaymentMethod, StoreOrderGateway, place_order,
    },
    persistence::{
        CART_STORAGE_KEY, KeyValueStore, PersistenceError, StorageError, file::FileStore,
        listener::{PersistCart, load_cart, save_cart},
        memory::MemoryStore,
        snapshot::SnapshotError,
    },
    pricing::PriceError,
    products::{Product, ProductId, SelectionError},
};
