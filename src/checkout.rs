//! Checkout
//!
//! Hands an immutable copy of the cart to the order backend and clears the cart
//! only once the backend has accepted the order.

use std::{fmt, num::NonZeroU32};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    addresses::{Address, AddressBook},
    auth::User,
    cart::{CartLine, store::CartStore},
    persistence::{KeyValueStore, PersistenceError, load_record, save_record},
    pricing::format_amount,
    products::ProductId,
};

/// Key under which simulated orders are stored.
pub const ORDERS_STORAGE_KEY: &str = "orders";

/// Size recorded on order items for products without size variants.
pub const SINGLE_SIZE: &str = "Único";

/// Errors placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("sign in to check out")]
    NotAuthenticated,

    /// There is nothing to check out.
    #[error("the cart is empty")]
    EmptyCart,

    /// No delivery address has been chosen.
    #[error("choose a delivery address")]
    NoAddressSelected,

    /// The order backend did not accept the order.
    #[error("order was not accepted: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors reported by the order backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Backend refused the order.
    #[error("{0}")]
    Rejected(String),

    /// Order could not be recorded.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Existing order history could not be read.
    #[error("stored orders are unreadable: {0}")]
    History(#[source] PersistenceError),
}

/// Cart contents at the moment checkout starts.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSnapshot {
    /// Lines in cart order.
    pub lines: Vec<CartLine>,

    /// Subtotal of `lines`.
    pub subtotal: Money<'static, Currency>,
}

/// How the order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,

    /// Credit card.
    CreditCard,
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment.
    Pending,
}

/// Order identifier assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Ordered product.
    pub product_id: ProductId,

    /// Units ordered.
    pub quantity: NonZeroU32,

    /// Unit price, as a decimal amount.
    pub price: String,

    /// Chosen size, or [`SINGLE_SIZE`].
    pub selected_size: String,

    /// Product name.
    pub name: String,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        OrderItem {
            product_id: line.product_id(),
            quantity: line.quantity(),
            price: format_amount(line.unit_price()),
            selected_size: line.selected_size().unwrap_or(SINGLE_SIZE).to_string(),
            name: line.name().to_string(),
        }
    }
}

/// Order as submitted to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Buyer.
    pub user_id: String,

    /// Order total, as a decimal amount. Shipping is free.
    pub total: String,

    /// Currency of `total` and item prices.
    pub currency: String,

    /// Order status.
    pub status: OrderStatus,

    /// Payment method.
    pub payment_method: PaymentMethod,

    /// Delivery address at the time of ordering.
    pub address_snapshot: Address,

    /// Ordered items.
    pub items: Vec<OrderItem>,
}

impl OrderDraft {
    /// Build a pending order for `user` from a checkout snapshot.
    pub fn new(
        snapshot: &CheckoutSnapshot,
        user: &User,
        address: &Address,
        payment_method: PaymentMethod,
    ) -> Self {
        OrderDraft {
            user_id: user.id.clone(),
            total: format_amount(&snapshot.subtotal),
            currency: snapshot.subtotal.currency().iso_alpha_code.to_string(),
            status: OrderStatus::Pending,
            payment_method,
            address_snapshot: address.clone(),
            items: snapshot.lines.iter().map(OrderItem::from).collect(),
        }
    }
}

/// Accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    /// Backend order id.
    pub id: OrderId,

    /// Amount charged.
    pub total: Money<'static, Currency>,
}

/// Order backend.
pub trait OrderGateway {
    /// Submit an order, returning its id once accepted.
    ///
    /// # Errors
    ///
    /// Returns a `GatewayError` if the order is not accepted.
    fn submit(&mut self, order: &OrderDraft) -> Result<OrderId, GatewayError>;
}

/// Stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOrder {
    /// Order id.
    pub id: OrderId,

    /// Submitted order.
    #[serde(flatten)]
    pub order: OrderDraft,
}

/// Simulated order backend recording orders in the durable medium.
#[derive(Debug)]
pub struct StoreOrderGateway<S> {
    store: S,
}

impl<S: KeyValueStore> StoreOrderGateway<S> {
    /// Record orders in `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All recorded orders, oldest first. Unreadable history lists as empty;
    /// [`OrderGateway::submit`] refuses to write over it.
    pub fn orders(&self) -> Vec<StoredOrder> {
        load_record(&self.store, ORDERS_STORAGE_KEY).unwrap_or_default()
    }

    fn history(&self) -> Result<Vec<StoredOrder>, PersistenceError> {
        match self.store.get(ORDERS_STORAGE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Orders placed by `user_id`, oldest first.
    pub fn orders_for(&self, user_id: &str) -> Vec<StoredOrder> {
        self.orders()
            .into_iter()
            .filter(|stored| stored.order.user_id == user_id)
            .collect()
    }
}

impl<S: KeyValueStore> OrderGateway for StoreOrderGateway<S> {
    fn submit(&mut self, order: &OrderDraft) -> Result<OrderId, GatewayError> {
        if order.items.is_empty() {
            return Err(GatewayError::Rejected("order has no items".to_string()));
        }

        let mut orders = self.history().map_err(GatewayError::History)?;
        let id = OrderId(
            orders
                .iter()
                .map(|stored| stored.id.0)
                .max()
                .map_or(1, |max| max.saturating_add(1)),
        );

        orders.push(StoredOrder {
            id,
            order: order.clone(),
        });

        save_record(&mut self.store, ORDERS_STORAGE_KEY, &orders)?;

        Ok(id)
    }
}

/// Place an order for the cart contents.
///
/// The cart is cleared only after the gateway accepts the order; on any
/// failure it is left exactly as it was.
///
/// # Errors
///
/// Returns a `CheckoutError` if nobody is signed in, the cart is empty, no
/// address is selected, or the gateway does not accept the order.
pub fn place_order<G>(
    cart: &mut CartStore,
    user: Option<&User>,
    addresses: &AddressBook,
    payment_method: PaymentMethod,
    gateway: &mut G,
) -> Result<OrderConfirmation, CheckoutError>
where
    G: OrderGateway + ?Sized,
{
    let user = user.ok_or(CheckoutError::NotAuthenticated)?;
    let snapshot = cart.checkout_snapshot().ok_or(CheckoutError::EmptyCart)?;
    let address = addresses
        .selected()
        .ok_or(CheckoutError::NoAddressSelected)?;

    let draft = OrderDraft::new(&snapshot, user, address, payment_method);

    let id = gateway.submit(&draft).inspect_err(|err| {
        warn!(user = %user.id, error = %err, "order submission failed, keeping cart");
    })?;

    info!(
        order = %id,
        user = %user.id,
        total = %draft.total,
        method = ?payment_method,
        "order placed"
    );

    cart.order_confirmed();

    Ok(OrderConfirmation {
        id,
        total: snapshot.subtotal,
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::BRL;
    use testresult::TestResult;

    use crate::{
        addresses::{Cep, NewAddress},
        auth::Role,
        cart::NewCartLine,
        persistence::memory::MemoryStore,
    };

    use super::*;

    struct RejectingGateway;

    impl OrderGateway for RejectingGateway {
        fn submit(&mut self, _order: &OrderDraft) -> Result<OrderId, GatewayError> {
            Err(GatewayError::Rejected("payment declined".to_string()))
        }
    }

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            role: Role::Customer,
        }
    }

    fn addresses() -> TestResult<AddressBook> {
        let mut book = AddressBook::default();

        book.add(NewAddress {
            recipient_name: "Ana".to_string(),
            cep: Cep::parse("01310-100")?,
            street: "Av. Paulista".to_string(),
            number: "1000".to_string(),
            complement: String::new(),
            neighborhood: "Bela Vista".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
        });

        Ok(book)
    }

    fn cart() -> CartStore {
        let mut cart = CartStore::empty(BRL);

        cart.add_line(NewCartLine::new(
            ProductId(1),
            "Camiseta Oversized Essential",
            Money::from_minor(9990, BRL),
        ));
        cart.add_line(
            NewCartLine::new(ProductId(2), "Camiseta Bear", Money::from_minor(11990, BRL))
                .with_size("M"),
        );

        cart
    }

    #[test]
    fn draft_carries_items_and_total() -> TestResult {
        let cart = cart();
        let snapshot = cart.checkout_snapshot().ok_or("empty cart")?;
        let book = addresses()?;
        let address = book.selected().ok_or("no address")?;

        let draft = OrderDraft::new(&snapshot, &user(), address, PaymentMethod::Pix);

        assert_eq!(draft.total, "219.80");
        assert_eq!(draft.currency, "BRL");
        assert_eq!(draft.status, OrderStatus::Pending);
        assert_eq!(draft.items.len(), 2);
        assert_eq!(
            draft.items.first().map(|item| item.selected_size.as_str()),
            Some(SINGLE_SIZE)
        );
        assert_eq!(
            draft.items.get(1).map(|item| item.selected_size.as_str()),
            Some("M")
        );

        Ok(())
    }

    #[test]
    fn successful_order_clears_cart() -> TestResult {
        let mut cart = cart();
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());

        let confirmation = place_order(
            &mut cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::CreditCard,
            &mut gateway,
        )?;

        assert_eq!(confirmation.id, OrderId(1));
        assert_eq!(confirmation.total, Money::from_minor(21980, BRL));
        assert!(cart.cart().is_empty());
        assert_eq!(gateway.orders_for("u-1").len(), 1);

        Ok(())
    }

    #[test]
    fn order_ids_increase() -> TestResult {
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());

        for expected in 1..=3 {
            let mut cart = cart();
            let confirmation = place_order(
                &mut cart,
                Some(&user()),
                &addresses()?,
                PaymentMethod::Pix,
                &mut gateway,
            )?;

            assert_eq!(confirmation.id, OrderId(expected));
        }

        assert_eq!(gateway.orders().len(), 3);

        Ok(())
    }

    #[test]
    fn unreadable_history_is_not_overwritten() -> TestResult {
        let corrupt = r#"[{"id": 41, "user_id": "u-1""#;
        let store = MemoryStore::with_entry(ORDERS_STORAGE_KEY, corrupt);
        let mut gateway = StoreOrderGateway::new(store.clone());
        let mut cart = cart();

        let result = place_order(
            &mut cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::Pix,
            &mut gateway,
        );

        assert!(matches!(
            result,
            Err(CheckoutError::Gateway(GatewayError::History(_)))
        ));
        assert_eq!(cart.item_count(), 2);
        assert_eq!(store.get(ORDERS_STORAGE_KEY)?.as_deref(), Some(corrupt));

        Ok(())
    }

    #[test]
    fn order_ids_continue_after_highest() -> TestResult {
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());
        let mut first_cart = cart();

        place_order(
            &mut first_cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::Pix,
            &mut gateway,
        )?;

        let mut orders = gateway.orders();

        if let Some(first) = orders.first_mut() {
            first.id = OrderId(41);
        }

        save_record(&mut gateway.store, ORDERS_STORAGE_KEY, &orders)?;

        let mut cart = cart();
        let confirmation = place_order(
            &mut cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::Pix,
            &mut gateway,
        )?;

        assert_eq!(confirmation.id, OrderId(42));
        assert_eq!(gateway.orders().len(), 2);

        Ok(())
    }

    #[test]
    fn failed_submission_keeps_cart() -> TestResult {
        let mut cart = cart();
        let before = cart.cart().clone();

        let result = place_order(
            &mut cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::Pix,
            &mut RejectingGateway,
        );

        assert!(matches!(
            result,
            Err(CheckoutError::Gateway(GatewayError::Rejected(_)))
        ));
        assert_eq!(cart.cart(), &before);

        Ok(())
    }

    #[test]
    fn checkout_requires_user() -> TestResult {
        let mut cart = cart();
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());

        let result = place_order(
            &mut cart,
            None,
            &addresses()?,
            PaymentMethod::Pix,
            &mut gateway,
        );

        assert!(matches!(result, Err(CheckoutError::NotAuthenticated)));
        assert_eq!(cart.item_count(), 2);
        assert!(gateway.orders().is_empty());

        Ok(())
    }

    #[test]
    fn checkout_requires_items() -> TestResult {
        let mut cart = CartStore::empty(BRL);
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());

        let result = place_order(
            &mut cart,
            Some(&user()),
            &addresses()?,
            PaymentMethod::Pix,
            &mut gateway,
        );

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));

        Ok(())
    }

    #[test]
    fn checkout_requires_address() {
        let mut cart = cart();
        let mut gateway = StoreOrderGateway::new(MemoryStore::new());

        let result = place_order(
            &mut cart,
            Some(&user()),
            &AddressBook::default(),
            PaymentMethod::Pix,
            &mut gateway,
        );

        assert!(matches!(result, Err(CheckoutError::NoAddressSelected)));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn payment_method_serialises_in_snake_case() -> TestResult {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard)?,
            r#""credit_card""#
        );

        Ok(())
    }
}
