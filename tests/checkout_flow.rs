//! Checkout hand-off between the cart store and the order backend.

use std::{cell::RefCell, rc::Rc};

use rusty_money::{Money, iso::BRL};
use testresult::TestResult;

use storefront::prelude::*;

/// Gateway that fails the first `failures` submissions, then records orders.
struct FlakyGateway {
    failures: u32,
    inner: StoreOrderGateway<MemoryStore>,
}

impl OrderGateway for FlakyGateway {
    fn submit(&mut self, order: &OrderDraft) -> Result<OrderId, GatewayError> {
        if self.failures > 0 {
            self.failures -= 1;

            return Err(GatewayError::Rejected("backend unavailable".to_string()));
        }

        self.inner.submit(order)
    }
}

fn user() -> User {
    User {
        id: "u-7".to_string(),
        email: "bruno@example.com".to_string(),
        name: "Bruno".to_string(),
        role: Role::Customer,
    }
}

fn addresses() -> TestResult<AddressBook> {
    let mut book = AddressBook::default();

    book.add(NewAddress {
        recipient_name: "Bruno".to_string(),
        cep: Cep::parse("20040-002")?,
        street: "Rua da Assembleia".to_string(),
        number: "10".to_string(),
        complement: "sala 301".to_string(),
        neighborhood: "Centro".to_string(),
        city: "Rio de Janeiro".to_string(),
        state: "RJ".to_string(),
    });

    Ok(book)
}

#[test]
fn failed_submission_keeps_cart_until_retry_succeeds() -> TestResult {
    let storage = MemoryStore::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut cart = create_cart_store(storage.clone(), BRL);

    cart.subscribe({
        let events = Rc::clone(&events);
        move |event: &CartEvent, _cart: &Cart| events.borrow_mut().push(event.clone())
    });

    cart.add_line(
        NewCartLine::new(ProductId(4), "Conjunto Strong", Money::from_minor(18990, BRL))
            .with_size("M"),
    );

    let mut gateway = FlakyGateway {
        failures: 1,
        inner: StoreOrderGateway::new(MemoryStore::new()),
    };
    let book = addresses()?;

    let first = place_order(&mut cart, Some(&user()), &book, PaymentMethod::Pix, &mut gateway);

    assert!(matches!(first, Err(CheckoutError::Gateway(_))));
    assert_eq!(cart.item_count(), 1);
    assert_eq!(load_cart(&storage, BRL).item_count(), 1);

    let confirmation = place_order(&mut cart, Some(&user()), &book, PaymentMethod::Pix, &mut gateway)?;

    assert_eq!(confirmation.total, Money::from_minor(18990, BRL));
    assert!(cart.cart().is_empty());
    assert!(load_cart(&storage, BRL).is_empty());
    assert_eq!(events.borrow().last(), Some(&CartEvent::Cleared));

    let orders = gateway.inner.orders_for("u-7");
    let order = orders.first().ok_or("order not recorded")?;

    assert_eq!(order.id, confirmation.id);
    assert_eq!(order.order.total, "189.90");
    assert_eq!(order.order.address_snapshot.details.city, "Rio de Janeiro");
    assert_eq!(
        order.order.items.first().map(|item| item.selected_size.as_str()),
        Some("M")
    );

    Ok(())
}

#[test]
fn snapshot_is_detached_from_later_changes() -> TestResult {
    let mut cart = CartStore::empty(BRL);

    cart.add_line(NewCartLine::new(ProductId(5), "Coqueteleira", Money::from_minor(3990, BRL)));

    let snapshot = cart.checkout_snapshot().ok_or("empty cart")?;

    cart.add_line(NewCartLine::new(ProductId(5), "Coqueteleira", Money::from_minor(3990, BRL)));

    assert_eq!(snapshot.subtotal, Money::from_minor(3990, BRL));
    assert_eq!(snapshot.lines.first().map(|line| line.quantity().get()), Some(1));
    assert_eq!(cart.item_count(), 2);

    Ok(())
}
