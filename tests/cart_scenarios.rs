//! Cart store walkthrough against a shared in-memory medium.
//!
//! Adds, merges, decreases, removes and clears lines through the store that
//! the application wires up at start, checking the subtotal and item count at
//! each step and that a fresh store rehydrates the same cart.

use rusty_money::{Money, iso::BRL};
use testresult::TestResult;

use storefront::prelude::*;

fn oversized() -> NewCartLine {
    NewCartLine::new(ProductId(1), "Camiseta Oversized Essential", Money::from_minor(9990, BRL))
}

fn shorts() -> NewCartLine {
    NewCartLine::new(ProductId(2), "Shorts Treino Pro", Money::from_minor(5000, BRL))
}

fn recomputed_subtotal(cart: &Cart) -> i64 {
    cart.lines()
        .iter()
        .map(|line| line.unit_price().to_minor_units() * i64::from(line.quantity().get()))
        .sum()
}

#[test]
fn storefront_walkthrough() -> TestResult {
    let storage = MemoryStore::new();
    let mut store = create_cart_store(storage.clone(), BRL);

    assert_eq!(store.state(), CartState::Empty);

    // 1. first add
    store.add_line(oversized());

    assert_eq!(store.lines().len(), 1);
    assert_eq!(store.lines().first().map(|l| l.key().to_string()), Some("1".to_string()));
    assert_eq!(store.subtotal(), Money::from_minor(9990, BRL));

    // 2. same product merges
    store.add_line(oversized());

    assert_eq!(store.lines().len(), 1);
    assert_eq!(store.lines().first().map(|l| l.quantity().get()), Some(2));
    assert_eq!(store.subtotal(), Money::from_minor(19980, BRL));

    // 3. two sizes are two lines
    store.add_line(shorts().with_size("M"));
    store.add_line(shorts().with_size("G"));

    assert_eq!(store.lines().len(), 3);
    assert_eq!(store.subtotal(), Money::from_minor(29980, BRL));

    // 4. decrease floors at one
    let oversized_key = LineKey::product(ProductId(1));

    store.decrease_qty(&oversized_key);

    assert_eq!(store.cart().line(&oversized_key).map(|l| l.quantity().get()), Some(1));
    assert_eq!(store.subtotal(), Money::from_minor(19990, BRL));

    store.decrease_qty(&oversized_key);

    assert_eq!(store.cart().line(&oversized_key).map(|l| l.quantity().get()), Some(1));
    assert_eq!(store.subtotal(), Money::from_minor(19990, BRL));

    // 5. remove one variant
    store.remove_line(&LineKey::sized(ProductId(2), "M"));

    let product_two: Vec<String> = store
        .lines()
        .iter()
        .filter(|line| line.product_id() == ProductId(2))
        .map(|line| line.key().to_string())
        .collect();

    assert_eq!(product_two, vec!["2-G".to_string()]);

    // state survives a restart
    let rehydrated = create_cart_store(storage.clone(), BRL);

    assert_eq!(rehydrated.cart(), store.cart());

    // 6. clear
    store.clear();

    assert!(store.lines().is_empty());
    assert_eq!(store.subtotal(), Money::from_minor(0, BRL));
    assert_eq!(store.item_count(), 0);
    assert_eq!(store.state(), CartState::Empty);
    assert!(create_cart_store(storage, BRL).cart().is_empty());

    Ok(())
}

#[test]
fn subtotal_matches_lines_after_every_step() {
    let mut store = CartStore::empty(BRL);
    let sizes = ["P", "M", "G"];

    for (step, size) in (0_u32..60).zip(sizes.into_iter().cycle()) {
        let key = LineKey::sized(ProductId(2), size);

        match step % 5 {
            0 | 1 => store.add_line(shorts().with_size(size)),
            2 => store.add_line(oversized()),
            3 => store.decrease_qty(&key),
            _ if step % 10 == 4 => store.remove_line(&key),
            _ => store.decrease_qty(&LineKey::product(ProductId(1))),
        }

        assert_eq!(store.subtotal().to_minor_units(), recomputed_subtotal(store.cart()));
        assert_eq!(
            store.item_count(),
            store
                .lines()
                .iter()
                .map(|line| u64::from(line.quantity().get()))
                .sum::<u64>()
        );
        assert_eq!(store.state() == CartState::Empty, store.lines().is_empty());
    }
}

#[test]
fn unknown_lines_are_ignored() {
    let mut store = CartStore::empty(BRL);

    store.add_line(oversized());

    let before = store.cart().clone();

    store.decrease_qty(&LineKey::product(ProductId(99)));
    store.remove_line(&LineKey::sized(ProductId(1), "M"));

    assert_eq!(store.cart(), &before);
}

#[test]
fn only_add_leaves_empty_state() {
    let mut store = CartStore::empty(BRL);

    store.add_line(oversized());
    store.clear();
    store.clear();
    store.decrease_qty(&LineKey::product(ProductId(1)));

    assert_eq!(store.state(), CartState::Empty);

    store.add_line(oversized());

    assert_eq!(store.state(), CartState::NonEmpty);
}
