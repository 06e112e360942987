//! Table rendering for the terminal.

use std::io;

use storefront::{
    addresses::AddressBook,
    cart::Cart,
    checkout::StoredOrder,
    products::Product,
};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    right_aligned: Columns<std::ops::Range<usize>>,
) -> io::Result<()> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(right_aligned, Alignment::right());

    writeln!(out, "{table}")
}

/// Catalog listing.
pub fn write_catalog<'a>(
    out: &mut impl io::Write,
    products: impl IntoIterator<Item = &'a Product>,
) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["ID", "Product", "Category", "Sizes", "Price"]);

    for product in products {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            product.sizes.join(" "),
            product.price.to_string(),
        ]);
    }

    write_table(out, builder, Columns::new(4..5))
}

/// Cart lines with the subtotal and item count.
pub fn write_cart(out: &mut impl io::Write, cart: &Cart) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty.");
    }

    let mut builder = Builder::default();

    builder.push_record(["Line", "Product", "Size", "Qty", "Unit", "Total"]);

    for line in cart.lines() {
        builder.push_record([
            line.key().to_string(),
            line.name().to_string(),
            line.selected_size().unwrap_or("-").to_string(),
            line.quantity().to_string(),
            line.unit_price().to_string(),
            line.line_total().to_string(),
        ]);
    }

    write_table(out, builder, Columns::new(3..6))?;

    writeln!(
        out,
        " Items: {}   Subtotal: {}   Shipping: free",
        cart.item_count(),
        cart.subtotal()
    )
}

/// Saved addresses, marking the selected one.
pub fn write_addresses(out: &mut impl io::Write, book: &AddressBook) -> io::Result<()> {
    if book.is_empty() {
        return writeln!(out, "No saved addresses.");
    }

    let selected = book.selected().map(|address| address.id);
    let mut builder = Builder::default();

    builder.push_record(["", "ID", "Recipient", "Address"]);

    for address in book.iter() {
        builder.push_record([
            if Some(address.id) == selected { "*" } else { "" }.to_string(),
            address.id.to_string(),
            address.details.recipient_name.clone(),
            address.to_string(),
        ]);
    }

    write_table(out, builder, Columns::new(1..2))
}

/// Orders with their totals.
pub fn write_orders(out: &mut impl io::Write, orders: &[StoredOrder]) -> io::Result<()> {
    if orders.is_empty() {
        return writeln!(out, "No orders yet.");
    }

    let mut builder = Builder::default();

    builder.push_record(["Order", "Status", "Payment", "Items", "Total"]);

    for stored in orders {
        let order = &stored.order;
        let items: u64 = order
            .items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum();

        builder.push_record([
            stored.id.to_string(),
            format!("{:?}", order.status),
            format!("{:?}", order.payment_method),
            items.to_string(),
            format!("{} {}", order.total, order.currency),
        ]);
    }

    write_table(out, builder, Columns::new(3..5))
}
