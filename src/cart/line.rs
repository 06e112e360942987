//! Cart Lines

use std::{fmt, num::NonZeroU32};

use rusty_money::{Money, iso::Currency};

use crate::{pricing::line_total, products::ProductId};

/// Identity of a cart line: a product plus its selected size, if any.
///
/// Two lines are the same line if and only if both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    product: ProductId,
    size: Option<String>,
}

impl LineKey {
    /// Key for a product with an optional size selection.
    pub fn new(product: ProductId, size: Option<String>) -> Self {
        Self { product, size }
    }

    /// Key for a product without size variants.
    pub fn product(product: ProductId) -> Self {
        Self::new(product, None)
    }

    /// Key for a product in the given size.
    pub fn sized(product: ProductId, size: impl Into<String>) -> Self {
        Self::new(product, Some(size.into()))
    }

    /// Product this line refers to.
    pub fn product_id(&self) -> ProductId {
        self.product
    }

    /// Selected size, if the product has size variants.
    pub fn size(&self) -> Option<&str> {
        self.size.as_deref()
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{}-{size}", self.product),
            None => write!(f, "{}", self.product),
        }
    }
}

/// A product snapshot about to be added to the cart.
///
/// Name, price, image and category are copied at add-time; later catalog
/// changes never reach lines already in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartLine {
    pub(crate) key: LineKey,
    pub(crate) name: String,
    pub(crate) unit_price: Money<'static, Currency>,
    pub(crate) image_url: String,
    pub(crate) category: String,
    pub(crate) quantity: NonZeroU32,
}

impl NewCartLine {
    /// Snapshot of a product, added one unit at a time.
    pub fn new(
        product: ProductId,
        name: impl Into<String>,
        unit_price: Money<'static, Currency>,
    ) -> Self {
        Self {
            key: LineKey::product(product),
            name: name.into(),
            unit_price,
            image_url: String::new(),
            category: String::new(),
            quantity: NonZeroU32::MIN,
        }
    }

    /// Select a size variant.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.key = LineKey::sized(self.key.product, size);
        self
    }

    /// Set the image shown for the line.
    #[must_use]
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Set the product category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Add `quantity` units instead of one.
    #[must_use]
    pub fn with_quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Identity of the line this snapshot merges into.
    pub fn key(&self) -> &LineKey {
        &self.key
    }

    /// Units to add.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Snapshotted unit price.
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    key: LineKey,
    name: String,
    unit_price: Money<'static, Currency>,
    image_url: String,
    category: String,
    quantity: NonZeroU32,
}

impl CartLine {
    pub(crate) fn from_new(line: NewCartLine) -> Self {
        let NewCartLine {
            key,
            name,
            unit_price,
            image_url,
            category,
            quantity,
        } = line;

        Self {
            key,
            name,
            unit_price,
            image_url,
            category,
            quantity,
        }
    }

    /// Line identity.
    pub fn key(&self) -> &LineKey {
        &self.key
    }

    /// Product this line refers to.
    pub fn product_id(&self) -> ProductId {
        self.key.product
    }

    /// Selected size, if any.
    pub fn selected_size(&self) -> Option<&str> {
        self.key.size()
    }

    /// Product name at add-time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price at add-time.
    pub fn unit_price(&self) -> &Money<'static, Currency> {
        &self.unit_price
    }

    /// Product image at add-time.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Product category at add-time.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Units of this line in the cart. Always at least one.
    pub fn quantity(&self) -> NonZeroU32 {
        self.quantity
    }

    /// Unit price times quantity.
    pub fn line_total(&self) -> Money<'static, Currency> {
        line_total(&self.unit_price, self.quantity)
    }

    /// Merge more units into the line, saturating at `u32::MAX`.
    pub(crate) fn increase(&mut self, delta: NonZeroU32) {
        self.quantity = self.quantity.saturating_add(delta.get());
    }

    /// Take one unit off the line. Returns `false` when already at one.
    pub(crate) fn decrease(&mut self) -> bool {
        match NonZeroU32::new(self.quantity.get() - 1) {
            Some(quantity) => {
                self.quantity = quantity;
                true
            }
            None => false,
        }
    }
}
