//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::cart::NewCartLine;

/// Catalog product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors choosing a product variant to add to the cart.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// Product has size variants but none was chosen.
    #[error("product {0} requires a size")]
    SizeRequired(ProductId),

    /// Chosen size is not offered for the product.
    #[error("product {product} is not available in size {size:?}")]
    UnknownSize {
        /// Product being added
        product: ProductId,
        /// Size that was chosen
        size: String,
    },

    /// A size was chosen for a product without size variants.
    #[error("product {product} has no sizes, got {size:?}")]
    UnexpectedSize {
        /// Product being added
        product: ProductId,
        /// Size that was chosen
        size: String,
    },
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product price
    pub price: Money<'static, Currency>,

    /// Product category
    pub category: String,

    /// Main product image
    pub image_url: String,

    /// Product description
    pub description: String,

    /// Size variants on offer; empty for products without variants
    pub sizes: SmallVec<[String; 5]>,

    /// Additional product images
    pub gallery: Vec<String>,
}

impl Product {
    /// Whether a size must be chosen before adding the product to the cart.
    pub fn requires_size(&self) -> bool {
        !self.sizes.is_empty()
    }

    /// Snapshot the product, in the given size, for adding to the cart.
    ///
    /// # Errors
    ///
    /// Returns a `SelectionError` if a size is required but missing or empty,
    /// not on offer, or given for a product without sizes.
    pub fn select(&self, size: Option<&str>) -> Result<NewCartLine, SelectionError> {
        let line = NewCartLine::new(self.id, self.name.clone(), self.price)
            .with_image(self.image_url.clone())
            .with_category(self.category.clone());

        match size.filter(|size| !size.is_empty()) {
            None if self.requires_size() => Err(SelectionError::SizeRequired(self.id)),
            None => Ok(line),
            Some(size) if !self.requires_size() => Err(SelectionError::UnexpectedSize {
                product: self.id,
                size: size.to_string(),
            }),
            Some(size) if self.sizes.iter().any(|offered| offered == size) => {
                Ok(line.with_size(size))
            }
            Some(size) => Err(SelectionError::UnknownSize {
                product: self.id,
                size: size.to_string(),
            }),
        }
    }

    /// Images to preview for the product: the gallery, or the main image when
    /// there is no gallery.
    pub fn preview_images(&self) -> impl Iterator<Item = &str> {
        let fallback = self
            .gallery
            .is_empty()
            .then_some(self.image_url.as_str())
            .filter(|image| !image.is_empty());

        self.gallery.iter().map(String::as_str).chain(fallback)
    }
}
