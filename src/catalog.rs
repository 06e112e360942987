//! Catalog
//!
//! Read-only product records, loaded from a YAML catalog file.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::{PriceError, parse_price},
    products::{Product, ProductId},
};

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price on a product
    #[error("Invalid price for product {product}: {source}")]
    Price {
        /// Product with the bad price
        product: ProductId,
        /// Underlying price error
        source: PriceError,
    },

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// The same product id was listed twice
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    /// Catalog lists no products, so its currency is unknown
    #[error("Catalog has no products")]
    Empty,
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: Vec<ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
struct ProductFixture {
    id: ProductId,
    name: String,
    /// Product price (e.g., "99.90 BRL")
    price: String,
    category: String,
    image: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sizes: SmallVec<[String; 5]>,
    #[serde(default)]
    gallery: Vec<String>,
}

impl TryFrom<ProductFixture> for Product {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price).map_err(|source| CatalogError::Price {
            product: fixture.id,
            source,
        })?;

        Ok(Product {
            id: fixture.id,
            name: fixture.name,
            price,
            category: fixture.category,
            image_url: fixture.image,
            description: fixture.description,
            sizes: fixture.sizes,
            gallery: fixture.gallery,
        })
    }
}

/// Product catalog, in listing order, priced in a single currency.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
    currency: &'static Currency,
}

impl Catalog {
    /// Build a catalog from products.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no products, if two products share an
    /// id, or if products are priced in different currencies.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Result<Self, CatalogError> {
        let products: Vec<Product> = products.into_iter().collect();

        let currency = products
            .first()
            .map(|product| product.price.currency())
            .ok_or(CatalogError::Empty)?;

        let mut index = FxHashMap::default();

        for (position, product) in products.iter().enumerate() {
            let product_currency = product.price.currency();

            if product_currency != currency {
                return Err(CatalogError::CurrencyMismatch(
                    currency.iso_alpha_code.to_string(),
                    product_currency.iso_alpha_code.to_string(),
                ));
            }

            if index.insert(product.id, position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }

        Ok(Self {
            products,
            index,
            currency,
        })
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or a product is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let products = fixture
            .products
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(products)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a product is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&contents)?;

        debug!(path = %path.display(), products = catalog.len(), "loaded catalog");

        Ok(catalog)
    }

    /// Find a product by id.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.index
            .get(&id)
            .and_then(|&position| self.products.get(position))
    }

    /// Products in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Products in the given category, in listing order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |product| product.category == category)
    }

    /// Distinct categories, in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for product in &self.products {
            if !categories.contains(&product.category.as_str()) {
                categories.push(&product.category);
            }
        }

        categories
    }

    /// Currency all products are priced in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
