//! Delivery addresses

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{KeyValueStore, PersistenceError, load_record, save_record};

/// Errors parsing a postal code.
#[derive(Debug, Error, PartialEq)]
pub enum CepError {
    /// Postal code did not contain exactly eight digits.
    #[error("CEP must have 8 digits, got {0:?}")]
    InvalidLength(String),
}

/// Brazilian postal code (CEP), stored as its eight digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cep(String);

impl Cep {
    /// Parse a CEP, ignoring punctuation (`"01310-100"` and `"01310100"` are
    /// the same code).
    ///
    /// # Errors
    ///
    /// Returns a `CepError` unless exactly eight digits remain.
    pub fn parse(input: &str) -> Result<Self, CepError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();

        if digits.len() == 8 {
            Ok(Self(digits))
        } else {
            Err(CepError::InvalidLength(input.to_string()))
        }
    }

    /// The eight digits.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, tail) = self.0.split_at(5);

        write!(f, "{head}-{tail}")
    }
}

impl TryFrom<String> for Cep {
    type Error = CepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Cep> for String {
    fn from(cep: Cep) -> Self {
        cep.0
    }
}

/// Address identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub u64);

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address details entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    /// Person receiving the delivery.
    pub recipient_name: String,

    /// Postal code.
    pub cep: Cep,

    /// Street name.
    pub street: String,

    /// House or building number.
    pub number: String,

    /// Apartment, block, etc.
    #[serde(default)]
    pub complement: String,

    /// Neighbourhood.
    pub neighborhood: String,

    /// City.
    pub city: String,

    /// State code (e.g. `SP`).
    pub state: String,
}

/// Saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier.
    pub id: AddressId,

    /// Address details.
    #[serde(flatten)]
    pub details: NewAddress,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.details;

        write!(f, "{}, {}", d.street, d.number)?;

        if !d.complement.is_empty() {
            write!(f, " ({})", d.complement)?;
        }

        write!(f, " - {}, {}/{} - CEP {}", d.neighborhood, d.city, d.state, d.cep)
    }
}

/// A user's saved addresses, newest first, with the one chosen for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    addresses: Vec<Address>,
    selected: Option<AddressId>,
    #[serde(default)]
    next_id: u64,
}

impl AddressBook {
    /// Address book for `addresses` (newest first), selecting the first one.
    pub fn new(addresses: Vec<Address>) -> Self {
        let selected = addresses.first().map(|address| address.id);
        let next_id = highest_id(&addresses).saturating_add(1);

        Self {
            addresses,
            selected,
            next_id,
        }
    }

    /// Storage key for a user's address book.
    ///
    /// Bytes of the user id other than ASCII letters, digits and `-` are
    /// written as `_xx` hex escapes, so any id yields a distinct, file-safe key.
    pub fn storage_key(user_id: &str) -> String {
        let mut key = String::from("user-addresses-");

        for byte in user_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                key.push(char::from(byte));
            } else {
                key.push_str(&format!("_{byte:02x}"));
            }
        }

        key
    }

    /// Load a user's address book. A missing or corrupt record is an empty book.
    pub fn load<S>(store: &S, user_id: &str) -> Self
    where
        S: KeyValueStore + ?Sized,
    {
        let mut book: Self = load_record(store, &Self::storage_key(user_id)).unwrap_or_default();

        if book.selected().is_none() {
            book.selected = book.addresses.first().map(|address| address.id);
        }

        book
    }

    /// Save a user's address book.
    ///
    /// # Errors
    ///
    /// Returns a `PersistenceError` if the book cannot be written.
    pub fn save<S>(&self, store: &mut S, user_id: &str) -> Result<(), PersistenceError>
    where
        S: KeyValueStore + ?Sized,
    {
        save_record(store, &Self::storage_key(user_id), self)
    }

    /// Save a new address. It becomes the newest address and is selected.
    ///
    /// Ids are never reused, even after the address holding one is removed.
    pub fn add(&mut self, details: NewAddress) -> AddressId {
        let id = AddressId(
            self.next_id
                .max(highest_id(&self.addresses).saturating_add(1)),
        );

        self.next_id = id.0.saturating_add(1);
        self.addresses.insert(0, Address { id, details });
        self.selected = Some(id);

        id
    }

    /// Choose the delivery address. Returns `false` for unknown ids.
    pub fn select(&mut self, id: AddressId) -> bool {
        let known = self.get(id).is_some();

        if known {
            self.selected = Some(id);
        }

        known
    }

    /// Delete an address. If it was selected, the newest remaining address is
    /// selected instead.
    pub fn remove(&mut self, id: AddressId) -> Option<Address> {
        let position = self.addresses.iter().position(|address| address.id == id)?;
        let removed = self.addresses.remove(position);

        if self.selected == Some(id) {
            self.selected = self.addresses.first().map(|address| address.id);
        }

        Some(removed)
    }

    /// Find an address by id.
    pub fn get(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|address| address.id == id)
    }

    /// The address chosen for delivery.
    pub fn selected(&self) -> Option<&Address> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Addresses, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }

    /// Number of saved addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Check if no address is saved.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

fn highest_id(addresses: &[Address]) -> u64 {
    addresses
        .iter()
        .map(|address| address.id.0)
        .max()
        .unwrap_or(0)
}
