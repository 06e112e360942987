//! Command handlers

use std::io;

use storefront::{
    addresses::{AddressBook, AddressId, Cep, CepError, NewAddress},
    auth::{Role, Session, User},
    cart::{
        LineKey,
        store::{CartStore, create_cart_store},
    },
    catalog::{Catalog, CatalogError},
    checkout::{CheckoutError, PaymentMethod, StoreOrderGateway, place_order},
    persistence::{PersistenceError, file::FileStore},
    products::{ProductId, SelectionError},
};
use thiserror::Error;
use tracing::debug;

use crate::cli::{
    config::{
        AddressArgs, AddressCommand, CartCommand, Command, LineArgs, LoginArgs, StorageConfig,
    },
    render,
};

const BUILTIN_CATALOG: &str = include_str!("../../fixtures/products.yml");

/// Errors running a command.
#[derive(Debug, Error)]
pub enum AppError {
    /// The catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The product cannot be added with the given size.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// No product has this id.
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    /// The command needs a signed-in user.
    #[error("sign in first")]
    NotAuthenticated,

    /// No saved address has this id.
    #[error("unknown address {0}")]
    UnknownAddress(AddressId),

    /// The postal code is malformed.
    #[error(transparent)]
    Cep(#[from] CepError),

    /// Checkout failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// State could not be written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Application state shared by the commands.
#[derive(Debug)]
pub struct App {
    storage: FileStore,
    catalog: Catalog,
    cart: CartStore,
    session: Session<FileStore>,
}

impl App {
    /// Open the catalog and restore the cart and session from the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn open(config: &StorageConfig) -> Result<Self, AppError> {
        let catalog = match &config.catalog {
            Some(path) => Catalog::load(path)?,
            None => Catalog::from_yaml_str(BUILTIN_CATALOG)?,
        };

        let found = catalog.currency().iso_alpha_code;

        if !found.eq_ignore_ascii_case(&config.currency) {
            return Err(
                CatalogError::CurrencyMismatch(config.currency.clone(), found.to_string()).into(),
            );
        }

        let storage = FileStore::new(&config.data_dir);

        debug!(data_dir = %storage.dir().display(), products = catalog.len(), "opened storefront");

        Ok(Self {
            cart: create_cart_store(storage.clone(), catalog.currency()),
            session: Session::restore(storage.clone()),
            storage,
            catalog,
        })
    }

    /// Run a command, writing its output to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or its output cannot be written.
    pub fn run(&mut self, command: Command, out: &mut impl io::Write) -> Result<(), AppError> {
        match command {
            Command::Catalog { category } => match category {
                Some(category) if self.catalog.by_category(&category).next().is_none() => {
                    writeln!(
                        out,
                        "No products in {category:?}. Categories: {}",
                        self.catalog.categories().join(", ")
                    )?;
                }
                Some(category) => render::write_catalog(out, self.catalog.by_category(&category))?,
                None => render::write_catalog(out, self.catalog.iter())?,
            },
            Command::Cart(command) => self.cart_command(command, out)?,
            Command::Login(args) => {
                let user = login_user(args);

                writeln!(out, "Signed in as {} <{}>", user.name, user.email)?;

                self.session.login(user)?;
            }
            Command::Logout => {
                self.session.logout()?;

                writeln!(out, "Signed out")?;
            }
            Command::Whoami => match self.session.current() {
                Some(user) => writeln!(out, "{} <{}> ({:?})", user.name, user.email, user.role)?,
                None => writeln!(out, "Not signed in")?,
            },
            Command::Address(command) => self.address_command(command, out)?,
            Command::Checkout { method } => self.checkout(method, out)?,
            Command::Orders => {
                let user = self.session.current().ok_or(AppError::NotAuthenticated)?;
                let gateway = StoreOrderGateway::new(self.storage.clone());

                render::write_orders(out, &gateway.orders_for(&user.id))?;
            }
        }

        Ok(())
    }

    fn cart_command(
        &mut self,
        command: CartCommand,
        out: &mut impl io::Write,
    ) -> Result<(), AppError> {
        match command {
            CartCommand::Show => {}
            CartCommand::Add { line, qty } => {
                let product = self
                    .catalog
                    .get(ProductId(line.product))
                    .ok_or(AppError::UnknownProduct(ProductId(line.product)))?;

                self.cart
                    .add_line(product.select(line.size.as_deref())?.with_quantity(qty));
            }
            CartCommand::Decrease { line } => self.cart.decrease_qty(&line_key(line)),
            CartCommand::Remove { line } => self.cart.remove_line(&line_key(line)),
            CartCommand::Clear => self.cart.clear(),
        }

        render::write_cart(out, self.cart.cart())?;

        Ok(())
    }

    fn address_command(
        &mut self,
        command: AddressCommand,
        out: &mut impl io::Write,
    ) -> Result<(), AppError> {
        let user_id = self
            .session
            .current()
            .map(|user| user.id.clone())
            .ok_or(AppError::NotAuthenticated)?;

        let mut book = AddressBook::load(&self.storage, &user_id);

        match command {
            AddressCommand::List => {}
            AddressCommand::Add(args) => {
                book.add(new_address(args)?);
            }
            AddressCommand::Select { id } => {
                if !book.select(AddressId(id)) {
                    return Err(AppError::UnknownAddress(AddressId(id)));
                }
            }
            AddressCommand::Remove { id } => {
                book.remove(AddressId(id))
                    .ok_or(AppError::UnknownAddress(AddressId(id)))?;
            }
        }

        book.save(&mut self.storage, &user_id)?;

        render::write_addresses(out, &book)?;

        Ok(())
    }

    fn checkout(
        &mut self,
        method: PaymentMethod,
        out: &mut impl io::Write,
    ) -> Result<(), AppError> {
        let user = self.session.current();
        let book = user
            .map(|user| AddressBook::load(&self.storage, &user.id))
            .unwrap_or_default();
        let mut gateway = StoreOrderGateway::new(self.storage.clone());

        let confirmation = place_order(&mut self.cart, user, &book, method, &mut gateway)?;

        writeln!(out, "Order {} placed, total {}", confirmation.id, confirmation.total)?;

        Ok(())
    }

    #[cfg(test)]
    fn cart(&self) -> &CartStore {
        &self.cart
    }
}

fn line_key(line: LineArgs) -> LineKey {
    LineKey::new(ProductId(line.product), line.size)
}

fn login_user(args: LoginArgs) -> User {
    User {
        id: args.id,
        email: args.email,
        name: args.name,
        role: if args.admin { Role::Admin } else { Role::Customer },
    }
}

fn new_address(args: AddressArgs) -> Result<NewAddress, CepError> {
    Ok(NewAddress {
        recipient_name: args.recipient,
        cep: Cep::parse(&args.cep)?,
        street: args.street,
        number: args.number,
        complement: args.complement,
        neighborhood: args.neighborhood,
        city: args.city,
        state: args.state,
    })
}
