//! Command line configuration

use std::{num::NonZeroU32, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use storefront::checkout::PaymentMethod;

/// Storefront command line
#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront cart and checkout", long_about = None)]
pub struct Config {
    /// Storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Where state and catalog data live.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory for the cart, session, addresses and orders
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,

    /// Catalog YAML file (built-in catalog when omitted)
    #[arg(long, env = "STOREFRONT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Currency the catalog must be priced in
    #[arg(long, env = "STOREFRONT_CURRENCY", default_value = "BRL")]
    pub currency: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single-line output.
    Compact,

    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storefront commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List catalog products
    Catalog {
        /// Only list products in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Inspect or change the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage delivery addresses
    #[command(subcommand)]
    Address(AddressCommand),

    /// Place an order for the cart contents
    Checkout {
        /// Payment method
        #[arg(long, value_enum, default_value_t = PaymentMethod::Pix)]
        method: PaymentMethod,
    },

    /// List orders placed by the signed-in user
    Orders,
}

/// Product and size identifying a cart line.
#[derive(Debug, Args)]
pub struct LineArgs {
    /// Product id
    pub product: u64,

    /// Selected size, for products with size variants
    #[arg(short, long)]
    pub size: Option<String>,
}

/// Cart commands
#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show cart lines and totals
    Show,

    /// Add a product
    Add {
        /// Line to add to
        #[command(flatten)]
        line: LineArgs,

        /// Units to add
        #[arg(short, long, default_value_t = NonZeroU32::MIN)]
        qty: NonZeroU32,
    },

    /// Take one unit off a line (never below one)
    Decrease {
        /// Line to decrease
        #[command(flatten)]
        line: LineArgs,
    },

    /// Remove a line
    Remove {
        /// Line to remove
        #[command(flatten)]
        line: LineArgs,
    },

    /// Empty the cart
    Clear,
}

/// User details handed over by the auth backend.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// User id
    #[arg(long)]
    pub id: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Sign in with the admin role
    #[arg(long)]
    pub admin: bool,
}

/// Address commands
#[derive(Debug, Subcommand)]
pub enum AddressCommand {
    /// List saved addresses
    List,

    /// Save a new address and select it
    Add(AddressArgs),

    /// Select the delivery address
    Select {
        /// Address id
        id: u64,
    },

    /// Delete an address
    Remove {
        /// Address id
        id: u64,
    },
}

/// Address details
#[derive(Debug, Args)]
pub struct AddressArgs {
    /// Person receiving the delivery
    #[arg(long)]
    pub recipient: String,

    /// Postal code (CEP)
    #[arg(long)]
    pub cep: String,

    /// Street name
    #[arg(long)]
    pub street: String,

    /// House or building number
    #[arg(long)]
    pub number: String,

    /// Apartment, block, etc.
    #[arg(long, default_value = "")]
    pub complement: String,

    /// Neighbourhood
    #[arg(long)]
    pub neighborhood: String,

    /// City
    #[arg(long)]
    pub city: String,

    /// State code
    #[arg(long)]
    pub state: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn parses_cart_add_with_size() -> TestResult {
        let config = Config::try_parse_from(["storefront", "cart", "add", "2", "--size", "M"])?;

        match config.command {
            Command::Cart(CartCommand::Add { line, qty }) => {
                assert_eq!(line.product, 2);
                assert_eq!(line.size.as_deref(), Some("M"));
                assert_eq!(qty.get(), 1);
            }
            other => panic!("expected cart add, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn parses_checkout_method() -> TestResult {
        let config = Config::try_parse_from(["storefront", "checkout", "--method", "credit-card"])?;

        assert!(matches!(
            config.command,
            Command::Checkout {
                method: PaymentMethod::CreditCard
            }
        ));

        Ok(())
    }

    #[test]
    fn rejects_zero_quantity() {
        assert!(Config::try_parse_from(["storefront", "cart", "add", "1", "--qty", "0"]).is_err());
    }
}
