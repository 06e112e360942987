//! Storefront CLI

use std::{io, process::ExitCode};

use tracing::error;

use crate::cli::{
    commands::{App, AppError},
    config::Config,
    observability::init_subscriber,
};

mod cli;

/// Storefront CLI entry point
pub fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments; prints help or usage errors
    let config = Config::load().unwrap_or_else(|err| err.exit());

    if let Err(err) = init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln for setup errors"
        )]
        {
            eprintln!("{err}");
        }

        return ExitCode::FAILURE;
    }

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");

            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<(), AppError> {
    let mut app = App::open(&config.storage)?;

    app.run(config.command, &mut io::stdout().lock())
}
