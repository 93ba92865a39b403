use clap::{Parser, Subcommand};

use pawcart_app::context::AppContext;

use crate::config::{BackendConfig, LoggingConfig};

mod cart;
mod coupons;

#[derive(Debug, Parser)]
#[command(name = "pawcart", about = "Pawcart shop client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub backend: BackendConfig,

    #[command(flatten)]
    pub logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart(cart::CartCommand),

    /// Browse and receive coupons
    Coupons(coupons::CouponsCommand),
}

impl Cli {
    /// Parse arguments after loading `.env`, if present.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::from_config(self.backend.gateway(), &self.backend.mirror_dir)
            .map_err(|error| format!("failed to start: {error}"))?;

        match self.command {
            Commands::Cart(command) => cart::run(command, &context).await,
            Commands::Coupons(command) => coupons::run(command, &context).await,
        }
    }
}
