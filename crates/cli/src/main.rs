//! Nightcap CLI - Operational tools for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Create the session store table
//! nightcap-cli migrate
//!
//! # Validate storefront environment variables
//! nightcap-cli check-config
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nightcap-cli")]
#[command(author, version, about = "Nightcap CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Validate storefront configuration from the environment
    CheckConfig,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::CheckConfig => commands::check::config()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_subcommands() {
        assert!(matches!(
            Cli::try_parse_from(["nightcap-cli", "migrate"]).map(|c| c.command),
            Ok(Commands::Migrate)
        ));
        assert!(matches!(
            Cli::try_parse_from(["nightcap-cli", "check-config"]).map(|c| c.command),
            Ok(Commands::CheckConfig)
        ));
        assert!(Cli::try_parse_from(["nightcap-cli", "seed"]).is_err());
    }
}
