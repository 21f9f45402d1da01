//! Priceworth CLI - database migrations and operator tooling.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! priceworth-cli migrate
//!
//! # Hash the operator password for PRICEWORTH_ADMIN_PASSWORD_HASH
//! priceworth-cli admin hash-password 'S3cure!pass'
//!
//! # Mint a token with the configured secret
//! priceworth-cli token issue --role customer --id 42
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use priceworth_core::Role;

mod commands;

#[derive(Parser)]
#[command(name = "priceworth-cli")]
#[command(author, version, about = "Priceworth operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations against `PRICEWORTH_DATABASE_URL`
    Migrate,
    /// Operator account helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Bearer token helpers
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Print an argon2 hash for `PRICEWORTH_ADMIN_PASSWORD_HASH`
    HashPassword {
        /// The operator password
        password: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token signed with `PRICEWORTH_JWT_SECRET`
    Issue {
        /// Token role (`admin` or `customer`)
        #[arg(short, long, value_parser = parse_role)]
        role: Role,

        /// Subject id (customer id; ignored for admin tokens)
        #[arg(short, long, default_value_t = 0)]
        id: i32,
    },
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                commands::admin::hash_password(&password)?;
            }
        },
        Commands::Token { action } => match action {
            TokenAction::Issue { role, id } => commands::token::issue(role, id)?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_token_issue() {
        let cli = Cli::try_parse_from([
            "priceworth-cli",
            "token",
            "issue",
            "--role",
            "customer",
            "--id",
            "42",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(
            cli.command,
            Commands::Token {
                action: TokenAction::Issue {
                    role: Role::Customer,
                    id: 42
                }
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_role() {
        let result = Cli::try_parse_from(["priceworth-cli", "token", "issue", "--role", "root"]);
        assert!(result.is_err());
    }
}
