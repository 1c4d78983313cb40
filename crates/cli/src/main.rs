//! Petal CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database and session store migrations
//! petal migrate
//!
//! # Create admin user
//! petal admin create -e admin@example.com -n "Admin Name" -r super_admin -p '<password>'
//!
//! # Load the demo catalog
//! petal seed catalog
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users
//! - `seed catalog` - Seed the catalog with demo data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "petal")]
#[command(author, version, about = "Petal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and create the session tables
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Initial password (at least 12 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Demo categories, colors, sizes, occasions and products
    Catalog,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, &password).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog => commands::seed::catalog().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_admin_create_defaults_to_admin_role() {
        let cli = Cli::try_parse_from([
            "petal", "admin", "create", "-e", "ops@petal.shop", "-n", "Ops", "-p", "long-password-1",
        ])
        .unwrap();

        let Commands::Admin {
            action: AdminAction::Create { email, role, .. },
        } = cli.command
        else {
            panic!("expected admin create");
        };
        assert_eq!(email, "ops@petal.shop");
        assert_eq!(role, "admin");
    }

    #[test]
    fn test_admin_create_requires_password() {
        assert!(
            Cli::try_parse_from(["petal", "admin", "create", "-e", "a@b.co", "-n", "A"]).is_err()
        );
    }

    #[test]
    fn test_seed_catalog() {
        let cli = Cli::try_parse_from(["petal", "seed", "catalog"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Seed {
                target: SeedTarget::Catalog
            }
        ));
    }
}
