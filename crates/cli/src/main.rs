//! Little Lemon CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! lemon-cli migrate
//!
//! # Load the demo categories and menu
//! lemon-cli seed
//!
//! # Create a manager
//! lemon-cli user create -u woody -p 'correct horse' -g manager
//!
//! # Move a user onto the delivery crew
//! lemon-cli user grant -u slinky -g delivery-crew
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the catalog with demo data
//! - `user create|grant|revoke` - Manage users and staff groups

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lemon-cli")]
#[command(author, version, about = "Little Lemon CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with demo categories and menu items
    Seed,
    /// Manage users and staff groups
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Contact email address
        #[arg(short, long)]
        email: Option<String>,

        /// Staff groups to join (`manager`, `delivery-crew`)
        #[arg(short, long)]
        group: Vec<String>,
    },
    /// Add a user to a staff group
    Grant {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        group: String,
    },
    /// Remove a user from a staff group
    Revoke {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        group: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                email,
                group,
            } => {
                commands::user::create(&username, &password, email.as_deref(), &group).await?;
            }
            UserAction::Grant { username, group } => {
                commands::user::grant(&username, &group).await?;
            }
            UserAction::Revoke { username, group } => {
                commands::user::revoke(&username, &group).await?;
            }
        },
    }
    Ok(())
}
