//! Cartwheel CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (application tables and session store)
//! cw-cli migrate
//!
//! # Create a user with a password
//! cw-cli user create -e shopper@example.com -p hunter22 -n "Shopper Name"
//!
//! # Create a staff account
//! cw-cli user create -e staff@example.com -p s3cret -a admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create users

#![cfg_attr(not(test), forbid(unsafe_code))]

use cartwheel_core::AccountType;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(author, version, about = "Cartwheel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address (stored lowercased)
        #[arg(short, long)]
        email: String,

        /// Password (hashed with bcrypt before storage)
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Account type (`user` or `admin`)
        #[arg(short, long, default_value = "user")]
        account_type: AccountType,
    },
}

#[tokio::main]
async fn main() {
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
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                password,
                name,
                account_type,
            } => {
                commands::user::create_user(email, password, name, account_type).await?;
            }
        },
    }
    Ok(())
}
