//! Administrative command line.
//!
//! ```text
//! lorekeeper init-db [--config <path>] [--database <path>] [--admin-password <pw>]
//! ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use clap::{Parser, Subcommand};
use lorekeeper::accounts::CredentialHasher;
use lorekeeper::config::{load_config, Config, StoreConfig};
use lorekeeper::core::db::Scope;
use lorekeeper::store::{init_store, ADMIN_USERNAME};
use lorekeeper::{LoreError, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "lorekeeper")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and recreate every table, then seed the admin account
    InitDb {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// SQLite file to initialize, overriding the configured path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Password for the seeded admin account
        #[arg(long, default_value = "admin")]
        admin_password: String,
    },
}

/// Argon2id digests in PHC string form.
struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LoreError::Credential(e.to_string()))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool> {
        let parsed = PasswordHash::new(digest).map_err(|e| LoreError::Credential(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::InitDb {
            config,
            database,
            admin_password,
        } => {
            let mut config = match config {
                Some(path) => load_config(path)?,
                None => Config::default(),
            };
            if let Some(database) = database {
                config.store = StoreConfig::new(database);
            }

            tracing_subscriber::fmt()
                .with_max_level(config.log_level()?)
                .with_writer(std::io::stderr)
                .init();

            let mut scope = Scope::new(config.store);
            init_store(&scope.executor()?, &Argon2Hasher, &admin_password)?;
            let path = scope.config().path.display().to_string();
            scope.release()?;

            info!(path = %path, "store ready");
            println!(
                "Initialized the database at {} (admin login: {})",
                path, ADMIN_USERNAME
            );
            Ok(())
        }
    }
}
