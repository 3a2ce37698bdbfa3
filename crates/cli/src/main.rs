// Salon session CLI
// Plays the auth controller's part against a file- or Redis-backed session

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;
use salon_session::{SessionConfig, SessionStore};
use salon_storage::{FileStore, KeyValueStore, RedisStore, RedisStoreConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Inspect and manage the stored salon login session
#[derive(Parser)]
#[command(name = "salon-session", version)]
struct Cli {
    /// Storage backend holding the session
    #[arg(long, value_enum, env = "SALON_SESSION_BACKEND", default_value_t = Backend::File)]
    backend: Backend,

    /// Session file used by the file backend
    #[arg(long, env = "SALON_SESSION_FILE", default_value = ".salon-session.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    File,
    Redis,
}

#[derive(Subcommand)]
enum Command {
    /// Store a session from a login or registration response
    Login(commands::LoginArgs),
    /// Show whether a usable session is stored
    Status,
    /// Print the Authorization header value (exit code 1 when there is none)
    Header,
    /// Refresh stored profile fields without touching the token
    UpdateUser(commands::UpdateUserArgs),
    /// Remove the stored session
    Logout,
}

fn open_store(cli: &Cli) -> anyhow::Result<SessionStore<Box<dyn KeyValueStore>>> {
    let backend: Box<dyn KeyValueStore> = match cli.backend {
        Backend::File => {
            tracing::debug!("Using session file {}", cli.file.display());
            Box::new(FileStore::new(&cli.file))
        }
        Backend::Redis => {
            let config = RedisStoreConfig::from_env();
            let store = RedisStore::new(config.clone())
                .with_context(|| format!("Failed to connect to Redis at {}", config.url))?;
            store.ping().context("Redis ping failed")?;
            Box::new(store)
        }
    };

    Ok(SessionStore::new(backend, SessionConfig::from_env()))
}

fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,salon_session=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = open_store(&cli)?;

    match &cli.command {
        Command::Login(args) => commands::login(&store, args),
        Command::Status => commands::status(&store),
        Command::Header => commands::header(&store),
        Command::UpdateUser(args) => commands::update_user(&store, args),
        Command::Logout => commands::logout(&store),
    }
}
