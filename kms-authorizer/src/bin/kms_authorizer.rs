//! Local entry point for the authorizer.
//!
//! Runs the same key and signing paths a deployment uses, against an
//! in-process key seeded from `--secret-key`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kms_authorizer::{AuthorizerConfig, InMemoryKeyManagement, KmsAuthorizer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// KMS authorizer CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "kms-authorizer")]
#[command(about = "Sign ledger transactions with a KMS-held P-256 key")]
struct Args {
    /// TOML configuration file (falls back to KMS_* environment variables).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hex-encoded P-256 secret backing the in-process key.
    #[arg(long, env = "KMS_DEV_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the raw hex public key.
    PublicKey,
    /// Print the RLP-encoded account key record.
    FlowKey,
    /// Sign a hex message for an account key and print the result as JSON.
    Sign {
        #[arg(short, long)]
        message: String,
        #[arg(short, long)]
        address: String,
        #[arg(short, long, default_value_t = 0)]
        key_index: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => AuthorizerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AuthorizerConfig::from_env().context("Failed to load config from environment")?,
    };
    tracing::info!("Resource: {}", config.resource_id);

    let kms = InMemoryKeyManagement::from_secret_hex(config.resource_id.clone(), &args.secret_key)?;
    let authorizer = KmsAuthorizer::new(kms, config);

    match args.command {
        Command::PublicKey => {
            println!("{}", authorizer.public_key().await?);
        }
        Command::FlowKey => {
            println!("{}", authorizer.flow_public_key().await?);
        }
        Command::Sign {
            message,
            address,
            key_index,
        } => {
            let authorization = authorizer.authorize(&address, key_index)?;
            let result = authorization.sign(&message).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
