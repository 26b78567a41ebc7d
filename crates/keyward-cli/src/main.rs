//! Keyward command line wallet
//!
//! Manages an HD seed and its platform and asset addresses. Results are
//! printed as JSON on stdout; logs go to stderr.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keyward_core::{KeyRole, Keystore, KeystoreConfig, NetworkType, DEFAULT_WORD_COUNT};
use keyward_net::HttpLedgerProbe;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "keyward")]
#[command(about = "Keyward HD keystore", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network override (mainnet, testnet, regtest)
    #[arg(short, long, global = true)]
    network: Option<NetworkType>,

    /// Vault passphrase
    #[arg(long, global = true, env = "KEYWARD_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new seed
    Create {
        /// Mnemonic length
        #[arg(short, long, default_value_t = DEFAULT_WORD_COUNT)]
        words: usize,
    },

    /// Print the mnemonic backup phrase
    ExportMnemonic,

    /// Restore from a mnemonic read on stdin and discover both roles
    Restore,

    /// Rediscover the used addresses of one role
    Discover {
        /// Key role (platform or asset)
        #[arg(short, long)]
        role: KeyRole,
    },

    /// Issue the next address of one role
    Issue {
        /// Key role (platform or asset)
        #[arg(short, long)]
        role: KeyRole,
    },

    /// List stored addresses
    List {
        /// Only this role
        #[arg(short, long)]
        role: Option<KeyRole>,
    },

    /// Remove the seed and all key indices
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => KeystoreConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => KeystoreConfig::default(),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    config.validate()?;

    let storage = keyward_storage_sqlite::open_backend(&config.storage)?;
    let probe = Arc::new(HttpLedgerProbe::new(&config.indexer)?);
    let keystore = Keystore::new(config, storage, probe);
    let passphrase = cli.passphrase.as_deref();

    let output = match cli.command {
        Commands::Create { words } => {
            commands::create(&keystore, require(passphrase)?, words).await?
        }
        Commands::ExportMnemonic => {
            commands::export_mnemonic(&keystore, require(passphrase)?).await?
        }
        Commands::Restore => {
            let phrase = read_phrase()?;
            commands::restore(&keystore, &phrase, require(passphrase)?).await?
        }
        Commands::Discover { role } => {
            commands::discover(&keystore, role, require(passphrase)?).await?
        }
        Commands::Issue { role } => commands::issue(&keystore, role, require(passphrase)?).await?,
        Commands::List { role } => commands::list(&keystore, role)?,
        Commands::Clear => commands::clear(&keystore).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn require(passphrase: Option<&str>) -> anyhow::Result<&str> {
    passphrase.context("a passphrase is required (--passphrase or KEYWARD_PASSPHRASE)")
}

fn read_phrase() -> anyhow::Result<zeroize::Zeroizing<String>> {
    let mut phrase = zeroize::Zeroizing::new(String::new());
    std::io::stdin()
        .read_to_string(&mut phrase)
        .context("reading mnemonic from stdin")?;
    Ok(phrase)
}
