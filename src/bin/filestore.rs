use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filestore::{FileStore, StorageConfig, StorageFactory};
use futures::TryStreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filestore", about = "Inspect and manage the configured blob store")]
struct Cli {
    /// JSON configuration file (defaults to the user config file, then OSS_* variables)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Turn verbose logging on
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List keys, optionally under a prefix
    Ls { prefix: Option<String> },
    /// Upload a local file
    Put { key: String, file: PathBuf },
    /// Download a blob to a file, or to stdout
    Get { key: String, file: Option<PathBuf> },
    /// Delete a blob
    Rm { key: String },
    /// Print whether a blob exists
    Exists { key: String },
    /// Print the size of a blob in bytes
    Size { key: String },
    /// Copy a blob
    Cp { source: String, dest: String },
    /// Move a blob
    Mv { source: String, dest: String },
    /// Print a signed download URL
    SignGet {
        key: String,
        /// Seconds until the URL expires
        #[arg(long, default_value_t = 600)]
        expiry: u64,
    },
    /// Print a signed upload URL
    SignPut {
        key: String,
        /// Seconds until the URL expires
        #[arg(long, default_value_t = 600)]
        expiry: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = StorageConfig::load(cli.config.as_deref())
        .context("Failed to load storage configuration")?;
    let store = StorageFactory::create(&config)
        .await
        .with_context(|| format!("Failed to initialize {} storage", config.provider))?;

    run(store.as_ref(), cli.command).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(store: &dyn FileStore, command: Command) -> Result<()> {
    match command {
        Command::Ls { prefix } => {
            let mut keys = store.list(prefix.as_deref()).await?;
            while let Some(key) = keys.try_next().await? {
                println!("{}", key);
            }
        }
        Command::Put { key, file } => {
            store
                .upload_file(&key, &file)
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            println!("{}", store.object_uri(&key));
        }
        Command::Get { key, file: Some(file) } => {
            let mut out = async_fs::File::create(&file)
                .await
                .with_context(|| format!("Failed to create {}", file.display()))?;
            store.download_to(&key, &mut out).await?;
        }
        Command::Get { key, file: None } => {
            let content = store.download_bytes(&key).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&content).await?;
            stdout.flush().await?;
        }
        Command::Rm { key } => store.delete(&key).await?,
        Command::Exists { key } => println!("{}", store.exists(&key).await?),
        Command::Size { key } => println!("{}", store.size_of(&key).await?),
        Command::Cp { source, dest } => println!("{}", store.copy(&source, &dest).await?),
        Command::Mv { source, dest } => println!("{}", store.move_object(&source, &dest).await?),
        Command::SignGet { key, expiry } => {
            let url = store
                .generate_download_url(&key, Duration::from_secs(expiry))
                .await?;
            println!("{}", url);
        }
        Command::SignPut { key, expiry } => {
            let url = store
                .generate_upload_url(&key, Duration::from_secs(expiry))
                .await?;
            println!("{}", url);
        }
    }

    Ok(())
}
