//! DriveRelay CLI - runs the relay server and drives a running relay for
//! quick inspection from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use driverelay_client::{ApiClient, TokenStore};
use driverelay_common::FileQuery;
use driverelay_server::ServerConfig;

#[derive(Parser)]
#[command(name = "driverelay")]
#[command(about = "DriveRelay - Google Drive OAuth2 relay")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server with configuration from the environment.
    Serve {
        /// Override the listening port.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate the environment configuration and print the result.
    CheckConfig,

    /// List folder entries through a running relay.
    List {
        /// Relay base URL.
        #[arg(long, default_value = "http://localhost:8080")]
        relay: String,

        /// Folder whose children are listed.
        #[arg(long, default_value = "root")]
        folder: String,

        /// Filter entries by name substring.
        #[arg(long)]
        name: Option<String>,

        /// Access credential to use instead of the persisted one.
        #[arg(long)]
        access_token: Option<String>,
    },

    /// Download a file through a running relay.
    Download {
        /// Relay base URL.
        #[arg(long, default_value = "http://localhost:8080")]
        relay: String,

        /// Drive file ID.
        #[arg(long)]
        file_id: String,

        /// Destination file path.
        #[arg(short, long)]
        output: PathBuf,

        /// Access credential to use instead of the persisted one.
        #[arg(long)]
        access_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve { port } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            info!(folder = %config.shared_folder_id, "browsing scoped to shared folder");
            driverelay_server::serve(config).await?;
        }

        Commands::CheckConfig => {
            let config = ServerConfig::from_env()?;
            println!("origin:        {}", config.origin_url);
            println!("port:          {}", config.port);
            println!("production:    {}", config.production);
            println!("shared folder: {}", config.shared_folder_id);
            println!("client id:     {}", config.client_id);
        }

        Commands::List {
            relay,
            folder,
            name,
            access_token,
        } => {
            let client = relay_client(relay, access_token).await?;

            let mut query = FileQuery::children_of(folder);
            if let Some(name) = name {
                query = query.with_name_contains(name);
            }

            let entries = client.list_files(&query).await?;
            if entries.is_empty() {
                println!("(empty)");
            }
            for entry in entries {
                let marker = if entry.is_folder() { "d" } else { "-" };
                println!("{marker} {:<44} {}", entry.id, entry.name);
            }
        }

        Commands::Download {
            relay,
            file_id,
            output,
            access_token,
        } => {
            let client = relay_client(relay, access_token).await?;

            let download = client.download(&file_id).await?;
            let written = download.save_to(&output).await?;
            info!(bytes = written, path = %output.display(), "download complete");
        }
    }

    Ok(())
}

/// Build an API client backed by the per-user persisted token store.
async fn relay_client(relay: String, access_token: Option<String>) -> Result<ApiClient> {
    let store = TokenStore::persistent()?;
    if let Some(token) = access_token {
        store.set(token).await;
    }
    Ok(ApiClient::new(relay, store))
}
