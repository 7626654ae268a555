use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skynotes::config::{StoreConfig, SyncConfig, SyncMode};
use skynotes::sync::{FileKeyValueStore, NoteSyncClient, OptimisticBoard, Settlement};
use skynotes::{api, store};

#[derive(Parser)]
#[command(name = "skynotes")]
#[command(about = "Visitor notes service and sync client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the notes HTTP service
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Storage provider (overrides NOTES_STORAGE_PROVIDER)
        #[arg(long)]
        provider: Option<String>,

        /// SQLite database file (overrides NOTES_DATABASE_PATH)
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Print notes through the sync client
    List {
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Drop a new note through the sync client
    Drop {
        /// Note text
        message: String,

        /// Optional author name
        #[arg(short, long, default_value = "")]
        author: String,

        #[command(flatten)]
        sync: SyncArgs,
    },
}

#[derive(clap::Args)]
struct SyncArgs {
    /// Sync mode (overrides NOTES_SYNC_MODE)
    #[arg(long, value_enum)]
    mode: Option<SyncMode>,

    /// Notes endpoint (overrides NOTES_API_URL)
    #[arg(long)]
    url: Option<String>,
}

impl SyncArgs {
    fn into_config(self) -> SyncConfig {
        let mut config = SyncConfig::from_env();
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(url) = self.url {
            config.api_url = url;
        }
        config
    }
}

/// Initialize tracing with output to stderr (client commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "skynotes=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Client commands print notes on stdout
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn serve(host: &str, port: u16, config: StoreConfig) -> anyhow::Result<()> {
    let store = store::open(&config)?;
    tracing::info!("Starting notes service with {} storage", store.name());

    let app = api::create_router(store);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!(
        "Notes service listening on http://{}:{}{}",
        host,
        port,
        api::NOTES_PATH
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn sync_client(config: &SyncConfig) -> anyhow::Result<NoteSyncClient<FileKeyValueStore>> {
    let client = NoteSyncClient::new(config, FileKeyValueStore::open_default()?)?;
    tracing::debug!("Sync client in {} mode against {}", config.mode, config.api_url);
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(
        cli.command,
        Some(Commands::List { .. }) | Some(Commands::Drop { .. })
    );
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            provider,
            database,
        }) => {
            let config = StoreConfig::from_env_with(provider, database);
            serve(&host, port, config).await?;
        }
        Some(Commands::List { sync }) => {
            let client = sync_client(&sync.into_config())?;
            let mut board = OptimisticBoard::new();
            board.hydrate(client.load_notes().await?);

            for note in board.notes() {
                let author = if note.author.is_empty() {
                    "anonymous"
                } else {
                    note.author.as_str()
                };
                println!("{}  {}: {}", note.created_at, author, note.message);
            }
        }
        Some(Commands::Drop {
            message,
            author,
            sync,
        }) => {
            let client = sync_client(&sync.into_config())?;
            let mut board = OptimisticBoard::new();
            let Some(pending) = board.submit(&message, &author) else {
                anyhow::bail!("message is required");
            };

            let outcome = client.save_note(pending.clone()).await;
            match board.settle(&pending.id, outcome) {
                Settlement::Confirmed(note) => println!("{}", note.id),
                Settlement::RolledBack => anyhow::bail!("note {} was not saved", pending.id),
                Settlement::Unknown => {}
            }
        }
        None => {
            serve("127.0.0.1", 3000, StoreConfig::from_env()).await?;
        }
    }

    Ok(())
}
