use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pizza_restaurant_service::{app, config::Config, seed::seed, RecordStore};

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Overrides BIND_ADDRESS
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Apply pending migrations and exit
    Migrate,
    /// Replace every row with sample data
    Seed,
}

fn init_logging(level: &str) {
    // RUST_LOG wins over LOG_LEVEL.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},tower_http={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    init_logging(&config.log_level);

    let store = RecordStore::connect(&config.database_url, config.pool_size)?;
    let applied = store.run_pending_migrations().await?;
    for version in &applied {
        info!(version = %version, "applied migration");
    }

    match cli.command {
        Commands::Migrate => {
            info!(applied = applied.len(), "migrations up to date");
        }
        Commands::Seed => {
            seed(&store).await?;
        }
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_address);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(
                "Pizza restaurant service listening on {}",
                listener.local_addr()?
            );

            axum::serve(listener, app(store)).await?;
        }
    }

    Ok(())
}
