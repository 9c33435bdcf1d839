//! Bookworm - book reviews behind a proof-of-reading quiz

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookworm::{
    auth::ensure_admin,
    config::Args,
    db::{CatalogStore, MemoryCatalogStore, MongoCatalogStore, MongoClient},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookworm={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Bookworm - read it, then review it");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!(
        "Store: {}",
        if args.memory_store { "memory" } else { args.mongodb_uri.as_str() }
    );
    info!("Session TTL: {}s", args.jwt_expiry_seconds);
    info!("======================================");

    let (store, store_kind): (Arc<dyn CatalogStore>, &'static str) = if args.memory_store {
        warn!("Using in-memory store - data is lost on restart");
        (memory_store(), "memory")
    } else {
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                let store: Arc<dyn CatalogStore> = Arc::new(MongoCatalogStore::new(&client).await?);
                (store, "mongodb")
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using memory store): {}", e);
                    (memory_store(), "memory")
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    if let Some((username, password)) = args.admin_credentials() {
        ensure_admin(store.as_ref(), username, password).await?;
    }

    let state = Arc::new(AppState::new(args, store, store_kind)?);
    server::run(state).await?;

    Ok(())
}

fn memory_store() -> Arc<dyn CatalogStore> {
    Arc::new(MemoryCatalogStore::new())
}
