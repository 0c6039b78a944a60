//! docforge server
//!
//! Compiles a GraphQL schema into a storage-backed API and serves it over HTTP.
//!
//! Usage:
//!   docforge --schema demos/todo.graphql --port 4000 --database todo.db
//!
//! Without `--database` records live in memory and are lost on exit.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use docforge_engine::GeneratedApi;
use docforge_server::build_router;
use docforge_storage::{DocumentStore, MemoryStore, SqliteStore};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docforge")]
#[command(about = "Serve a GraphQL API generated from a schema over a document store")]
struct Args {
    /// Path to the GraphQL schema (SDL)
    #[arg(short, long)]
    schema: PathBuf,

    /// HTTP port to listen on
    #[arg(short, long, default_value = "4000")]
    port: u16,

    /// SQLite database file; records are kept in memory when omitted
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let source = fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema {}", args.schema.display()))?;

    let store: Arc<dyn DocumentStore> = match &args.database {
        Some(path) => {
            info!("Opening database {}", path.display());
            Arc::new(
                SqliteStore::open(path)
                    .with_context(|| format!("failed to open database {}", path.display()))?,
            )
        }
        None => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let api = GeneratedApi::build(&source, store).context("failed to compile schema")?;
    let app = build_router(Arc::new(api));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("GraphQL endpoint listening on http://0.0.0.0:{}/graphql", args.port);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
