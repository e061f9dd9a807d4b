//! Binary entry point: open the SQLite store, serve the catalog until Ctrl-C,
//! then close the store.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use book_catalog::config::Config;
use book_catalog::logging::init_logging;
use book_catalog::{web, BookStore};

/// How long shutdown waits for in-flight workflows to release the store.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Config::parse();

    let db_path = config.db_path()?;
    let store = Arc::new(
        BookStore::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("serving book catalog on http://{}", config.bind);

    axum::serve(listener, web::router(Arc::clone(&store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tokio::task::spawn_blocking(move || BookStore::close_when_released(store, SHUTDOWN_GRACE))
        .await
        .context("close task failed")?
        .context("failed to close database")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {err}");
        // Without a signal handler the server simply runs until killed.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
