//! Content Indexer Main Entry Point
//!
//! Indexes the pending queue of a content snapshot into the search cores
//! configured for its sites.

use content_indexer::{Dependencies, QueueRunSummary, ServiceError};
use dotenv::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("content_indexer=info,content_indexer_repository=info")
    });

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| ServiceError::config(e.to_string()))?;

        info!(
            service_name = "content-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| ServiceError::config(e.to_string()))?;

        info!(
            service_name = "content-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

/// Process the queue until a run finds nothing left to index.
async fn drain_queue(deps: &Dependencies) -> Result<QueueRunSummary, ServiceError> {
    let mut total = QueueRunSummary::default();
    loop {
        let run = deps
            .indexer
            .process_queue(deps.settings.batch_size)
            .await?;
        if run.processed == 0 {
            return Ok(total);
        }
        total.processed += run.processed;
        total.indexed += run.indexed;
        total.failed += run.failed;
    }
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting content indexer");

    let deps = match Dependencies::new() {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let unreachable = deps.check_connections().await?;
    if !unreachable.is_empty() {
        warn!(cores = ?unreachable, "Some search cores did not answer the ping");
    }

    tokio::select! {
        result = drain_queue(&deps) => match result {
            Ok(total) => {
                info!(
                    processed = total.processed,
                    indexed = total.indexed,
                    failed = total.failed,
                    "Content indexer completed successfully"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Content indexer failed");
                Err(e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}
