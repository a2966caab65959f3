use std::{process, sync::Arc, time::Duration};

use tasmik::{
    application::error::AppError,
    cache::{CacheConfig, CacheState, MemoryStore},
    config,
    infra::{error::InfraError, http, memory::MemoryDirectory, telemetry},
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    run_serve(settings).await
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let directory = Arc::new(MemoryDirectory::with_demo_regions());
    let cache = CacheState {
        config: CacheConfig::from(&settings.cache),
        store: Arc::new(MemoryStore::new()),
    };

    let state = http::AppState {
        participants: directory.clone(),
        assessors: directory.clone(),
        regions: directory,
        cache,
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        addr = %settings.server.addr,
        cache_enabled = settings.cache.enabled,
        "tasmik listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if signal::ctrl_c().await.is_err() {
        return;
    }
    info!(
        grace_seconds = grace.as_secs(),
        "shutdown signal received, draining in-flight requests"
    );

    // If draining outlives the grace period, exit anyway.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!("graceful shutdown grace period elapsed, exiting");
        process::exit(0);
    });
}
