// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use session_vault::api::router;
use session_vault::auth::{PrincipalRegistry, SessionReaper, SessionStore};
use session_vault::config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER};
use session_vault::crypto::SymmetricCodec;
use session_vault::state::AppState;
use session_vault::storage::{SandboxStorage, StoragePaths};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let principals = match &config.principals_file {
        Some(path) => {
            info!(path = %path.display(), "Loading principals");
            PrincipalRegistry::from_json_file(path)?
        }
        None => {
            warn!("PRINCIPALS_FILE not set, using built-in development users");
            PrincipalRegistry::with_defaults()
        }
    };

    let mut storage = SandboxStorage::new(StoragePaths::new(&config.data_dir));
    storage.initialize()?;
    info!(data_dir = %config.data_dir.display(), "Sandbox storage ready");

    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    let codec = SymmetricCodec::new(config.key_size, config.padding);
    let state = AppState::new(principals, Arc::clone(&sessions), storage, codec);

    let shutdown = CancellationToken::new();
    let reaper = tokio::spawn(
        SessionReaper::new(sessions)
            .with_interval(config.sweep_interval)
            .run(shutdown.clone()),
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        session_ttl_secs = config.session_ttl.as_secs(),
        key_bits = config.key_size.key_len() * 8,
        padding = ?config.padding,
        "Session Vault listening (events at /ws, docs at /docs)"
    );

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    reaper.await?;
    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
