// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};

use userhub_server::{
    api::router,
    config::{AppConfig, LOG_FORMAT_ENV},
    observability::{init_tracing, LogFormat},
    state::AppState,
    storage::FileUserStore,
    store::{InMemoryUserStore, UserStore},
};

/// In-flight requests get this long to finish after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    init_tracing(LogFormat::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref()))?;

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");
    let addr = config.bind_addr()?;
    let tls = config.tls.clone();

    let users: Arc<dyn UserStore> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(data_dir = %dir.display(), "Using file user store");
            Arc::new(FileUserStore::open(dir)?)
        }
        None => {
            tracing::warn!("DATA_DIR not set; users are kept in memory and lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let state = AppState::new(config, users)?;
    let app = router(state);

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    match tls {
        Some(paths) => {
            // Install the ring crypto provider for rustls before loading certificates.
            if rustls::crypto::ring::default_provider().install_default().is_err() {
                tracing::debug!("rustls crypto provider already installed");
            }
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
            tracing::info!(%addr, "Userhub listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(%addr, "Userhub listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
