use std::sync::Arc;

use anyhow::{bail, Context};
use backlog_core::{
    api::{build_app, AppState},
    config::{ServerConfig, StorageKind},
    logging::init_logger,
    Backlog, Storage,
};
use tracing::info;

fn open_storage(config: &ServerConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage {
        #[cfg(feature = "file-storage")]
        StorageKind::File => Ok(Arc::new(backlog_core::storage::FileStorage::new(
            &config.data_dir,
        ))),
        #[cfg(feature = "sqlite-storage")]
        StorageKind::Sqlite => Ok(Arc::new(
            backlog_core::storage::SqliteStorage::open(&config.database_path)
                .context("opening sqlite database")?,
        )),
        #[allow(unreachable_patterns)]
        other => bail!("storage backend {:?} is not compiled in", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("loading configuration")?;
    init_logger(&config.log_level);

    let storage = open_storage(&config)?;
    storage.initialize().await.context("initializing storage")?;

    let app = build_app(AppState::new(Backlog::new(storage)));
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, storage = ?config.storage, "backlog server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("serving HTTP")?;

    Ok(())
}
