use anyhow::Result;
use qti_preview_core::FsItemResolver;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qti_preview_server::{create_router, AppState, ServerConfig};

const DEFAULT_LOG_FILTER: &str = "qti_preview_server=info,qti_preview_core=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let labels = config.labels()?;
    let items = Arc::new(FsItemResolver::new(&config.package_dir));

    let state = AppState::new(config.preview.clone(), labels, items);
    let app = create_router(state);

    info!(
        bind = %config.bind,
        package = %config.package_dir.display(),
        "starting preview server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
