use std::{net::SocketAddr, sync::Arc};

use chrono::Utc;
use eyre::WrapErr;
use price_service::{
    config::{Config, SECRET_VAR},
    router, AdminPolicy, AppState, EnvSecretStore, InMemoryPriceStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let policy = AdminPolicy::new(&EnvSecretStore::new(SECRET_VAR), config.admin_wallets.clone());
    if !policy.is_configured() {
        warn!("{SECRET_VAR} not set, admin routes will refuse every request");
    }

    let state = AppState::new(Arc::new(InMemoryPriceStore::seeded(Utc::now())), Arc::new(policy));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding {addr}"))?;

    info!(%addr, "price service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
