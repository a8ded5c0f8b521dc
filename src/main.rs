//! Storefront catalogue service

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_catalog::api::{router, AppState};
use storefront_catalog::backend::HttpBackend;
use storefront_catalog::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = Config::from_env()?;
    let backend = Arc::new(HttpBackend::new(config.backend())?);
    let campaign = config.campaign(Utc::now());
    tracing::info!(backend = %config.backend_url, code = %campaign.code, ends_at = %campaign.ends_at, "catalogue backend configured");

    let app = router(AppState::new(backend, config.fetch_size, &config.currency, campaign));

    tracing::info!("Storefront catalogue listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
