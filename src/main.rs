use std::sync::Arc;

use dotenv::dotenv;
use review_analyser::api::{self, AppState};
use review_analyser::config::{AnalysisConfig, ServiceConfig};
use review_analyser::source::HttpReviewSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::from_env();
    tracing::info!("📡 Review source: {} (lang={}, country={})", config.source_url, config.lang, config.country);

    let state = Arc::new(AppState {
        source: Arc::new(HttpReviewSource::new(&config)),
        config: Arc::new(AnalysisConfig::default()),
    });

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
