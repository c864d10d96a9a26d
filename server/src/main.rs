mod config;

use analysis_service::{AnalysisState, ChatAnalyzer, DemoRequest};
use config::AppConfig;
use datastore::{InMemoryRepository, Repository};
use emote_metrics::KeywordTally;
use log_service::{LogFetcher, ReqwestTextSource};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,log_service=debug,analysis_service=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        categories = config.emotes.categories().count(),
        archive = %config.log_archive.base_url,
        "Starting Twitch chat analyzer"
    );

    let source = Arc::new(ReqwestTextSource::new(config.log_archive.timeout())?);
    let fetcher = LogFetcher::new(source, config.log_archive.base_url.clone())
        .with_policy(config.log_archive.malformed_lines);
    let analyzer = Arc::new(ChatAnalyzer::new(fetcher, KeywordTally::new(config.emotes.clone())));

    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let state = AnalysisState {
        repo: repo.clone(),
        analyzer,
        demo: DemoRequest {
            channel: config.demo.channel.clone(),
            window: config.demo.window()?,
        },
    };

    let app = control_service::create_router(repo).merge(analysis_service::create_router(state));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
