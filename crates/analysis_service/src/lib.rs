pub mod analyzer;
pub mod error;

pub use analyzer::{ChatAnalyzer, VideoAnalysisOutcome};
pub use error::AnalysisError;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use datastore::Repository;
use domain::TimeWindow;
use emote_metrics::ChatLogAnalysis;
use serde::Deserialize;
use std::sync::Arc;

/// Channel and window analyzed by `GET /`
#[derive(Debug, Clone)]
pub struct DemoRequest {
    pub channel: String,
    pub window: TimeWindow,
}

#[derive(Clone)]
pub struct AnalysisState {
    pub repo: Arc<dyn Repository>,
    pub analyzer: Arc<ChatAnalyzer>,
    pub demo: DemoRequest,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisParams {
    pub channel: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Fixed demonstration fetch
async fn demo_analysis(
    State(state): State<AnalysisState>,
) -> Result<Json<ChatLogAnalysis>, AnalysisError> {
    let DemoRequest { channel, window } = &state.demo;
    let analysis = state.analyzer.analyze(channel, *window).await?;
    Ok(Json(analysis))
}

async fn channel_analysis(
    State(state): State<AnalysisState>,
    params: Result<Query<AnalysisParams>, QueryRejection>,
) -> Result<Json<ChatLogAnalysis>, AnalysisError> {
    let Query(params) = params?;
    let window = TimeWindow::new(params.start, params.end)?;
    let analysis = state.analyzer.analyze(&params.channel, window).await?;
    Ok(Json(analysis))
}

async fn video_analysis(
    State(state): State<AnalysisState>,
    Path(id): Path<String>,
) -> Result<Json<ChatLogAnalysis>, AnalysisError> {
    let analysis = state.analyzer.analyze_video(state.repo.as_ref(), &id).await?;
    Ok(Json(analysis))
}

async fn pending_channel_analysis(
    State(state): State<AnalysisState>,
    Path(channel): Path<String>,
) -> Result<Json<Vec<VideoAnalysisOutcome>>, AnalysisError> {
    let outcomes = state
        .analyzer
        .analyze_pending(state.repo.as_ref(), &channel)
        .await?;
    Ok(Json(outcomes))
}

/// Create the router for the chat analysis API
pub fn create_router(state: AnalysisState) -> Router {
    Router::new()
        .route("/", get(demo_analysis))
        .route("/analysis", get(channel_analysis))
        .route("/videos/{id}/analyze", post(video_analysis))
        .route("/channels/{channel}/analyze", post(pending_channel_analysis))
        .with_state(state)
}
