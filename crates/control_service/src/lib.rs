use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDateTime;
use datastore::{DatastoreError, Repository};
use domain::VideoDetails;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Request body for registering a video
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    /// Generated when omitted
    #[serde(default)]
    pub id: Option<String>,
    pub channel_name: String,
    pub video_title: String,
    pub video_start_time: NaiveDateTime,
    pub video_end_time: NaiveDateTime,
    pub video_url: String,
    #[serde(default)]
    pub indexed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosListParams {
    #[serde(default)]
    pub channel_name: Option<String>,
}

/// Response for successful creation
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub id: String,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    let body = ErrorResponse {
        success: false,
        error: error.into(),
    };
    (status, Json(body)).into_response()
}

/// Extractor rejections answer with the same JSON body as every other error
fn rejected(status: StatusCode, body_text: String) -> Response {
    warn!(%status, "Rejected request: {}", body_text);
    error_response(status, body_text)
}

fn datastore_failure(err: DatastoreError) -> Response {
    error!("Datastore failure: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Handler for registering a new video
async fn create_video(
    State(repo): State<Arc<dyn Repository>>,
    request: Result<Json<CreateVideoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    let channel_name = request.channel_name.trim().to_string();
    if channel_name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "channelName must not be empty");
    }
    if request.video_start_time > request.video_end_time {
        return error_response(
            StatusCode::BAD_REQUEST,
            "videoStartTime must not be after videoEndTime",
        );
    }

    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let video = VideoDetails {
        id: id.clone(),
        channel_name,
        video_title: request.video_title,
        video_start_time: request.video_start_time,
        video_end_time: request.video_end_time,
        video_url: request.video_url,
        indexed: request.indexed,
    };

    info!(id = %video.id, channel = %video.channel_name, "Registering video");
    if let Err(err) = repo.save(video) {
        return datastore_failure(err);
    }

    let response = CreateResponse {
        success: true,
        message: format!("Video '{}' created successfully", id),
        id,
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

/// Handler for listing videos, optionally for one channel
async fn list_videos(
    State(repo): State<Arc<dyn Repository>>,
    params: Result<Query<VideosListParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejected(rejection.status(), rejection.body_text()),
    };
    let videos = match params.channel_name.as_deref().map(str::trim) {
        Some(channel) if !channel.is_empty() => repo.find_by_channel_name(channel),
        _ => repo.find_all(),
    };

    match videos {
        Ok(videos) => (StatusCode::OK, Json(videos)).into_response(),
        Err(err) => datastore_failure(err),
    }
}

async fn get_video(State(repo): State<Arc<dyn Repository>>, Path(id): Path<String>) -> Response {
    match repo.find_by_id(&id) {
        Ok(Some(video)) => (StatusCode::OK, Json(video)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Video '{}' not found", id)),
        Err(err) => datastore_failure(err),
    }
}

/// Create the router for the video registration API
pub fn create_router(repo: Arc<dyn Repository>) -> Router {
    Router::new()
        .route("/videos", get(list_videos).post(create_video))
        .route("/videos/{id}", get(get_video))
        .with_state(repo)
}
