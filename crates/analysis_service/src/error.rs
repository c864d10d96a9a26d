use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use control_service::error_response;
use datastore::DatastoreError;
use log_service::LogServiceError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Log(#[from] LogServiceError),

    #[error("Datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    #[error("Video '{id}' not found")]
    VideoNotFound { id: String },

    #[error("Video '{id}' was changed or removed while it was being analyzed")]
    VideoChanged { id: String },

    #[error("Invalid time window: {0}")]
    InvalidWindow(#[from] domain::InvalidWindow),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Log(err) if err.is_invalid_request() => StatusCode::BAD_REQUEST,
            // The archive failed or sent something unreadable
            Self::Log(_) => StatusCode::BAD_GATEWAY,
            Self::Datastore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::VideoNotFound { .. } => StatusCode::NOT_FOUND,
            Self::VideoChanged { .. } => StatusCode::CONFLICT,
            Self::InvalidWindow(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<QueryRejection> for AnalysisError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Analysis failed: {}", self);
        } else {
            warn!("Rejected analysis request: {}", self);
        }
        error_response(status, self.to_string())
    }
}
