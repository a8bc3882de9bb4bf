use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use super::models::ErrorBody;
use crate::scheduler::SchedulerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::EmptyDownloadUrl | SchedulerError::DuplicateDownloadUrl(_) => {
                ApiError::Conflict(format!("Error with saving job: {}", err))
            }
            SchedulerError::UnknownJob(_) => ApiError::NotFound("Job not found".to_string()),
            SchedulerError::DeleteActive(_) => {
                ApiError::Forbidden("Cant delete active job".to_string())
            }
            SchedulerError::StateNotAllowed { .. } | SchedulerError::EmptyLogMessage => {
                ApiError::BadRequest(err.to_string())
            }
            SchedulerError::CapacityExhausted { .. } => ApiError::Conflict(err.to_string()),
            SchedulerError::Decode(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}
