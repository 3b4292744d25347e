use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("resource not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no unseen questions left for this quiz")]
    QuizExhausted,
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ApiResponse<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Validation(_)
            | ApiError::QuizExhausted
            | ApiError::Store(_)
            | ApiError::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Store(err) => tracing::error!("Store failure: {err}"),
            other => tracing::debug!("Request failed: {other}"),
        }
        let message = match status {
            StatusCode::BAD_REQUEST => "Bad Request!",
            StatusCode::NOT_FOUND => "Resource not found!",
            StatusCode::METHOD_NOT_ALLOWED => "Method not allowed!",
            _ => "Unprocessable Request!",
        };
        let body = Json(ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
        });
        (status, body).into_response()
    }
}

// well-formed json of the wrong shape is unprocessable, anything else is a bad request
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::Validation(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

// ids in paths are integers, anything else names no resource
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}
