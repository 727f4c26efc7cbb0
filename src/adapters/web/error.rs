//! HTTP error responses for the control plane.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::HunterError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_from_error(err: &HunterError) -> StatusCode {
    match err {
        HunterError::ConfigParse { .. }
        | HunterError::ConfigMissing { .. }
        | HunterError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        HunterError::StrategyNotFound { .. } => StatusCode::NOT_FOUND,
        HunterError::Feed { .. } | HunterError::News { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        HunterError::Broker { .. } => StatusCode::BAD_GATEWAY,
        HunterError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<HunterError> for WebError {
    fn from(err: HunterError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
