//! HTTP error mapping.
//!
//! Every failure leaves the server as `{ "error": <message>, "kind": <kind> }`
//! so the browser can tell "sign in" apart from "fix your input" and from
//! "try again later".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::json_response;
use crate::core::ProjectionError;
use crate::history::HistoryError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Persistence,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Storage failed; the message is generic, the cause was already logged.
    #[error("{0}")]
    Persistence(&'static str),

    #[error("Not found")]
    NotFound,
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    kind: ErrorKind,
}

impl ApiError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::NotFound => ErrorKind::NotFound,
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Maps a history failure, replacing storage detail with `public_message`.
    pub fn from_history(err: HistoryError, public_message: &'static str) -> Self {
        match err {
            HistoryError::Unauthorized => Self::Unauthorized,
            HistoryError::Validation(msg) => Self::Validation(msg),
            HistoryError::Persistence(_) => Self::Persistence(public_message),
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        json_response(
            self.status(),
            ErrorResponse {
                error: &message,
                kind: self.kind(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoreError;

    #[test]
    fn persistence_errors_hide_store_detail() {
        let err = ApiError::from_history(
            HistoryError::Persistence(StoreError::Config("password=hunter2".to_string())),
            "Failed to save calculation",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.to_string(), "Failed to save calculation");
    }

    #[test]
    fn unauthorized_and_validation_map_to_client_statuses() {
        let err = ApiError::from_history(HistoryError::Unauthorized, "unused");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::from_history(HistoryError::Validation("bad".to_string()), "unused");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "bad");
    }
}
