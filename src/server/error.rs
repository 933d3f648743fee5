//! HTTP error responses.
//!
//! Every failure that happens before the first byte of a reply becomes
//! a JSON body of the form:
//!
//! ```text
//! { "error": { "code": "bad_gateway", "message": "transport failure: ..." } }
//! ```

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::core::error::ChatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Body was not a JSON array of `{role, content}`.
    BadRequest(String),
    /// The model backend failed before any text was produced.
    BadGateway(String),
    /// No text within the request time budget.
    GatewayTimeout,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::BadGateway(_) => "bad_gateway",
            Self::GatewayTimeout => "gateway_timeout",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::BadGateway(msg) => write!(f, "{msg}"),
            Self::GatewayTimeout => write!(f, "{}", ChatError::Timeout),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidInput => Self::BadRequest(err.to_string()),
            ChatError::Timeout => Self::GatewayTimeout,
            ChatError::TransportFailure(_) | ChatError::StreamCorruption(_) => {
                Self::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}
