//! Error taxonomy and translation into structured problem responses.
//!
//! Every failure that can escape request handling is a [`GatewayError`]
//! variant, and this module is the single place where one becomes an
//! HTTP response. Business logic never builds error responses ad hoc;
//! it classifies, re-raises via `Result`, and lets
//! [`GatewayError::into_response`] resolve the status code, title, and
//! detail.

use std::fmt;

use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::{full, BoxBody};

/// Title used for every error response except those carrying their own.
pub const DEFAULT_TITLE: &str = "API Error Occurred";

/// Detail string substituted whenever an error carries a blank message.
pub const DEFAULT_DETAIL: &str = "API Error occurred. Please contact support or administrator.";

/// Every failure the gateway can produce.
#[derive(Debug)]
pub enum GatewayError {
    /// The configuration file could not be loaded or validated.
    Config(String),
    /// The requested resource does not exist. Raised directly by routing
    /// or business logic, distinct from upstream 404s (those arrive as
    /// [`GatewayError::System`] with an explicit 404 status).
    NotFound(String),
    /// An operation against the upstream resource could not complete.
    System {
        message: String,
        /// Title reported to the caller; blank falls back to [`DEFAULT_TITLE`].
        title: String,
        /// Raw status code as set by the raiser. Values outside the valid
        /// HTTP range are corrected to 500 at translation time.
        status_code: u16,
    },
    /// An upstream client error that escaped without classification;
    /// reports the upstream status verbatim.
    UpstreamClient { status: StatusCode, message: String },
    /// The request used an HTTP method the boundary does not support.
    MethodNotAllowed(String),
    /// An internal error that does not fit other categories.
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::System { message, .. } => write!(f, "system error: {message}"),
            Self::UpstreamClient { status, message } => {
                write!(f, "upstream client error ({status}): {message}")
            }
            Self::MethodNotAllowed(msg) => write!(f, "method not allowed: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// The structured problem payload returned for every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetail {
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl GatewayError {
    /// Constructs a generic system error with the default title and a
    /// 500 status code.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            title: DEFAULT_TITLE.into(),
            status_code: 500,
        }
    }

    /// Constructs a system error carrying an explicit title and status code.
    pub fn system_with(
        message: impl Into<String>,
        title: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self::System {
            message: message.into(),
            title: title.into(),
            status_code,
        }
    }

    /// Resolves the HTTP status code for this error.
    ///
    /// A [`GatewayError::System`] whose raw code cannot be mapped to a
    /// valid HTTP status resolves to 500 with an internal log entry;
    /// the invalid code is never surfaced to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::System { status_code, .. } => resolve_status(*status_code),
            Self::UpstreamClient { status, .. } => *status,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the title reported in the problem payload.
    pub fn title(&self) -> &str {
        match self {
            Self::System { title, .. } if !title.trim().is_empty() => title,
            _ => DEFAULT_TITLE,
        }
    }

    /// Returns the human-readable detail, substituting [`DEFAULT_DETAIL`]
    /// for blank messages so callers never see an empty string.
    pub fn detail(&self) -> &str {
        let message = match self {
            Self::Config(msg)
            | Self::NotFound(msg)
            | Self::MethodNotAllowed(msg)
            | Self::Internal(msg) => msg,
            Self::System { message, .. } | Self::UpstreamClient { message, .. } => message,
        };
        if message.trim().is_empty() {
            DEFAULT_DETAIL
        } else {
            message
        }
    }

    /// Converts this error into an HTTP response carrying the problem
    /// payload as `application/problem+json`.
    pub fn into_response(self) -> Response<BoxBody> {
        let status = self.status_code();
        let problem = ProblemDetail {
            title: self.title().to_owned(),
            status: status.as_u16(),
            detail: self.detail().to_owned(),
        };

        let body = serde_json::to_vec(&problem).unwrap_or_else(|_| {
            format!("{{\"title\":\"{DEFAULT_TITLE}\",\"status\":500,\"detail\":\"{DEFAULT_DETAIL}\"}}")
                .into_bytes()
        });

        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/problem+json")
            .body(full(body))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(full(Vec::new()))
                    .expect("building fallback response must not fail")
            })
    }
}

/// Maps a raw status code to a [`StatusCode`], falling back to 500 when
/// the code is outside the valid HTTP range.
fn resolve_status(code: u16) -> StatusCode {
    match StatusCode::from_u16(code) {
        Ok(status) if code <= 599 => status,
        _ => {
            info!(
                code,
                "error status code could not be mapped to a valid HTTP status, using 500"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<hyper::http::Error> for GatewayError {
    fn from(err: hyper::http::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
