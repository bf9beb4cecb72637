//! Server errors and rejection mapping

use casegen_service::{ConfigError, ServiceError};
use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Errors starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Service could not be built
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Configuration invalid
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Listener could not bind
    #[error("bind error: {0}")]
    Bind(#[from] warp::Error),

    /// Host/port do not form a socket address
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),
}

/// Service failure carried through warp's rejection chain
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl warp::reject::Reject for ApiError {}

/// Reject a request with a service failure
#[must_use]
pub fn reject(err: ServiceError) -> Rejection {
    warp::reject::custom(ApiError(err))
}

/// Status code for a service failure
#[must_use]
pub fn status_for(err: &ServiceError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_bad_request() {
        StatusCode::BAD_REQUEST
    } else {
        match err {
            ServiceError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Llm(_) | ServiceError::GitHub(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Message returned to the client
///
/// Rejected webhooks report the GitHub error alone, without the wrapper prefix.
#[must_use]
pub fn public_message(err: &ServiceError) -> String {
    match err {
        ServiceError::GitHub(inner) if inner.is_rejected_event() => inner.to_string(),
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

/// Turn any rejection into a JSON error response
///
/// # Errors
/// Never fails
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(ApiError(e)) = err.find::<ApiError>() {
        let status = status_for(e);
        if status.is_server_error() {
            tracing::error!(error = %e, %status, "request failed");
        } else {
            tracing::debug!(error = %e, %status, "request rejected");
        }
        (status, public_message(e))
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    let body = warp::reply::json(&ErrorBody {
        code: status.as_u16(),
        message,
    });
    Ok(warp::reply::with_status(body, status))
}
