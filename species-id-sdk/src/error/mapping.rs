//! Error mapping for the inference backend
//!
//! Converts HTTP statuses and reqwest failures into [`AttemptOutcome`]
//! values. Priority order: transport failure, 429, 404, other non-2xx.

use reqwest::StatusCode;

use crate::backend::AttemptOutcome;

/// Map a non-success HTTP status to an attempt outcome
pub fn classify_status(status: StatusCode) -> AttemptOutcome {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AttemptOutcome::RateLimited,
        StatusCode::NOT_FOUND => AttemptOutcome::NotFound,
        other => AttemptOutcome::ServerError(other.as_u16()),
    }
}

/// Map a reqwest error raised before a status was received
pub fn classify_transport(err: &reqwest::Error) -> AttemptOutcome {
    let cause = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection error: {}", err)
    } else if err.is_redirect() {
        format!("too many redirects: {}", err)
    } else {
        format!("http client error: {}", err)
    };

    AttemptOutcome::TransportError(cause)
}

/// Helper function to label HTTP statuses for logging
pub fn status_label(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "success",
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), AttemptOutcome::RateLimited);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), AttemptOutcome::NotFound);
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            AttemptOutcome::ServerError(503)
        );
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), AttemptOutcome::ServerError(401));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(StatusCode::OK), "success");
        assert_eq!(status_label(StatusCode::TOO_MANY_REQUESTS), "rate_limit");
        assert_eq!(status_label(StatusCode::BAD_GATEWAY), "server");
        assert_eq!(status_label(StatusCode::IM_A_TEAPOT), "unknown");
    }
}
