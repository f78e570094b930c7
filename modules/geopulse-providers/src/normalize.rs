//! Folds transport and HTTP failures into the normalized `ProviderError`.

use geopulse_common::{ProviderError, ProviderErrorKind};
use reqwest::StatusCode;

/// Map a transport-level reqwest failure (no HTTP response received, or the
/// body stream broke) into a ProviderError.
pub fn from_transport(vendor: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::new(
            ProviderErrorKind::Timeout,
            format!("{vendor} request timed out: {err}"),
            true,
        )
    } else if err.is_decode() {
        ProviderError::new(
            ProviderErrorKind::Malformed,
            format!("{vendor} response could not be decoded: {err}"),
            false,
        )
    } else {
        ProviderError::new(
            ProviderErrorKind::Network,
            format!("{vendor} request failed: {err}"),
            true,
        )
    }
}

/// Map a non-success HTTP status into a ProviderError.
/// 429 and 5xx are retryable; other client errors are not.
pub fn from_status(vendor: &str, status: StatusCode, body: &str) -> ProviderError {
    let message = format!("{vendor} API error ({status}): {body}");
    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::new(ProviderErrorKind::RateLimited, message, true)
    } else if status.is_server_error() {
        ProviderError::new(ProviderErrorKind::Api, message, true)
    } else {
        ProviderError::new(ProviderErrorKind::Api, message, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable() {
        let e = from_status("openai", StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(e.kind, ProviderErrorKind::RateLimited);
        assert!(e.retryable);
    }

    #[test]
    fn server_error_is_retryable() {
        let e = from_status("tavily", StatusCode::BAD_GATEWAY, "");
        assert_eq!(e.kind, ProviderErrorKind::Api);
        assert!(e.retryable);
    }

    #[test]
    fn client_error_is_not_retryable() {
        let e = from_status("serper", StatusCode::UNAUTHORIZED, "bad key");
        assert_eq!(e.kind, ProviderErrorKind::Api);
        assert!(!e.retryable);
    }
}
