//! API errors.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered 404.
    #[error("{detail}")]
    NotFound {
        /// Service-provided reason
        detail: String,
    },

    /// The service answered 401; the credential is missing or stale.
    #[error("unauthorized: {detail}")]
    Unauthorized {
        /// Service-provided reason
        detail: String,
    },

    /// Any other non-success answer, carried verbatim.
    #[error("{detail} (HTTP {status})")]
    Rejected {
        /// Response status
        status: StatusCode,

        /// Service-provided reason
        detail: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    /// A success response did not have the expected shape.
    #[error("malformed response from {endpoint}")]
    Malformed {
        /// Endpoint path
        endpoint: String,

        /// Decode failure
        #[source]
        source: serde_json::Error,
    },

    /// The configured service URL cannot carry request paths.
    #[error("invalid service base URL: {0:?}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// The service's own explanation, when it sent one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::NotFound { detail }
            | Self::Unauthorized { detail }
            | Self::Rejected { detail, .. } => Some(detail),
            Self::Transport(_) | Self::Malformed { .. } | Self::InvalidBaseUrl(_) => None,
        }
    }

    /// HTTP status of a rejection.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport(error) => error.status(),
            Self::Malformed { .. } | Self::InvalidBaseUrl(_) => None,
        }
    }

    /// Classify a non-success response.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = error_detail(status, body);

        match status {
            StatusCode::NOT_FOUND => Self::NotFound { detail },
            StatusCode::UNAUTHORIZED => Self::Unauthorized { detail },
            status => Self::Rejected { status, detail },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Extract the `detail` of an error body.
///
/// Plain string details are returned as is; structured ones (validation
/// failures) are returned as compact JSON. Bodies without a detail fall back
/// to the raw text, then to the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_carried_verbatim() {
        let error = ApiError::from_response(
            StatusCode::CONFLICT,
            r#"{"detail": "Price changed for P1001"}"#,
        );

        assert_eq!(error.detail(), Some("Price changed for P1001"));
        assert_eq!(error.status(), Some(StatusCode::CONFLICT));
        assert_eq!(error.to_string(), "Price changed for P1001 (HTTP 409 Conflict)");
    }

    #[test]
    fn not_found_and_unauthorized_are_classified() {
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, r#"{"detail":"Invoice not found"}"#),
            ApiError::NotFound { detail } if detail == "Invoice not found"
        ));

        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"detail":"Invalid credentials"}"#),
            ApiError::Unauthorized { detail } if detail == "Invalid credentials"
        ));
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let error = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}]}"#,
        );

        assert!(
            error.detail().is_some_and(|detail| detail.contains("field required")),
            "unexpected detail: {error:?}"
        );
    }

    #[test]
    fn non_json_body_falls_back_to_text_then_reason() {
        let text = ApiError::from_response(StatusCode::BAD_GATEWAY, "upstream down\n");
        let empty = ApiError::from_response(StatusCode::BAD_GATEWAY, "");

        assert_eq!(text.detail(), Some("upstream down"));
        assert_eq!(empty.detail(), Some("Bad Gateway"));
    }

    #[test]
    fn local_failures_carry_no_service_detail() {
        let error = ApiError::InvalidBaseUrl("mailto:desk@example.com".to_string());

        assert_eq!(error.detail(), None);
        assert_eq!(error.status(), None);
    }
}
