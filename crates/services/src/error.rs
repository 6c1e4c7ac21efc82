//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use quiz_core::model::QuestionSetError;

/// How a generation failure is reported in diagnostics.
///
/// The session treats both kinds the same way; the split only matters for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Transport or service failure after retries were exhausted.
    Failed,
    /// The service answered, but the payload had the wrong shape.
    Invalid,
}

/// Errors emitted by quiz generators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("quiz generator is not configured")]
    Disabled,
    #[error("generator request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator returned status {status}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("generator did not answer within {after:?}")]
    TimedOut { after: Duration },
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("generator returned an invalid quiz: {0}")]
    Invalid(#[from] QuestionSetError),
}

impl GeneratorError {
    #[must_use]
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::Disabled | Self::Http(_) | Self::HttpStatus { .. } | Self::TimedOut { .. } => {
                GenerationErrorKind::Failed
            }
            Self::EmptyResponse | Self::Json(_) | Self::Invalid(_) => GenerationErrorKind::Invalid,
        }
    }

    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => !err.is_decode() && !err.is_builder(),
            Self::HttpStatus { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || *status == reqwest::StatusCode::REQUEST_TIMEOUT
                    || status.is_server_error()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_classified() {
        let rate_limited = GeneratorError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: String::new(),
        };
        assert!(rate_limited.is_transient());
        assert_eq!(rate_limited.kind(), GenerationErrorKind::Failed);

        let bad_request = GeneratorError::HttpStatus {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: String::new(),
        };
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn shape_errors_are_invalid_and_final() {
        let err = GeneratorError::Invalid(QuestionSetError::Empty);
        assert_eq!(err.kind(), GenerationErrorKind::Invalid);
        assert!(!err.is_transient());
        assert!(!GeneratorError::EmptyResponse.is_transient());
    }

    #[test]
    fn sub_second_timeouts_keep_their_unit() {
        let err = GeneratorError::TimedOut {
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "generator did not answer within 250ms");
        assert_eq!(err.kind(), GenerationErrorKind::Failed);
    }
}
