//! Saga error types.

use domain::DomainError;
use thiserror::Error;

/// Failure reported by one of the external services.
///
/// `Rejected` and `NotFound` are structured business outcomes whose message
/// is meant for the end user. Everything else is a transport or protocol
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service refused the request (4xx with a message).
    #[error("{0}")]
    Rejected(String),

    /// The addressed record does not exist for this user.
    #[error("{0}")]
    NotFound(String),

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a status the caller does not handle.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// True for failures worth re-driving later: transport errors and
    /// server-side (5xx) statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// True for structured business outcomes.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ServiceError::Rejected(_) | ServiceError::NotFound(_))
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ReservationNotFound => ServiceError::NotFound(err.to_string()),
            _ => ServiceError::Rejected(err.to_string()),
        }
    }
}

/// Errors surfaced by the checkout and return sagas.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Structured rejection; the message goes to the caller verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The reservation does not exist for this user.
    #[error("{0}")]
    NotFound(String),

    /// A step failed for a non-business reason.
    #[error("{step}: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl SagaError {
    /// Classifies a service failure raised while running `step`.
    ///
    /// Business outcomes pass through untouched, anything else is tagged
    /// with the step name.
    pub fn at_step(step: &'static str, err: ServiceError) -> Self {
        match err {
            ServiceError::Rejected(message) => SagaError::Rejected(message),
            ServiceError::NotFound(message) => SagaError::NotFound(message),
            source => SagaError::Step { step, source },
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, SagaError::Rejected(_) | SagaError::NotFound(_))
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_failures() {
        assert!(ServiceError::Transport("refused".into()).is_retryable());
        assert!(
            ServiceError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ServiceError::Status {
                status: 409,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ServiceError::Rejected("no".into()).is_retryable());
        assert!(!ServiceError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn domain_errors_become_rejections() {
        assert_eq!(
            ServiceError::from(DomainError::NoAvailableCopies),
            ServiceError::Rejected("there is 0 available books in library".into())
        );
        assert_eq!(
            ServiceError::from(DomainError::ReservationNotFound),
            ServiceError::NotFound("reservation not found".into())
        );
    }

    #[test]
    fn rejections_pass_through_steps_verbatim() {
        let err = SagaError::at_step("take_book", ServiceError::Rejected("nope".into()));
        assert!(matches!(err, SagaError::Rejected(ref m) if m == "nope"));
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn transport_errors_are_tagged_with_step() {
        let err = SagaError::at_step("get_rating", ServiceError::Transport("timed out".into()));
        assert_eq!(err.to_string(), "get_rating: transport error: timed out");
        assert!(!err.is_rejection());
    }
}
