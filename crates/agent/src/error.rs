use atelier_core::{ApplicationError, DomainError, FlowTransitionError, InterfaceError};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    Analysis,
    Image,
}

impl std::fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Analysis => "analysis",
            Self::Image => "image",
        })
    }
}

/// The specific reason one generative call failed. Kept for logs; callers only
/// ever see [`SubmissionError`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{call} request could not be sent: {source}")]
    Transport {
        call: ServiceCall,
        #[source]
        source: reqwest::Error,
    },
    #[error("{call} request returned HTTP {code}: {body}")]
    Status { call: ServiceCall, code: u16, body: String },
    #[error("{call} response was malformed: {reason}")]
    MalformedResponse { call: ServiceCall, reason: String },
    #[error("{call} response carried no usable content")]
    EmptyResponse { call: ServiceCall },
    #[error("design could not be encoded for the service: {0}")]
    InvalidPayload(#[from] DomainError),
    #[error("generative client setup failed: {0}")]
    Setup(String),
}

impl GenerationError {
    pub fn call(&self) -> Option<ServiceCall> {
        match self {
            Self::Transport { call, .. }
            | Self::Status { call, .. }
            | Self::MalformedResponse { call, .. }
            | Self::EmptyResponse { call } => Some(*call),
            Self::InvalidPayload(_) | Self::Setup(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submission {submission_id} failed: {source}")]
    Failed {
        submission_id: String,
        #[source]
        source: GenerationError,
    },
    #[error(transparent)]
    Rejected(#[from] FlowTransitionError),
}

impl SubmissionError {
    pub fn into_interface(self) -> InterfaceError {
        match self {
            Self::Failed { submission_id, source } => {
                ApplicationError::Integration(source.to_string()).into_interface(submission_id)
            }
            Self::Rejected(error) => {
                ApplicationError::from(DomainError::from(error)).into_interface("unassigned")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::{FlowTransitionError, InterfaceError, SUBMISSION_FAILED_MESSAGE};

    use super::{GenerationError, ServiceCall, SubmissionError};

    #[test]
    fn every_call_failure_flattens_to_one_notice() {
        let causes = vec![
            GenerationError::Status { call: ServiceCall::Image, code: 429, body: "quota".into() },
            GenerationError::MalformedResponse {
                call: ServiceCall::Analysis,
                reason: "expected value at line 1".into(),
            },
            GenerationError::EmptyResponse { call: ServiceCall::Analysis },
        ];

        for cause in causes {
            let error = SubmissionError::Failed { submission_id: "sub-9".into(), source: cause };
            let interface = error.into_interface();
            assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
            assert_eq!(interface.correlation_id(), "sub-9");
            assert_eq!(interface.user_message(), SUBMISSION_FAILED_MESSAGE);
        }
    }

    #[test]
    fn rejected_submission_is_a_bad_request() {
        let error = SubmissionError::from(FlowTransitionError::SubmissionInFlight);
        assert!(matches!(error.into_interface(), InterfaceError::BadRequest { .. }));
    }

    #[test]
    fn call_is_reported_for_service_failures() {
        let error = GenerationError::EmptyResponse { call: ServiceCall::Image };
        assert_eq!(error.call(), Some(ServiceCall::Image));
        assert_eq!(error.to_string(), "image response carried no usable content");
    }
}
