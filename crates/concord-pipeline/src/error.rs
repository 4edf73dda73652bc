//! Error types for pipeline runs

use concord_domain::{AccessId, Respondent};
use thiserror::Error;

/// Why a pipeline run for one couple ended in Failed
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The data source has no record for this access id
    #[error("couple not found: {0}")]
    NotFound(AccessId),

    /// One respondent's profile is absent
    #[error("missing {respondent} profile for couple {access_id}")]
    MissingProfile {
        /// Couple whose record is incomplete
        access_id: AccessId,
        /// Respondent without a profile
        respondent: Respondent,
    },

    /// The classifier could not be reached or timed out
    #[error("classifier unavailable for couple {access_id}: {message}")]
    ServiceUnavailable {
        /// Couple being classified
        access_id: AccessId,
        /// Transport detail
        message: String,
    },

    /// The classifier answered with an error
    #[error("classifier error for couple {access_id}: {message}")]
    Service {
        /// Couple being classified
        access_id: AccessId,
        /// Message reported by the service
        message: String,
    },

    /// The data source failed
    #[error("data source error: {0}")]
    Source(String),

    /// The result sink failed
    #[error("result sink error: {0}")]
    Sink(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether re-invoking the run may succeed without any other change
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::ServiceUnavailable { .. })
    }

    /// The couple this error concerns, when known
    pub fn access_id(&self) -> Option<&AccessId> {
        match self {
            PipelineError::NotFound(id) => Some(id),
            PipelineError::MissingProfile { access_id, .. }
            | PipelineError::ServiceUnavailable { access_id, .. }
            | PipelineError::Service { access_id, .. } => Some(access_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        let id = AccessId::from("c1");
        assert!(PipelineError::ServiceUnavailable {
            access_id: id.clone(),
            message: "timeout".to_string()
        }
        .is_retryable());
        assert!(!PipelineError::Service {
            access_id: id.clone(),
            message: "model not loaded".to_string()
        }
        .is_retryable());
        assert!(!PipelineError::NotFound(id).is_retryable());
        assert!(!PipelineError::Sink("locked".to_string()).is_retryable());
    }

    #[test]
    fn test_messages_name_the_couple() {
        let err = PipelineError::MissingProfile {
            access_id: AccessId::from("XYZ"),
            respondent: Respondent::Secondary,
        };
        assert!(err.to_string().contains("XYZ"));
        assert_eq!(err.access_id(), Some(&AccessId::from("XYZ")));
        assert_eq!(PipelineError::Config("bad".to_string()).access_id(), None);
    }
}
