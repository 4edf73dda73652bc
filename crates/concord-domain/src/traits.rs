//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the feature pipeline and the
//! systems around it. Implementations live in other crates.

use crate::{AccessId, ClassificationRequest, CoupleRecord, Verdict};
use std::fmt;

/// Source of couple records
///
/// Implemented by the infrastructure layer (concord-store)
pub trait DataSource {
    /// Error type for source operations
    type Error;

    /// Fetch a couple's profiles and answers
    ///
    /// Returns `Ok(None)` when no couple has this access id. Answers must be
    /// ordered by (category id, question id, sub-question id).
    fn get_couple_record(&self, access_id: &AccessId) -> Result<Option<CoupleRecord>, Self::Error>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    type Error = T::Error;

    fn get_couple_record(&self, access_id: &AccessId) -> Result<Option<CoupleRecord>, Self::Error> {
        (**self).get_couple_record(access_id)
    }
}

/// Remote risk classifier
///
/// Implemented by the infrastructure layer (concord-classifier)
#[allow(async_fn_in_trait)]
pub trait ClassifierService {
    /// Error type for classifier operations
    type Error: Into<ServiceFault> + fmt::Display;

    /// Classify one couple
    async fn classify(&self, request: &ClassificationRequest) -> Result<Verdict, Self::Error>;
}

/// Destination for verdicts
///
/// Implemented by the infrastructure layer (concord-store)
pub trait ResultSink {
    /// Error type for sink operations
    type Error;

    /// Store the verdict for a couple, replacing any earlier one
    fn persist(&self, access_id: &AccessId, verdict: &Verdict) -> Result<(), Self::Error>;
}

impl<T: ResultSink + ?Sized> ResultSink for &T {
    type Error = T::Error;

    fn persist(&self, access_id: &AccessId, verdict: &Verdict) -> Result<(), Self::Error> {
        (**self).persist(access_id, verdict)
    }
}

/// How a classifier call failed, as seen by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFault {
    /// The service could not be reached or timed out; retrying may help
    Unavailable(String),
    /// The service answered with an error; surfaced as-is
    Rejected(String),
}

impl fmt::Display for ServiceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFault::Unavailable(msg) => write!(f, "service unavailable: {}", msg),
            ServiceFault::Rejected(msg) => write!(f, "service error: {}", msg),
        }
    }
}
