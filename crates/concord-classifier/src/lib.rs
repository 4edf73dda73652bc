//! Concord Classifier Layer
//!
//! Implementations of the `ClassifierService` trait from `concord-domain`.
//!
//! # Architecture
//!
//! The risk classifier is an external service. This crate hides its
//! transport behind the domain trait so the pipeline can be driven by the
//! real service or by a deterministic stand-in.
//!
//! # Classifiers
//!
//! - `MockClassifier`: Deterministic mock for testing
//! - `HttpClassifier`: JSON over HTTP with connect and request timeouts
//!
//! # Examples
//!
//! ```
//! use concord_classifier::MockClassifier;
//! use concord_domain::RiskLevel;
//!
//! let classifier = MockClassifier::new(RiskLevel::Low);
//! assert_eq!(classifier.call_count(), 0);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod http;

use concord_domain::traits::ClassifierService;
use concord_domain::{
    AccessId, Category, ClassificationRequest, FocusCategory, RiskLevel, ServiceFault, Verdict,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use config::ClassifierConfig;
pub use http::{HealthStatus, HttpClassifier};

/// Errors that can occur when calling the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The service could not be reached
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    /// No complete response within the request timeout
    #[error("Classifier timed out: {0}")]
    Timeout(String),

    /// The service answered with an error
    #[error("Classifier error (HTTP {status}): {message}")]
    Service {
        /// HTTP status of the response
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// A success response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The client could not be configured
    #[error("Invalid classifier configuration: {0}")]
    Config(String),
}

impl ClassifierError {
    /// Classify a transport-level failure
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifierError::Timeout(e.to_string())
        } else if e.is_decode() {
            ClassifierError::InvalidResponse(e.to_string())
        } else {
            ClassifierError::Unavailable(e.to_string())
        }
    }

    /// Whether re-invoking later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClassifierError::Unavailable(_) | ClassifierError::Timeout(_)
        )
    }
}

impl From<ClassifierError> for ServiceFault {
    fn from(e: ClassifierError) -> Self {
        if e.is_transient() {
            ServiceFault::Unavailable(e.to_string())
        } else {
            ServiceFault::Rejected(e.to_string())
        }
    }
}

/// Scripted outcome for one couple
#[derive(Debug, Clone)]
enum Scripted {
    Verdict(Verdict),
    Unavailable,
    Rejected(String),
}

/// Mock classifier for deterministic testing
///
/// Returns a fixed verdict without any network calls. Individual couples can
/// be scripted to receive a different verdict or to fail.
///
/// # Examples
///
/// ```
/// use concord_classifier::MockClassifier;
/// use concord_domain::{AccessId, RiskLevel};
///
/// let mut classifier = MockClassifier::new(RiskLevel::Medium);
/// classifier.add_unavailable(AccessId::from("offline"));
/// classifier.add_rejection(AccessId::from("bad"), "model not loaded");
/// ```
#[derive(Debug, Clone)]
pub struct MockClassifier {
    default_verdict: Verdict,
    scripted: Arc<Mutex<HashMap<AccessId, Scripted>>>,
    call_count: Arc<Mutex<usize>>,
    latency: Option<Duration>,
}

impl MockClassifier {
    /// Create a mock returning a verdict of the given risk level
    ///
    /// The verdict scores every category at 0.5 and carries no narrative, so
    /// callers exercise their own narrative completion.
    pub fn new(risk_level: RiskLevel) -> Self {
        Self::with_verdict(Self::verdict(risk_level))
    }

    /// Create a mock returning the given verdict for every couple
    pub fn with_verdict(verdict: Verdict) -> Self {
        Self {
            default_verdict: verdict,
            scripted: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            latency: None,
        }
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// A plain verdict of the given risk level
    pub fn verdict(risk_level: RiskLevel) -> Verdict {
        let category_scores: BTreeMap<String, f64> = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), 0.5))
            .collect();
        let focus_categories = Category::ALL
            .iter()
            .map(|c| FocusCategory::new(c.as_str(), 0.5))
            .collect();
        Verdict {
            risk_level,
            confidence: 0.8,
            category_scores,
            focus_categories,
            recommendations: Vec::new(),
            method: "mock".to_string(),
            risk_reasoning: None,
            counseling_reasoning: None,
        }
    }

    /// Return a specific verdict for one couple
    pub fn add_verdict(&mut self, access_id: AccessId, verdict: Verdict) {
        self.script(access_id, Scripted::Verdict(verdict));
    }

    /// Make one couple's classification fail as unreachable
    pub fn add_unavailable(&mut self, access_id: AccessId) {
        self.script(access_id, Scripted::Unavailable);
    }

    /// Make one couple's classification fail with a service error
    pub fn add_rejection(&mut self, access_id: AccessId, message: impl Into<String>) {
        self.script(access_id, Scripted::Rejected(message.into()));
    }

    /// Get the number of times classify was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) = 0;
    }

    fn script(&mut self, access_id: AccessId, outcome: Scripted) {
        self.scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(access_id, outcome);
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(RiskLevel::Low)
    }
}

impl ClassifierService for MockClassifier {
    type Error = ClassifierError;

    async fn classify(&self, request: &ClassificationRequest) -> Result<Verdict, Self::Error> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&request.context.couple_id)
            .cloned();

        match scripted {
            Some(Scripted::Verdict(verdict)) => Ok(verdict),
            Some(Scripted::Unavailable) => Err(ClassifierError::Unavailable(
                "mock service offline".to_string(),
            )),
            Some(Scripted::Rejected(message)) => {
                Err(ClassifierError::Service { status: 500, message })
            }
            None => Ok(self.default_verdict.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_domain::{
        Demographics, FeatureAssembler, RelationalFeatures, RequestContext, RespondentProfile,
        RespondentSequences,
    };

    fn request(id: &str) -> ClassificationRequest {
        let assembler = FeatureAssembler::default();
        let demographics =
            Demographics::from_profiles(&RespondentProfile::default(), &RespondentProfile::default());
        let sequences = RespondentSequences::default();
        let relational = RelationalFeatures::compute(&[], &[], &[], assembler.layout());
        ClassificationRequest {
            feature_vector: assembler.assemble(&demographics, &sequences, &relational),
            context: RequestContext {
                couple_id: AccessId::from(id),
                male_name: "A".to_string(),
                female_name: "B".to_string(),
                demographics,
                male_responses: vec![],
                female_responses: vec![],
                questionnaire_responses: vec![],
                personalized_features: relational,
                category_map_version: "v1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_mock_default_verdict() {
        let classifier = MockClassifier::new(RiskLevel::High);
        let verdict = classifier.classify(&request("c1")).await.unwrap();
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(verdict.category_scores.len(), 4);
        assert!(verdict.risk_reasoning.is_none());
    }

    #[tokio::test]
    async fn test_mock_scripted_outcomes() {
        let mut classifier = MockClassifier::default();
        classifier.add_unavailable(AccessId::from("down"));
        classifier.add_rejection(AccessId::from("bad"), "model not loaded");
        classifier.add_verdict(
            AccessId::from("special"),
            MockClassifier::verdict(RiskLevel::Medium),
        );

        let err = classifier.classify(&request("down")).await.unwrap_err();
        assert!(err.is_transient());

        let err = classifier.classify(&request("bad")).await.unwrap_err();
        assert!(matches!(err, ClassifierError::Service { status: 500, .. }));

        let verdict = classifier.classify(&request("special")).await.unwrap();
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn test_mock_call_count_shared_between_clones() {
        let a = MockClassifier::default();
        let b = a.clone();
        a.classify(&request("x")).await.unwrap();
        b.classify(&request("y")).await.unwrap();
        assert_eq!(a.call_count(), 2);
        a.reset_call_count();
        assert_eq!(b.call_count(), 0);
    }

    #[test]
    fn test_fault_mapping() {
        let fault: ServiceFault = ClassifierError::Timeout("30s".to_string()).into();
        assert!(matches!(fault, ServiceFault::Unavailable(_)));

        let fault: ServiceFault = ClassifierError::Service {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(
            fault,
            ServiceFault::Rejected("Classifier error (HTTP 500): boom".to_string())
        );

        let fault: ServiceFault = ClassifierError::InvalidResponse("x".to_string()).into();
        assert!(matches!(fault, ServiceFault::Rejected(_)));
    }
}
