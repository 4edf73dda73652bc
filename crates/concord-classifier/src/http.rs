//! HTTP Classifier Implementation
//!
//! Talks to the risk-classification service over JSON/HTTP.
//!
//! # Features
//!
//! - POST of the feature vector and context to the analysis route
//! - Separate connect and request timeouts
//! - Tolerant response parsing (list or map category scores, field aliases)
//! - Health probe
//!
//! # Examples
//!
//! ```no_run
//! use concord_classifier::{ClassifierConfig, HttpClassifier};
//!
//! # async fn run() -> Result<(), concord_classifier::ClassifierError> {
//! let classifier = HttpClassifier::new(ClassifierConfig::default())?;
//! let health = classifier.health().await?;
//! println!("{}", health.status);
//! # Ok(())
//! # }
//! ```

use crate::{ClassifierConfig, ClassifierError};
use concord_domain::traits::ClassifierService;
use concord_domain::{Category, ClassificationRequest, FocusCategory, Priority, RiskLevel, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Classifier Service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

/// Body of the health route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "healthy" when the service is up
    pub status: String,
    /// Service name, if reported
    #[serde(default)]
    pub service: Option<String>,
    /// Service version, if reported
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    /// Whether the service reports itself healthy
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// Category scores as either positional values or a name map
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireScores {
    List(Vec<f64>),
    Map(BTreeMap<String, f64>),
}

impl Default for WireScores {
    fn default() -> Self {
        WireScores::Map(BTreeMap::new())
    }
}

#[derive(Debug, Deserialize)]
struct WireFocus {
    name: String,
    score: f64,
    #[serde(default)]
    priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireVerdict {
    risk_level: String,
    #[serde(alias = "ml_confidence")]
    confidence: f64,
    #[serde(default)]
    category_scores: WireScores,
    #[serde(default)]
    focus_categories: Vec<WireFocus>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(alias = "analysis_method", default)]
    method: String,
    #[serde(default)]
    risk_reasoning: Option<String>,
    #[serde(default)]
    counseling_reasoning: Option<String>,
}

impl HttpClassifier {
    /// Create a client for the configured service
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        config.validate().map_err(ClassifierError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClassifierError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Configuration in use
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Submit one couple for classification
    ///
    /// # Errors
    ///
    /// - `Timeout` if no complete response arrived in time
    /// - `Unavailable` if the service could not be reached
    /// - `Service` if the service answered with an error
    /// - `InvalidResponse` if a success response could not be understood
    pub async fn analyze(&self, request: &ClassificationRequest) -> Result<Verdict, ClassifierError> {
        let url = self.config.analyze_url();
        debug!(
            url = %url,
            couple_id = %request.context.couple_id,
            features = request.feature_vector.len(),
            "Submitting feature vector"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClassifierError::from_transport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(ClassifierError::from_transport)?;

        parse_analysis(status.as_u16(), &text)
    }

    /// Probe the service's health route
    pub async fn health(&self) -> Result<HealthStatus, ClassifierError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(ClassifierError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(format!("Failed to parse health: {}", e)))
    }
}

impl ClassifierService for HttpClassifier {
    type Error = ClassifierError;

    async fn classify(&self, request: &ClassificationRequest) -> Result<Verdict, Self::Error> {
        self.analyze(request).await
    }
}

/// Interpret an analysis response body
///
/// The service reports errors both through HTTP status codes and through a
/// `status: "error"` envelope on a 200 response.
pub(crate) fn parse_analysis(status: u16, body: &str) -> Result<Verdict, ClassifierError> {
    let http_ok = (200..300).contains(&status);

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !http_ok => {
            return Err(ClassifierError::Service {
                status,
                message: body.trim().to_string(),
            })
        }
        Err(e) => {
            return Err(ClassifierError::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        }
    };

    // A missing status on a 2xx response counts as success
    let envelope_status = value.get("status").and_then(|s| s.as_str());
    let succeeded = envelope_status.map_or(true, |s| s.eq_ignore_ascii_case("success"));

    if !succeeded || !http_ok {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("status '{}'", envelope_status.unwrap_or("unknown")));
        return Err(ClassifierError::Service { status, message });
    }

    let wire: WireVerdict = serde_json::from_value(value)
        .map_err(|e| ClassifierError::InvalidResponse(format!("Malformed verdict: {}", e)))?;

    into_verdict(wire)
}

fn into_verdict(wire: WireVerdict) -> Result<Verdict, ClassifierError> {
    let risk_level = RiskLevel::parse(&wire.risk_level).ok_or_else(|| {
        ClassifierError::InvalidResponse(format!("Unknown risk level '{}'", wire.risk_level))
    })?;

    if !(0.0..=1.0).contains(&wire.confidence) {
        return Err(ClassifierError::InvalidResponse(format!(
            "Confidence {} outside [0, 1]",
            wire.confidence
        )));
    }

    let category_scores = match wire.category_scores {
        WireScores::Map(map) => map,
        WireScores::List(values) => {
            if values.len() != Category::ALL.len() {
                warn!(
                    count = values.len(),
                    "Positional category scores do not match the category set"
                );
            }
            Category::ALL
                .iter()
                .zip(values)
                .map(|(c, v)| (c.as_str().to_string(), v))
                .collect()
        }
    };

    let focus_categories = wire
        .focus_categories
        .into_iter()
        .map(|f| {
            let priority = match f.priority.as_deref().map(str::to_lowercase).as_deref() {
                Some("high") => Priority::High,
                Some("moderate") | Some("medium") => Priority::Moderate,
                Some("low") => Priority::Low,
                _ => Priority::from_score(f.score),
            };
            FocusCategory {
                name: f.name,
                score: f.score,
                priority,
            }
        })
        .collect();

    Ok(Verdict {
        risk_level,
        confidence: wire.confidence,
        category_scores,
        focus_categories,
        recommendations: wire.recommendations,
        method: wire.method,
        risk_reasoning: wire.risk_reasoning,
        counseling_reasoning: wire.counseling_reasoning,
    })
}
