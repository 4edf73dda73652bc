//! Concord Domain Layer
//!
//! This crate contains the feature-engineering core of Concord: turning a
//! couple's raw questionnaire answers into the fixed-length feature vector
//! consumed by the risk classifier, plus the relational metrics that describe
//! how the two respondents' answers relate.
//!
//! ## Key Concepts
//!
//! - **RawAnswer**: one stored answer, either a numeric code or free text
//! - **Normalizer**: maps raw values onto the 1-5 scale
//! - **Splitter**: separates primary, secondary and combined sequences
//! - **Relational features**: alignment, conflict, consistency, balance
//! - **Feature vector**: 11 demographic + 59 response + 12 relational values
//!
//! ## Example
//!
//! ```
//! use concord_domain::{
//!     Demographics, FeatureAssembler, QuestionKey, RawAnswer, RelationalFeatures,
//!     Respondent, RespondentProfile, RespondentSequences, ResponseNormalizer,
//! };
//!
//! let answers = vec![
//!     RawAnswer::new(Respondent::Primary, QuestionKey::new(1, 1, None), "Agree"),
//!     RawAnswer::new(Respondent::Secondary, QuestionKey::new(1, 1, None), 2i64),
//! ];
//!
//! let normalized = ResponseNormalizer::default().normalize_all(&answers);
//! let sequences = RespondentSequences::split(&normalized);
//!
//! let assembler = FeatureAssembler::default();
//! let relational = RelationalFeatures::compute(
//!     &sequences.primary_values(),
//!     &sequences.secondary_values(),
//!     &sequences.combined_values(),
//!     assembler.layout(),
//! );
//! assert_eq!(relational.total_conflicts, 1);
//!
//! let demographics = Demographics::from_profiles(
//!     &RespondentProfile::default(),
//!     &RespondentProfile::default(),
//! );
//! let vector = assembler.assemble(&demographics, &sequences, &relational);
//! assert_eq!(vector.len(), 82);
//! ```
//!
//! ## Architecture
//!
//! - Pure computation only; no I/O
//! - Collaborators (data source, classifier, sink) are traits in [`traits`]
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod assembler;
pub mod category;
pub mod layout;
pub mod mapping;
pub mod narrative;
pub mod normalizer;
pub mod profile;
pub mod relational;
pub mod splitter;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use answer::{AccessId, NormalizedAnswer, QuestionKey, RawAnswer, RawValue, Respondent};
pub use assembler::{FeatureAssembler, FeatureVector};
pub use category::{Category, CategoryEntry, CategoryMap};
pub use layout::FeatureLayout;
pub use normalizer::ResponseNormalizer;
pub use profile::{CivilStatus, CoupleRecord, Demographics, RespondentProfile};
pub use relational::RelationalFeatures;
pub use splitter::RespondentSequences;
pub use traits::{ClassifierService, DataSource, ResultSink, ServiceFault};
pub use verdict::{
    ClassificationRequest, FocusCategory, Priority, RequestContext, RiskLevel, Verdict,
};
