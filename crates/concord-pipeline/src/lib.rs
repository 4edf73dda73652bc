//! Concord Pipeline
//!
//! Orchestrates feature engineering and classification for couples.
//!
//! # Overview
//!
//! A run takes one couple through these stages:
//!
//! | Stage | Work |
//! |-------|------|
//! | **Fetch** | Read profiles and answers from the `DataSource` |
//! | **Normalize** | Map every raw answer onto the 1-5 scale |
//! | **Split** | Partition answers into primary, secondary and combined |
//! | **Compute-Relational** | Alignment, conflict, consistency, balance, variance |
//! | **Assemble** | Build the fixed-length feature vector |
//! | **Submit** | Send the request to the `ClassifierService` |
//! | **Persist** | Store the verdict through the `ResultSink` |
//!
//! A run ends Completed or Failed. Nothing is retried internally; a caller
//! may re-run an id whose error is retryable.
//!
//! # Usage
//!
//! ## One Couple
//!
//! ```no_run
//! use concord_classifier::{ClassifierConfig, HttpClassifier};
//! use concord_domain::AccessId;
//! use concord_pipeline::{Pipeline, PipelineConfig};
//! use concord_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::new("concord.db")?;
//!     let classifier = HttpClassifier::new(ClassifierConfig::default())?;
//!     let pipeline = Pipeline::new(&store, classifier, &store, PipelineConfig::default())?;
//!
//!     let outcome = pipeline.run(&AccessId::from("ABC123")).await?;
//!     println!("{} ({})", outcome.verdict.risk_level, outcome.run_id);
//!     Ok(())
//! }
//! ```
//!
//! ## Batch
//!
//! ```no_run
//! # use concord_classifier::MockClassifier;
//! # use concord_pipeline::{Pipeline, PipelineConfig};
//! # use concord_store::SqliteStore;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("concord.db")?;
//! let pipeline = Pipeline::new(&store, MockClassifier::default(), &store, PipelineConfig::default())?;
//!
//! let ids = store.list_access_ids()?;
//! let report = pipeline.run_batch(&ids).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod worker;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use metrics::BatchReport;
pub use pipeline::{complete_narrative, Pipeline, RunOutcome};
pub use worker::BatchWorker;
