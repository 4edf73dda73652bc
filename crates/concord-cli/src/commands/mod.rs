//! Command implementations.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod features;
pub mod import;
pub mod status;

pub use self::analyze::execute_analyze;
pub use self::batch::execute_batch;
pub use self::config::execute_config;
pub use self::features::execute_features;
pub use self::import::execute_import;
pub use self::status::execute_status;

use crate::config::Config;
use crate::error::Result;
use concord_classifier::HttpClassifier;
use concord_pipeline::Pipeline;
use concord_store::SqliteStore;
use tracing::info;

/// Pipeline reading from and writing to one SQLite store
pub type StorePipeline<'a> = Pipeline<&'a SqliteStore, HttpClassifier, &'a SqliteStore>;

/// Open the configured database.
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(&config.store.path)?)
}

/// Build a pipeline over `store` from the configuration.
pub fn build_pipeline<'a>(config: &Config, store: &'a SqliteStore) -> Result<StorePipeline<'a>> {
    let mut pipeline_config = config.pipeline.clone();
    if config.store.catalog_map {
        if let Some(map) = store.load_category_map("catalog")? {
            info!(entries = map.entries.len(), "Using category map from database catalog");
            pipeline_config.category_map = map;
        }
    }

    let classifier = HttpClassifier::new(config.classifier.clone())?;
    Ok(Pipeline::new(store, classifier, store, pipeline_config)?)
}
