//! Batch command implementation.

use super::{build_pipeline, open_store};
use crate::cli::BatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use concord_domain::AccessId;
use concord_pipeline::BatchWorker;
use concord_store::SqliteStore;
use std::collections::HashSet;
use std::fs;

/// Execute the batch command.
///
/// Ctrl+C stops dispatching new couples; those already submitted finish and
/// the rest are reported as skipped.
pub async fn execute_batch(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut config = config.clone();
    if let Some(concurrency) = args.concurrency {
        config.pipeline.max_concurrency = concurrency;
    }

    let store = open_store(&config)?;
    let pipeline = build_pipeline(&config, &store)?;
    let mut worker = BatchWorker::new(pipeline);

    let report = if args.watch {
        println!(
            "{}",
            formatter.info(&format!(
                "Watching for pending couples every {}s (Ctrl+C to stop)",
                config.pipeline.watch_interval_secs
            ))
        );
        worker.watch(|| store.pending_access_ids()).await
    } else {
        let ids = collect_ids(&args, &store)?;
        if ids.is_empty() {
            return Err(CliError::InvalidInput(
                "No access ids given (pass ids, --file, --all or --pending)".to_string(),
            ));
        }
        println!("{}", formatter.info(&format!("Classifying {} couple(s)", ids.len())));
        worker.run_once(&ids).await
    };

    println!("{}", formatter.format_report(&report)?);
    if report.retryable > 0 {
        println!(
            "{}",
            formatter.warning(&format!(
                "{} couple(s) failed on an unavailable classifier and can be retried",
                report.retryable
            ))
        );
    }
    Ok(())
}

/// Gather ids from every requested source, first occurrence wins.
fn collect_ids(args: &BatchArgs, store: &SqliteStore) -> Result<Vec<AccessId>> {
    let mut ids: Vec<AccessId> = args.ids.iter().map(|id| AccessId::from(id.as_str())).collect();

    if let Some(file) = &args.file {
        ids.extend(parse_id_list(&fs::read_to_string(file)?));
    }
    if args.all {
        ids.extend(store.list_access_ids()?);
    }
    if args.pending {
        ids.extend(store.pending_access_ids()?);
    }

    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    Ok(ids)
}

/// One id per line; blank lines and `#` comments are ignored.
fn parse_id_list(contents: &str) -> Vec<AccessId> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(AccessId::from)
        .collect()
}
