//! Analyze command implementation.

use super::{build_pipeline, open_store};
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use concord_domain::AccessId;

/// Execute the analyze command.
pub async fn execute_analyze(args: AnalyzeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = build_pipeline(config, &store)?;

    let access_id = AccessId::from(args.access_id);
    let outcome = pipeline.run(&access_id).await?;

    println!("{}", formatter.format_verdict(&access_id, &outcome.verdict)?);
    if outcome.narrative_completed {
        println!();
        println!("{}", formatter.info("Reasoning or recommendations were generated locally"));
    }
    println!("{}", formatter.success(&format!("Verdict stored (run {})", outcome.run_id)));
    Ok(())
}
