//! Features command implementation.

use super::{build_pipeline, open_store};
use crate::cli::FeaturesArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use concord_domain::AccessId;

/// Execute the features command.
///
/// Runs every stage up to assembly; nothing is sent or stored.
pub fn execute_features(args: FeaturesArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let pipeline = build_pipeline(config, &store)?;

    let request = pipeline.prepare(&AccessId::from(args.access_id))?;
    println!("{}", formatter.format_request(&request, args.request)?);
    Ok(())
}
