//! Import command implementation.

use super::open_store;
use crate::cli::ImportArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use concord_domain::CoupleRecord;
use std::fs;

/// Execute the import command.
pub fn execute_import(args: ImportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let contents = fs::read_to_string(&args.file)?;
    let records: Vec<CoupleRecord> = serde_json::from_str(&contents)?;
    if records.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} holds no couple records",
            args.file.display()
        )));
    }

    let store = open_store(config)?;
    let mut answers = 0;
    for record in &records {
        answers += store.import_record(record)?;
    }

    println!(
        "{}",
        formatter.success(&format!(
            "Imported {} couple(s) with {} answer(s)",
            records.len(),
            answers
        ))
    );
    Ok(())
}
