//! Status command implementation.

use super::open_store;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use concord_classifier::HttpClassifier;
use concord_domain::AccessId;

/// Execute the status command.
///
/// An unreachable classifier is reported, not returned as an error, so the
/// database half of the status still prints.
pub async fn execute_status(args: StatusArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let classifier = HttpClassifier::new(config.classifier.clone())?;
    match classifier.health().await {
        Ok(health) => println!("{}", formatter.format_health(&config.classifier.endpoint, &health)),
        Err(e) => println!("{}", formatter.error(&e.to_string())),
    }

    let store = open_store(config)?;
    println!(
        "{}",
        formatter.info(&format!(
            "{} couple(s) in {}, {} classified, {} pending",
            store.list_access_ids()?.len(),
            config.store.path.display(),
            store.verdict_count()?,
            store.pending_access_ids()?.len()
        ))
    );

    if let Some(id) = args.access_id {
        let access_id = AccessId::from(id);
        match store.get_verdict(&access_id)? {
            Some(stored) => {
                println!();
                println!("{}", formatter.format_verdict(&access_id, &stored.verdict)?);
            }
            None => println!("{}", formatter.warning(&format!("No verdict stored for {}", access_id))),
        }
    }

    Ok(())
}
