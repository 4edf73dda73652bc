//! Concord CLI - Command-line interface for the couple feature pipeline.

use anyhow::Context;
use clap::Parser;
use concord_cli::commands;
use concord_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        // `config init` has to work before the file exists
        Err(_) if matches!(cli.command, Command::Config(_)) => Config::default(),
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    // Flags and environment override the file
    if let Some(db) = cli.db {
        config.store.path = db;
    }
    if let Some(endpoint) = cli.endpoint {
        config.classifier.endpoint = endpoint;
    }
    config.validate().context("Invalid configuration")?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Analyze(args) => {
            let id = args.access_id.clone();
            commands::execute_analyze(args, &config, &formatter)
                .await
                .with_context(|| format!("Analysis of couple {} failed", id))?
        }
        Command::Batch(args) => commands::execute_batch(args, &config, &formatter).await?,
        Command::Features(args) => commands::execute_features(args, &config, &formatter)?,
        Command::Import(args) => {
            let file = args.file.display().to_string();
            commands::execute_import(args, &config, &formatter)
                .with_context(|| format!("Import from {} failed", file))?
        }
        Command::Status(args) => commands::execute_status(args, &config, &formatter).await?,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter)?
        }
    }

    Ok(())
}
