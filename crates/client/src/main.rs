//! gatherly CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatherly::executor::{NoCredentials, StaticToken};
use gatherly::{Config, DataLayer};
use gatherly_client::cli::Cli;
use gatherly_client::output::Rendered;
use gatherly_core::service::CredentialProvider;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet {
        "gatherly=warn"
    } else {
        "gatherly=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(base_url) = &cli.base_url {
        config.api_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_seconds = timeout;
    }

    let credentials: Arc<dyn CredentialProvider> = match &cli.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(NoCredentials),
    };
    let layer = DataLayer::from_config(&config, credentials)
        .with_context(|| format!("failed to set up client for {}", config.api_url))?;

    match cli.command.run(&layer, cli.format).await {
        Rendered::Success(output) => {
            if !cli.quiet {
                println!("{}", output);
            }
            Ok(ExitCode::SUCCESS)
        }
        Rendered::Failure(output) => {
            eprintln!("{}", output);
            Ok(ExitCode::FAILURE)
        }
    }
}
