//! littlebq - BigQuery table and query CLI

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use anyhow::{Context, Result};
use clap::Parser;

use littlebq::adapter::config::Config;
use littlebq::driver::{Args, CommandRunner};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;
    let dataset = args.dataset.as_deref().unwrap_or(&config.dataset);

    // Create the facade with injected credentials
    let warehouse = littlebq::connect(
        &config.project_id,
        dataset,
        &config.credentials(),
        config.options(),
    )
    .await
    .context("Failed to connect to BigQuery")?;

    let output = CommandRunner::new(warehouse).run(&args.command).await?;
    println!("{}", output);
    Ok(())
}
