/// FakeStore Data Loader
///
/// An ETL pipeline for extracting, transforming, and loading FakeStore
/// catalog data into PostgreSQL.
mod api;
mod cli;
mod config;
mod db;
mod error;
mod etl;
mod models;
mod pipeline;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use api::FakeStoreClient;
use cli::Cli;
use config::{ApiConfig, DbConfig};
use db::DataStore;
use etl::transform::Transformer;
use pipeline::{Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    cli.validate().context("Invalid command-line arguments")?;
    let categories = cli.parse_categories().context("Invalid resource category")?;

    println!("🚀 Starting FakeStore Data Loader...");

    // API configuration, with CLI overrides
    let mut api_config =
        ApiConfig::from_env().context("API configuration is incomplete. Please check your .env file")?;
    if let Some(base_url) = cli.base_url.clone() {
        api_config.base_url = base_url;
    }
    if let Some(timeout) = cli.timeout {
        api_config.timeout = Duration::from_secs(timeout);
    }
    if let Some(retry_attempts) = cli.retry_attempts {
        api_config.retry_attempts = retry_attempts;
    }

    let client = FakeStoreClient::new(&api_config).context("Failed to create API client")?;

    println!("✅ API client ready: {}", api_config.base_url);

    // Database connection from validated parameters
    let db_config =
        DbConfig::from_env().context("Database configuration is incomplete. Please check your .env file")?;

    println!("\n💾 Connecting to PostgreSQL database...");
    let store = DataStore::connect(&db_config).await.context("Failed to connect to PostgreSQL database")?;

    store.test_connection().await.context("Database connection test failed")?;

    println!("✅ Database connected successfully!");

    // Wire the pipeline
    let transformer = Transformer::new(store, cli.sql_dir.clone());
    let pipeline_config = PipelineConfig { categories, ..PipelineConfig::default() };
    let pipeline = Pipeline::new(client, transformer, pipeline_config);

    tracing::info!("FakeStore Data Loader initialized successfully");

    println!("\n🔄 Running ETL pipeline...");
    let report = pipeline.run().await.context("Pipeline execution failed")?;

    println!("\n✅ Pipeline complete!");
    println!("\n📊 Run Statistics:");
    println!("   🕐 Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("   ⏱️  Total time: {:.2}s", report.elapsed.as_secs_f64());
    for outcome in &report.categories {
        println!(
            "   📦 {}: {} records extracted, {} rows loaded",
            outcome.category, outcome.records_extracted, outcome.rows_loaded
        );
    }
    println!("   📝 Total: {} records extracted, {} rows loaded", report.total_extracted(), report.total_loaded());
    println!("   🔄 Transform steps: {}", report.transform_steps);

    Ok(())
}
