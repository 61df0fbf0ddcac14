/// CLI Module
///
/// Command-line interface configuration using clap.
use std::path::PathBuf;

use clap::Parser;

use crate::models::ResourceCategory;

/// FakeStore Data Loader - ETL Pipeline
///
/// Extract, transform, and load FakeStore catalog data into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "fakestore-data-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API base URL (overrides API_BASE_URL env var)
    #[arg(short = 'u', long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Resource categories to process, in order
    #[arg(
        short = 'c',
        long,
        value_name = "CATEGORY",
        value_delimiter = ',',
        default_values_t = ["products".to_string(), "users".to_string()]
    )]
    pub categories: Vec<String>,

    /// Directory holding the SQL statement files
    #[arg(long, value_name = "DIR", default_value = "sql")]
    pub sql_dir: PathBuf,

    /// HTTP timeout in seconds (overrides API_TIMEOUT_SECS env var)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Maximum request attempts per endpoint (overrides API_RETRY_ATTEMPTS env var)
    #[arg(long, value_name = "COUNT")]
    pub retry_attempts: Option<u32>,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.categories.is_empty() {
            anyhow::bail!("At least one resource category is required");
        }

        if self.timeout == Some(0) {
            anyhow::bail!("Timeout must be greater than 0");
        }

        if self.retry_attempts == Some(0) {
            anyhow::bail!("Retry attempts must be greater than 0");
        }

        Ok(())
    }

    /// Parse the configured category list, preserving order
    pub fn parse_categories(&self) -> anyhow::Result<Vec<ResourceCategory>> {
        self.categories.iter().map(|raw| raw.parse().map_err(anyhow::Error::from)).collect()
    }
}
