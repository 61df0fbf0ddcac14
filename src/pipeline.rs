/// Pipeline Module
///
/// Orchestrates the staged ETL protocol: Prepare → Extract → Load →
/// Transform, with strict stage ordering, failure propagation, and a run
/// report.
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::api::ResourceClient;
use crate::db::StatementStore;
use crate::error::EtlResult;
use crate::etl::transform::Transformer;
use crate::models::{RawRecord, ResourceCategory};

/// Ordered pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Prepare,
    Extract,
    Load,
    Transform,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Prepare => write!(f, "Prepare"),
            PipelineStage::Extract => write!(f, "Extract"),
            PipelineStage::Load => write!(f, "Load"),
            PipelineStage::Transform => write!(f, "Transform"),
        }
    }
}

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Categories to extract and load, in order
    pub categories: Vec<ResourceCategory>,
    /// Schema-setup statement file; idempotent, safe against an
    /// already-initialized store
    pub schema_file: String,
    /// Post-load aggregation statement files, run in order
    pub transform_files: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: ResourceCategory::ALL.to_vec(),
            schema_file: "create_tables.sql".to_string(),
            transform_files: vec![
                "transform_most_expensive.sql".to_string(),
                "transform_ods_users.sql".to_string(),
            ],
        }
    }
}

/// Per-category outcome of one run
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: ResourceCategory,
    pub records_extracted: usize,
    pub rows_loaded: u64,
}

/// Execution report for one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub categories: Vec<CategoryOutcome>,
    pub transform_steps: usize,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn total_extracted(&self) -> usize {
        self.categories.iter().map(|outcome| outcome.records_extracted).sum()
    }

    pub fn total_loaded(&self) -> u64 {
        self.categories.iter().map(|outcome| outcome.rows_loaded).sum()
    }
}

/// Main ETL pipeline
pub struct Pipeline<C, S> {
    client: C,
    transformer: Transformer<S>,
    config: PipelineConfig,
}

impl<C, S> Pipeline<C, S>
where
    C: ResourceClient,
    S: StatementStore,
{
    /// Create a new pipeline instance
    pub fn new(client: C, transformer: Transformer<S>, config: PipelineConfig) -> Self {
        Self { client, transformer, config }
    }

    /// Execute the four stages strictly in order.
    ///
    /// The first failure aborts the remaining stages and propagates
    /// unchanged. No whole-pipeline retry is attempted internally; the
    /// caller decides whether to re-run, which is safe since loads are
    /// upserts.
    pub async fn run(&self) -> EtlResult<RunReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.prepare().await?;
        let extracted = self.extract().await?;
        let categories = self.load(extracted).await?;
        let transform_steps = self.transform().await?;

        tracing::info!("Pipeline completed successfully in {:.2}s", start.elapsed().as_secs_f64());

        Ok(RunReport { started_at, categories, transform_steps, elapsed: start.elapsed() })
    }

    /// Run schema setup
    async fn prepare(&self) -> EtlResult<()> {
        tracing::info!("Stage {}: running schema setup", PipelineStage::Prepare);
        self.transformer.run_statement(&self.config.schema_file).await?;

        Ok(())
    }

    /// Fetch every configured category, sequentially and in order.
    ///
    /// A failure here aborts the run before any data reaches the store.
    async fn extract(&self) -> EtlResult<Vec<(ResourceCategory, Vec<RawRecord>)>> {
        let mut extracted = Vec::with_capacity(self.config.categories.len());

        for &category in &self.config.categories {
            tracing::info!("Stage {}: fetching {}", PipelineStage::Extract, category);
            let records = self.client.fetch(category).await?;
            extracted.push((category, records));
        }

        Ok(extracted)
    }

    /// Load each category in its own store scope.
    ///
    /// There is no cross-category atomicity: a failure loading a later
    /// category does not undo an earlier category's committed scope.
    async fn load(&self, extracted: Vec<(ResourceCategory, Vec<RawRecord>)>) -> EtlResult<Vec<CategoryOutcome>> {
        let mut outcomes = Vec::with_capacity(extracted.len());

        for (category, records) in extracted {
            tracing::info!("Stage {}: loading {} {} records", PipelineStage::Load, records.len(), category);
            let rows_loaded = self.transformer.load_records(category, &records).await?;
            outcomes.push(CategoryOutcome { category, records_extracted: records.len(), rows_loaded });
        }

        Ok(outcomes)
    }

    /// Run post-load aggregation statement files, in order
    async fn transform(&self) -> EtlResult<usize> {
        for file in &self.config.transform_files {
            tracing::info!("Stage {}: running {}", PipelineStage::Transform, file);
            self.transformer.run_statement(file).await?;
        }

        Ok(self.config.transform_files.len())
    }
}
