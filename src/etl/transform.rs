/// Transform Module
///
/// Maps raw API records into store-ready rows and runs named statement
/// files against the store.
use std::path::PathBuf;

use crate::db::{Params, StatementStore};
use crate::error::EtlResult;
use crate::models::{PreparedRow, RawRecord, ResourceCategory};

use super::mappers;

/// Derive store-ready rows for one category.
///
/// Pure and deterministic. A record missing a required field fails the
/// whole batch before any store call is attempted, so partial batches
/// never reach persistence.
pub fn prepare_rows(category: ResourceCategory, records: &[RawRecord]) -> EtlResult<Vec<PreparedRow>> {
    records
        .iter()
        .map(|record| match category {
            ResourceCategory::Products => mappers::prepare_product(record),
            ResourceCategory::Users => mappers::prepare_user(record),
        })
        .collect()
}

/// Runs transformations against the store: batched category upserts plus
/// named schema and aggregation statement files.
pub struct Transformer<S> {
    store: S,
    sql_dir: PathBuf,
}

impl<S: StatementStore> Transformer<S> {
    /// Create a transformer resolving statement files against `sql_dir`
    pub fn new(store: S, sql_dir: impl Into<PathBuf>) -> Self {
        Self { store, sql_dir: sql_dir.into() }
    }

    fn sql_path(&self, file: &str) -> PathBuf {
        self.sql_dir.join(file)
    }

    /// Map one category's records and upsert them as a single batch in
    /// one scope. Returns rows affected.
    pub async fn load_records(&self, category: ResourceCategory, records: &[RawRecord]) -> EtlResult<u64> {
        let rows = prepare_rows(category, records)?;
        let affected = self.store.execute_file(&self.sql_path(category.insert_file()), Params::Many(rows)).await?;

        tracing::info!("Loaded {} {} records successfully", records.len(), category);
        Ok(affected)
    }

    /// Run one named statement file without parameters. Used for schema
    /// setup and post-load aggregation.
    pub async fn run_statement(&self, file: &str) -> EtlResult<u64> {
        self.store.execute_file(&self.sql_path(file), Params::None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().expect("test record must be an object")
    }

    #[test]
    fn test_prepare_rows_preserves_input_order() {
        let records =
            vec![record(json!({"id": 2, "title": "B", "price": 1.0})), record(json!({"id": 1, "title": "A", "price": 2.0}))];

        let rows = prepare_rows(ResourceCategory::Products, &records).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&crate::models::SqlValue::Int(Some(2))));
        assert_eq!(rows[1].get("id"), Some(&crate::models::SqlValue::Int(Some(1))));
    }

    #[test]
    fn test_one_invalid_record_fails_the_whole_batch() {
        let records = vec![record(json!({"id": 1, "title": "A", "price": 2.0})), record(json!({"title": "B"}))];

        assert!(prepare_rows(ResourceCategory::Products, &records).is_err());
    }
}
