/// ETL Module
///
/// Record mapping and store-side transformation steps:
/// - mappers: derive store-ready rows from raw API records
/// - transform: run batched category upserts and named statement files
pub mod mappers;
pub mod transform;
