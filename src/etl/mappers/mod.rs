/// Record Mappers
///
/// Per-category mappers deriving one store-ready row from one raw API
/// record. The derivation is pure: no I/O, no external state.
pub mod products;
pub mod users;

pub use products::prepare_product;
pub use users::prepare_user;

use serde_json::Value;

use crate::error::{EtlError, EtlResult};
use crate::models::RawRecord;

/// Fetch a required field, failing before any store call happens
fn require<'a>(record: &'a RawRecord, field: &str, category: &'static str) -> EtlResult<&'a Value> {
    record
        .get(field)
        .filter(|value| !value.is_null())
        .ok_or_else(|| EtlError::transformation(category, format!("record is missing required field `{field}`")))
}

fn require_int(record: &RawRecord, field: &str, category: &'static str) -> EtlResult<i64> {
    require(record, field, category)?
        .as_i64()
        .ok_or_else(|| EtlError::transformation(category, format!("field `{field}` is not an integer")))
}

fn require_str(record: &RawRecord, field: &str, category: &'static str) -> EtlResult<String> {
    require(record, field, category)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| EtlError::transformation(category, format!("field `{field}` is not a string")))
}

fn require_float(record: &RawRecord, field: &str, category: &'static str) -> EtlResult<f64> {
    require(record, field, category)?
        .as_f64()
        .ok_or_else(|| EtlError::transformation(category, format!("field `{field}` is not a number")))
}

/// Optional text field; absent or mistyped maps to NULL
fn optional_text(record: &RawRecord, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_owned)
}

/// Optional numeric field; absent or mistyped maps to NULL
fn optional_float(record: &RawRecord, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}

/// Optional flag; absent or mistyped maps to false
fn flag(record: &RawRecord, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}
