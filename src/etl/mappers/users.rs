/// User record mapping
use crate::error::EtlResult;
use crate::models::{PreparedRow, RawRecord, SqlValue};

use super::{require, require_int};

const CATEGORY: &str = "users";

/// Derive one users row.
///
/// `id` is required; `name` and `address` are required nested structures
/// stored as serialized JSON.
pub fn prepare_user(record: &RawRecord) -> EtlResult<PreparedRow> {
    let mut row = PreparedRow::new();

    row.push("id", SqlValue::Int(Some(require_int(record, "id", CATEGORY)?)));
    row.push("name", SqlValue::Json(Some(require(record, "name", CATEGORY)?.clone())));
    row.push("address", SqlValue::Json(Some(require(record, "address", CATEGORY)?.clone())));

    Ok(row)
}
