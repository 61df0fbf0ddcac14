/// Product record mapping
use crate::error::EtlResult;
use crate::models::{PreparedRow, RawRecord, SqlValue};

use super::{flag, optional_float, optional_text, require_float, require_int, require_str};

const CATEGORY: &str = "products";

/// Derive one products row.
///
/// `id`, `title`, and `price` are required; every other source field has a
/// defined default. Column order matches the insert statement's
/// placeholders.
pub fn prepare_product(record: &RawRecord) -> EtlResult<PreparedRow> {
    let mut row = PreparedRow::new();

    row.push("id", SqlValue::Int(Some(require_int(record, "id", CATEGORY)?)));
    row.push("title", SqlValue::Text(Some(require_str(record, "title", CATEGORY)?)));
    row.push("price", SqlValue::Float(Some(require_float(record, "price", CATEGORY)?)));
    row.push("description", SqlValue::Text(optional_text(record, "description")));
    row.push("image", SqlValue::Text(optional_text(record, "image")));
    row.push("brand", SqlValue::Text(optional_text(record, "brand")));
    row.push("model", SqlValue::Text(optional_text(record, "model")));
    row.push("color", SqlValue::Text(optional_text(record, "color")));
    row.push("category", SqlValue::Text(optional_text(record, "category")));
    row.push("popular", SqlValue::Bool(Some(flag(record, "popular"))));
    row.push("discount", SqlValue::Float(optional_float(record, "discount")));
    row.push("on_sale", SqlValue::Bool(Some(flag(record, "onSale"))));

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().expect("test record must be an object")
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let input = record(json!({
            "id": 1,
            "title": "A",
            "price": 9.99,
            "brand": "acme",
            "popular": true,
            "onSale": true,
            "discount": 10.0
        }));

        let first = prepare_product(&input).unwrap();
        let second = prepare_product(&input).unwrap();
        assert_eq!(first, second);

        assert_eq!(first.get("id"), Some(&SqlValue::Int(Some(1))));
        assert_eq!(first.get("title"), Some(&SqlValue::Text(Some("A".to_string()))));
        assert_eq!(first.get("price"), Some(&SqlValue::Float(Some(9.99))));
        assert_eq!(first.get("on_sale"), Some(&SqlValue::Bool(Some(true))));
    }

    #[test]
    fn test_optional_fields_default_instead_of_erroring() {
        let input = record(json!({"id": 2, "title": "B", "price": 1.5}));
        let row = prepare_product(&input).unwrap();

        assert_eq!(row.get("description"), Some(&SqlValue::Text(None)));
        assert_eq!(row.get("discount"), Some(&SqlValue::Float(None)));
        assert_eq!(row.get("popular"), Some(&SqlValue::Bool(Some(false))));
        assert_eq!(row.get("on_sale"), Some(&SqlValue::Bool(Some(false))));
    }

    #[test]
    fn test_missing_identifier_fails() {
        let input = record(json!({"title": "B", "price": 1.5}));
        let err = prepare_product(&input).unwrap_err();

        match err {
            EtlError::Transformation { category, reason } => {
                assert_eq!(category, "products");
                assert!(reason.contains("`id`"));
            }
            other => panic!("expected transformation error, got {other:?}"),
        }
    }

    #[test]
    fn test_mistyped_required_field_fails() {
        let input = record(json!({"id": 3, "title": 7, "price": 1.5}));
        assert!(prepare_product(&input).is_err());
    }

    #[test]
    fn test_integer_price_is_accepted() {
        let input = record(json!({"id": 4, "title": "C", "price": 20}));
        let row = prepare_product(&input).unwrap();
        assert_eq!(row.get("price"), Some(&SqlValue::Float(Some(20.0))));
    }
}
