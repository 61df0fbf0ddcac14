/// Data Models Module
///
/// This module defines the core data structures used throughout the
/// application: resource categories, raw API records, and the store-ready
/// parameter rows derived from them.
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::EtlError;

/// An untyped record as received from the external API.
///
/// The shape varies per resource category and is never mutated after
/// receipt; per-category mappers derive [`PreparedRow`]s from it.
pub type RawRecord = serde_json::Map<String, Value>;

/// A named kind of external record set.
///
/// Endpoint path, envelope key, target table, and insert statement are
/// fixed per category and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Products,
    Users,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 2] = [ResourceCategory::Products, ResourceCategory::Users];

    /// API endpoint path for this category
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Products => "/products",
            Self::Users => "/users",
        }
    }

    /// Response-envelope key holding the record array
    pub fn envelope_key(&self) -> &'static str {
        self.as_str()
    }

    /// Target table name
    #[allow(dead_code)]
    pub fn table(&self) -> &'static str {
        self.as_str()
    }

    /// Statement file used to upsert one batch of this category
    pub fn insert_file(&self) -> &'static str {
        match self {
            Self::Products => "insert_product.sql",
            Self::Users => "insert_user.sql",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" => Ok(Self::Products),
            "users" => Ok(Self::Users),
            other => Err(EtlError::Configuration(format!("unknown resource category: {other}"))),
        }
    }
}

/// A storable scalar with an explicit store type.
///
/// NULLs keep their column type so parameter binding always carries the
/// right type information.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Json(Option<Value>),
}

/// One store-ready row: column names paired with scalars, in the bind
/// order of the category's insert statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedRow {
    columns: Vec<(&'static str, SqlValue)>,
}

impl PreparedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: &'static str, value: SqlValue) {
        self.columns.push((column, value));
    }

    #[allow(dead_code)]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(name, _)| *name == column).map(|(_, value)| value)
    }

    /// Values in insertion order, matching the statement's placeholders
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.columns.iter().map(|(_, value)| value)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
