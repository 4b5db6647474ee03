//! Dynamic filter construction
//!
//! Turns the flat `field -> raw value` map of a request into a [`FilterSet`]
//! of typed predicates. Only the fields enumerated by [`QueryField`] are
//! queryable; anything else is rejected.
//!
//! | Key | Predicate |
//! |-----|-----------|
//! | `sourceId`, `id`, `city` | case-insensitive substring |
//! | `isAvailable` | boolean equality |
//! | `price` | numeric equality |
//! | `price_min`, `price_max` | inclusive range on `price` |
//!
//! A bare `price` sent together with `price_min`/`price_max` is kept as an
//! additional equality term of the same predicate.

pub mod filter;
pub mod page;

use std::collections::BTreeMap;

use thiserror::Error;

pub use filter::{FieldKind, FilterSet, NumericBounds, Predicate, QueryField};
pub use page::{PageRequest, PaginationMeta};

/// Raw request filters, keyed by query-string name
pub type FilterParams = BTreeMap<String, String>;

const MIN_SUFFIX: &str = "_min";
const MAX_SUFFIX: &str = "_max";

/// Filter and pagination validation failures
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    #[error("Range filters are only supported on numeric fields, not {0}")]
    RangeNotSupported(QueryField),

    #[error("Invalid value for {field}: '{value}' is not a valid {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Page out of range: {0}")]
    InvalidPage(i64),

    #[error("Limit must be between 1 and 100, got {0}")]
    InvalidLimit(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
}

fn split_range_key(key: &str) -> (&str, Option<Bound>) {
    if let Some(name) = key.strip_suffix(MIN_SUFFIX) {
        (name, Some(Bound::Min))
    } else if let Some(name) = key.strip_suffix(MAX_SUFFIX) {
        (name, Some(Bound::Max))
    } else {
        (key, None)
    }
}

/// Parse a finite number
pub fn parse_number(key: &str, value: &str) -> Result<f64, QueryError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| QueryError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            expected: "number",
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, QueryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(QueryError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            expected: "boolean",
        }),
    }
}

/// Build the predicate set for a request's filter parameters.
///
/// Entries with an empty value are ignored. Predicates come out in field
/// order, one per field.
pub fn build_query(params: &FilterParams) -> Result<FilterSet, QueryError> {
    let mut by_field: BTreeMap<QueryField, Predicate> = BTreeMap::new();

    for (key, value) in params {
        if value.trim().is_empty() {
            continue;
        }

        let (name, bound) = split_range_key(key);
        let field =
            QueryField::from_param(name).ok_or_else(|| QueryError::UnknownField(key.clone()))?;

        match (field.kind(), bound) {
            (FieldKind::Number, bound) => {
                let number = parse_number(key, value)?;
                let entry = by_field.entry(field).or_insert(Predicate::Numeric {
                    field,
                    bounds: NumericBounds::default(),
                });
                if let Predicate::Numeric { bounds, .. } = entry {
                    match bound {
                        Some(Bound::Min) => bounds.min = Some(number),
                        Some(Bound::Max) => bounds.max = Some(number),
                        None => bounds.equals = Some(number),
                    }
                }
            },
            (_, Some(_)) => return Err(QueryError::RangeNotSupported(field)),
            (FieldKind::Boolean, None) => {
                let flag = parse_bool(key, value)?;
                by_field.insert(field, Predicate::Flag { field, value: flag });
            },
            (FieldKind::Text, None) => {
                by_field.insert(
                    field,
                    Predicate::Contains {
                        field,
                        needle: value.clone(),
                    },
                );
            },
        }
    }

    Ok(FilterSet::new(by_field.into_values().collect()))
}
