//! Typed filter predicates over Unified Records

use serde::Serialize;
use unidata_common::types::UnifiedRecord;

/// How a field's raw query value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Boolean,
    Number,
}

/// The queryable fields of a Unified Record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryField {
    SourceId,
    Id,
    City,
    IsAvailable,
    Price,
}

impl QueryField {
    pub const ALL: [QueryField; 5] = [
        QueryField::SourceId,
        QueryField::Id,
        QueryField::City,
        QueryField::IsAvailable,
        QueryField::Price,
    ];

    /// Look up a field by its query-string name
    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.param_name() == name)
    }

    /// Name used in query strings and JSON output
    pub fn param_name(self) -> &'static str {
        match self {
            QueryField::SourceId => "sourceId",
            QueryField::Id => "id",
            QueryField::City => "city",
            QueryField::IsAvailable => "isAvailable",
            QueryField::Price => "price",
        }
    }

    /// Column in the `unified_records` table
    pub fn column(self) -> &'static str {
        match self {
            QueryField::SourceId => "source_id",
            QueryField::Id => "external_id",
            QueryField::City => "city",
            QueryField::IsAvailable => "is_available",
            QueryField::Price => "price",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            QueryField::SourceId | QueryField::Id | QueryField::City => FieldKind::Text,
            QueryField::IsAvailable => FieldKind::Boolean,
            QueryField::Price => FieldKind::Number,
        }
    }

    fn text_value(self, record: &UnifiedRecord) -> Option<&str> {
        match self {
            QueryField::SourceId => Some(record.source_id.as_str()),
            QueryField::Id => record.id.as_deref(),
            QueryField::City => record.city.as_deref(),
            QueryField::IsAvailable | QueryField::Price => None,
        }
    }

    fn bool_value(self, record: &UnifiedRecord) -> Option<bool> {
        match self {
            QueryField::IsAvailable => record.is_available,
            _ => None,
        }
    }

    fn number_value(self, record: &UnifiedRecord) -> Option<f64> {
        match self {
            QueryField::Price => record.price,
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.param_name())
    }
}

/// Inclusive numeric bounds, optionally pinned to an exact value.
///
/// All present terms must hold together.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericBounds {
    pub equals: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericBounds {
    pub fn is_empty(&self) -> bool {
        self.equals.is_none() && self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.equals.map_or(true, |eq| value == eq)
            && self.min.map_or(true, |min| value >= min)
            && self.max.map_or(true, |max| value <= max)
    }
}

/// One typed condition on a record field
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive literal substring match
    Contains { field: QueryField, needle: String },
    /// Exact boolean match
    Flag { field: QueryField, value: bool },
    /// Numeric equality and/or inclusive range
    Numeric { field: QueryField, bounds: NumericBounds },
}

impl Predicate {
    pub fn field(&self) -> QueryField {
        match self {
            Predicate::Contains { field, .. }
            | Predicate::Flag { field, .. }
            | Predicate::Numeric { field, .. } => *field,
        }
    }

    /// Evaluate against a record. An absent field value never matches.
    pub fn matches(&self, record: &UnifiedRecord) -> bool {
        match self {
            Predicate::Contains { field, needle } => field
                .text_value(record)
                .is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase())),
            Predicate::Flag { field, value } => field.bool_value(record) == Some(*value),
            Predicate::Numeric { field, bounds } => field
                .number_value(record)
                .is_some_and(|value| bounds.contains(value)),
        }
    }
}

/// Conjunction of predicates; empty matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &UnifiedRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Build a LIKE pattern matching `needle` literally anywhere in the value.
///
/// `\`, `%` and `_` are escaped with a backslash.
pub fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use unidata_common::types::RawData;

    fn listing(city: Option<&str>, price: Option<f64>, available: Option<bool>) -> UnifiedRecord {
        let mut record = UnifiedRecord::new("source1", RawData::default());
        record.city = city.map(String::from);
        record.price = price;
        record.is_available = available;
        record
    }

    #[test]
    fn test_field_lookup() {
        assert_eq!(QueryField::from_param("isAvailable"), Some(QueryField::IsAvailable));
        assert_eq!(QueryField::from_param("is_available"), None);
        assert_eq!(QueryField::Id.column(), "external_id");
        assert_eq!(QueryField::Price.kind(), FieldKind::Number);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let predicate = Predicate::Contains {
            field: QueryField::City,
            needle: "par".into(),
        };
        assert!(predicate.matches(&listing(Some("Paris"), None, None)));
        assert!(!predicate.matches(&listing(Some("London"), None, None)));
        assert!(!predicate.matches(&listing(None, None, None)));
    }

    #[test]
    fn test_numeric_bounds_are_inclusive_and_conjunctive() {
        let bounds = NumericBounds {
            equals: None,
            min: Some(60.0),
            max: Some(120.0),
        };
        assert!(bounds.contains(60.0));
        assert!(bounds.contains(120.0));
        assert!(!bounds.contains(150.0));

        let pinned = NumericBounds {
            equals: Some(100.0),
            ..bounds
        };
        assert!(pinned.contains(100.0));
        assert!(!pinned.contains(80.0));
    }

    #[test]
    fn test_absent_value_never_matches() {
        let filters = FilterSet::new(vec![Predicate::Flag {
            field: QueryField::IsAvailable,
            value: false,
        }]);
        assert!(!filters.matches(&listing(None, None, None)));
        assert!(filters.matches(&listing(None, None, Some(false))));
        assert!(FilterSet::default().matches(&listing(None, None, None)));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("par"), "%par%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
