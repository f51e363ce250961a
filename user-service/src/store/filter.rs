//! Filter, sort and window types for store queries
//!
//! A [`Filter`] is the typed form of a normalized query predicate: each field
//! maps either to an equality value or to a set of comparison operators.
//! [`FindOptions`] carries the sort specification and the page window.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use user_service::store::{Filter, FindOptions, SortSpec};
//!
//! let filter = Filter::from_json(json!({"role": "admin", "age": {"$gte": "18"}})).unwrap();
//! assert!(filter.matches(json!({"role": "admin", "age": 30}).as_object().unwrap()));
//! assert!(!filter.matches(json!({"role": "admin", "age": 12}).as_object().unwrap()));
//!
//! let options = FindOptions::new(SortSpec::parse("-createdAt"), 10, 10);
//! assert_eq!(options.skip, 10);
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

/// Prefix the store uses to mark an operator key inside a comparison object
pub const OPERATOR_SIGIL: char = '$';

/// Comparison operators recognized inside a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// Greater than or equal to (`$gte`)
    GreaterThanOrEqual,
    /// Less than or equal to (`$lte`)
    LessThanOrEqual,
    /// Greater than (`$gt`)
    GreaterThan,
    /// Less than (`$lt`)
    LessThan,
}

impl ComparisonOperator {
    /// All recognized operators
    pub const ALL: [Self; 4] = [
        Self::GreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::GreaterThan,
        Self::LessThan,
    ];

    /// Bare token as it appears in a raw query (`gte`)
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqual => "gte",
            Self::LessThanOrEqual => "lte",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
        }
    }

    /// Store marker for this operator (`$gte`)
    #[must_use]
    pub const fn marker(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqual => "$gte",
            Self::LessThanOrEqual => "$lte",
            Self::GreaterThan => "$gt",
            Self::LessThan => "$lt",
        }
    }

    /// Look up an operator by its store marker
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.marker() == marker)
    }

    /// Whether `document cmp filter` satisfies this operator
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::LessThan => ordering == Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::GreaterThan => write!(f, ">"),
            Self::LessThan => write!(f, "<"),
        }
    }
}

/// Predicate applied to a single document field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    /// Field equals the value
    Equals(Value),
    /// Field satisfies every listed comparison
    Compare(Vec<(ComparisonOperator, Value)>),
}

impl FieldPredicate {
    fn from_value(field: &str, value: Value) -> Result<Self, FilterError> {
        let Value::Object(object) = value else {
            return Ok(Self::Equals(value));
        };

        if object.is_empty() || !object.keys().any(|k| k.starts_with(OPERATOR_SIGIL)) {
            return Ok(Self::Equals(Value::Object(object)));
        }

        let mut comparisons = Vec::with_capacity(object.len());
        for (key, operand) in object {
            let operator = ComparisonOperator::from_marker(&key).ok_or_else(|| FilterError {
                field: field.to_string(),
                message: format!("unknown operator '{}'", key),
            })?;
            comparisons.push((operator, operand));
        }
        Ok(Self::Compare(comparisons))
    }

    fn matches(&self, candidate: Option<&Value>) -> bool {
        match self {
            Self::Equals(expected) => match candidate {
                Some(actual) => values_equal(actual, expected),
                None => expected.is_null(),
            },
            Self::Compare(comparisons) => match candidate {
                Some(actual) => comparisons.iter().all(|(operator, operand)| {
                    compare_values(actual, operand).is_some_and(|o| operator.accepts(o))
                }),
                None => false,
            },
        }
    }
}

/// A filter could not be built from its JSON form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    /// Field carrying the offending predicate
    pub field: String,
    /// What was wrong with it
    pub message: String,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid filter on '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for FilterError {}

/// Typed document predicate
///
/// Fields are kept in the order they were supplied. An empty filter matches
/// every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<(String, FieldPredicate)>,
}

impl Filter {
    /// Filter matching every document
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from a normalized JSON object
    ///
    /// Objects whose keys carry the operator sigil become comparisons; any
    /// other value is an equality match.
    pub fn from_json(value: Value) -> Result<Self, FilterError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            Value::Null => Ok(Self::all()),
            other => Err(FilterError {
                field: String::new(),
                message: format!("expected an object, found {}", json_type_name(&other)),
            }),
        }
    }

    /// Build a filter from a normalized JSON map
    ///
    /// Operator markers are only valid inside a field's comparison object; a
    /// top-level key carrying the sigil is rejected.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, FilterError> {
        let fields = map
            .into_iter()
            .map(|(field, value)| {
                if field.starts_with(OPERATOR_SIGIL) {
                    return Err(FilterError {
                        message: format!("operator '{}' is not attached to a field", field),
                        field,
                    });
                }
                let predicate = FieldPredicate::from_value(&field, value)?;
                Ok((field, predicate))
            })
            .collect::<Result<Vec<_>, FilterError>>()?;
        Ok(Self { fields })
    }

    /// Add an equality predicate
    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .push((field.into(), FieldPredicate::Equals(value.into())));
        self
    }

    /// Add a comparison predicate
    #[must_use]
    pub fn compare(
        mut self,
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.push((
            field.into(),
            FieldPredicate::Compare(vec![(operator, value.into())]),
        ));
        self
    }

    /// Predicates in supplied order
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &FieldPredicate)> {
        self.fields.iter().map(|(f, p)| (f.as_str(), p))
    }

    /// Whether the filter has no predicates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of field predicates
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Evaluate the filter against a document
    #[must_use]
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.fields
            .iter()
            .all(|(field, predicate)| predicate.matches(lookup(document, field)))
    }
}

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9, oldest first)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0, newest first)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// One field of a sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort on (dotted paths reach into nested objects)
    pub field: String,
    /// Sort direction
    pub direction: OrderDirection,
}

/// Ordered list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Parse a sort string: whitespace-separated fields, `-` prefix for descending
    ///
    /// # Example
    ///
    /// ```rust
    /// use user_service::store::{OrderDirection, SortSpec};
    ///
    /// let spec = SortSpec::parse("age -name");
    /// let keys = spec.keys();
    /// assert_eq!(keys[0].field, "age");
    /// assert_eq!(keys[1].direction, OrderDirection::Descending);
    /// ```
    #[must_use]
    pub fn parse(sort: &str) -> Self {
        let keys = sort
            .split_whitespace()
            .filter_map(|token| {
                let (field, direction) = match token.strip_prefix('-') {
                    Some(field) => (field, OrderDirection::Descending),
                    None => (
                        token.strip_prefix('+').unwrap_or(token),
                        OrderDirection::Ascending,
                    ),
                };
                (!field.is_empty()).then(|| SortKey {
                    field: field.to_string(),
                    direction,
                })
            })
            .collect();
        Self { keys }
    }

    /// Ascending sort on a single field
    #[must_use]
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            keys: vec![SortKey {
                field: field.into(),
                direction: OrderDirection::Ascending,
            }],
        }
    }

    /// Sort keys in priority order
    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Whether no sort was requested (natural order)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compare two documents under this specification
    ///
    /// Returns `Equal` on ties so a stable sort keeps insertion order.
    #[must_use]
    pub fn compare(&self, a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
        for key in &self.keys {
            let ordering = sort_order(lookup(a, &key.field), lookup(b, &key.field));
            let ordering = match key.direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Sort and window applied to a find
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Sort specification
    pub sort: SortSpec,
    /// Number of matching documents to skip
    pub skip: u64,
    /// Maximum number of documents to return; 0 means no limit
    pub limit: u64,
}

impl FindOptions {
    /// Create find options
    #[must_use]
    pub const fn new(sort: SortSpec, skip: u64, limit: u64) -> Self {
        Self { sort, skip, limit }
    }
}

/// Resolve a possibly dotted field path
fn lookup<'a>(document: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Equality with string operands cast to the document's type
fn values_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) => {
            matches!((n.as_f64(), parse_number(s)), (Some(a), Some(b)) if a == b)
        }
        (Value::Bool(b), Value::String(s)) => s == if *b { "true" } else { "false" },
        (Value::String(a), Value::String(b)) => {
            matches!((parse_instant(a), parse_instant(b)), (Some(x), Some(y)) if x == y)
        }
        (Value::Array(items), _) => items.iter().any(|item| values_equal(item, expected)),
        _ => false,
    }
}

/// Ordering of a document value against a filter operand, if comparable
fn compare_values(actual: &Value, operand: &Value) -> Option<Ordering> {
    match (actual, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&parse_number(b)?),
        (Value::String(a), Value::String(b)) => match (parse_instant(a), parse_instant(b)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(a.cmp(b)),
        },
        (Value::String(a), Value::Number(b)) => parse_number(a)?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used for sorting: missing and null first, then by type, then by value
fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }
    match (a, b) {
        (Some(Value::String(x)), Some(Value::String(y))) => string_sort_order(x, y),
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Timestamps first, by instant, then every other string lexically
fn string_sort_order(a: &str, b: &str) -> Ordering {
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_operator_markers() {
        assert_eq!(ComparisonOperator::GreaterThanOrEqual.marker(), "$gte");
        assert_eq!(ComparisonOperator::LessThan.token(), "lt");
        assert_eq!(
            ComparisonOperator::from_marker("$lte"),
            Some(ComparisonOperator::LessThanOrEqual)
        );
        assert_eq!(ComparisonOperator::from_marker("gte"), None);
        assert_eq!(format!("{}", ComparisonOperator::GreaterThan), ">");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::from_json(json!({})).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&doc(json!({"name": "alice"}))));
    }

    #[test]
    fn test_equality_casts_query_strings() {
        let filter = Filter::all().equals("age", "30").equals("active", "true");
        assert!(filter.matches(&doc(json!({"age": 30, "active": true}))));
        assert!(!filter.matches(&doc(json!({"age": 31, "active": true}))));
        assert!(!filter.matches(&doc(json!({"age": 30}))));
    }

    #[test]
    fn test_equality_against_array_field() {
        let filter = Filter::all().equals("tags", "admin");
        assert!(filter.matches(&doc(json!({"tags": ["staff", "admin"]}))));
        assert!(!filter.matches(&doc(json!({"tags": ["staff"]}))));
    }

    #[test]
    fn test_comparison_predicates() {
        let filter = Filter::from_json(json!({"age": {"$gte": "18", "$lt": "65"}})).unwrap();
        assert!(filter.matches(&doc(json!({"age": 18}))));
        assert!(filter.matches(&doc(json!({"age": 64}))));
        assert!(!filter.matches(&doc(json!({"age": 65}))));
        assert!(!filter.matches(&doc(json!({"age": 17}))));
        assert!(!filter.matches(&doc(json!({"name": "no age"}))));
    }

    #[test]
    fn test_comparison_on_timestamps() {
        let filter = Filter::all().compare(
            "createdAt",
            ComparisonOperator::GreaterThan,
            "2024-01-01T00:00:00Z",
        );
        assert!(filter.matches(&doc(json!({"createdAt": "2024-01-01T00:00:00.5Z"}))));
        assert!(!filter.matches(&doc(json!({"createdAt": "2023-12-31T23:59:59Z"}))));
    }

    #[test]
    fn test_unrewritten_operator_object_is_equality() {
        let filter = Filter::from_json(json!({"age": {"gte": "18"}})).unwrap();
        let (_, predicate) = filter.predicates().next().unwrap();
        assert!(matches!(predicate, FieldPredicate::Equals(_)));
        assert!(!filter.matches(&doc(json!({"age": 40}))));
        assert!(filter.matches(&doc(json!({"age": {"gte": "18"}}))));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = Filter::from_json(json!({"age": {"$ne": "18"}})).unwrap_err();
        assert_eq!(err.field, "age");
        assert!(err.to_string().contains("$ne"));
    }

    #[test]
    fn test_top_level_operator_rejected() {
        let err = Filter::from_json(json!({"$gte": "5"})).unwrap_err();
        assert_eq!(err.field, "$gte");
        assert!(err.message.contains("not attached"));
    }

    #[test]
    fn test_non_object_filter_rejected() {
        let err = Filter::from_json(json!(["age"])).unwrap_err();
        assert!(err.message.contains("array"));
    }

    #[test]
    fn test_dotted_lookup() {
        let filter = Filter::all().equals("address.city", "Oslo");
        assert!(filter.matches(&doc(json!({"address": {"city": "Oslo"}}))));
        assert!(!filter.matches(&doc(json!({"address": {"city": "Bergen"}}))));
    }

    #[test]
    fn test_sort_spec_parse() {
        let spec = SortSpec::parse("  name -age +email ");
        assert_eq!(
            spec.keys(),
            &[
                SortKey {
                    field: "name".to_string(),
                    direction: OrderDirection::Ascending
                },
                SortKey {
                    field: "age".to_string(),
                    direction: OrderDirection::Descending
                },
                SortKey {
                    field: "email".to_string(),
                    direction: OrderDirection::Ascending
                },
            ]
        );
        assert!(SortSpec::parse("").is_empty());
        assert!(SortSpec::parse("-").is_empty());
    }

    #[test]
    fn test_sort_compare_missing_first_and_descending() {
        let asc = SortSpec::ascending("age");
        let young = doc(json!({"age": 20}));
        let old = doc(json!({"age": 40}));
        let unknown = doc(json!({}));
        assert_eq!(asc.compare(&young, &old), Ordering::Less);
        assert_eq!(asc.compare(&unknown, &young), Ordering::Less);

        let desc = SortSpec::parse("-age");
        assert_eq!(desc.compare(&young, &old), Ordering::Greater);
    }

    #[test]
    fn test_sort_compare_tie_is_equal() {
        let spec = SortSpec::ascending("role");
        let a = doc(json!({"role": "admin", "name": "a"}));
        let b = doc(json!({"role": "admin", "name": "b"}));
        assert_eq!(spec.compare(&a, &b), Ordering::Equal);
    }

    #[test]
    fn test_sort_on_mixed_strings_is_transitive() {
        let spec = SortSpec::ascending("role");
        let a = doc(json!({"role": "2024-01-01T00:00:00+05:00"}));
        let b = doc(json!({"role": "2023-12-31T20:00:00Z"}));
        let c = doc(json!({"role": "2024-01-01"}));

        assert_eq!(spec.compare(&a, &b), Ordering::Less);
        assert_eq!(spec.compare(&b, &c), Ordering::Less);
        assert_eq!(spec.compare(&a, &c), Ordering::Less);

        let mut docs = vec![c.clone(), b.clone(), a.clone()];
        docs.sort_by(|x, y| spec.compare(x, y));
        assert_eq!(docs, vec![a, b, c]);
    }

    #[test]
    fn test_sort_places_timestamps_before_plain_strings() {
        let spec = SortSpec::ascending("role");
        let plain = doc(json!({"role": "admin"}));
        let stamp = doc(json!({"role": "2030-01-01T00:00:00Z"}));
        assert_eq!(spec.compare(&stamp, &plain), Ordering::Less);
        assert_eq!(
            spec.compare(&doc(json!({"role": "admin"})), &doc(json!({"role": "staff"}))),
            Ordering::Less
        );
    }
}
