//! Raw query parsing and normalization
//!
//! A [`RawQuery`] is the untyped object a caller sends, usually decoded from a
//! URL query string. [`QueryNormalizer::normalize`] turns it into a
//! [`NormalizedQuery`]: a typed store [`Filter`] plus page, limit and sort.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PaginationConfig;
use crate::error::{ServiceError, ServiceOperation};
use crate::store::{Filter, FindOptions, SortSpec};

/// Query key holding the page number
pub const PAGE_KEY: &str = "page";

/// Query key holding the page size
pub const LIMIT_KEY: &str = "limit";

/// Query key holding the sort field
pub const SORTED_BY_KEY: &str = "sortedBy";

/// Page used when the query names none
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the query names none
pub const DEFAULT_LIMIT: u64 = 10;

/// Sort field used when the query names none
pub const DEFAULT_SORTED_BY: &str = "createdAt";

/// Standalone comparison tokens in serialized query text
///
/// Word boundaries are ASCII: a non-ASCII letter next to a token does not
/// make it part of a word.
static OPERATOR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)(gte|lte|gt|lt)(?-u:\b)").expect("operator token regex is valid")
});

/// Rewrite the first standalone operator token into its store marker
///
/// Only the first match in the whole text is rewritten. A query that carries
/// two comparison objects keeps the second one as written, which then
/// matches by equality.
///
/// # Example
///
/// ```rust
/// use user_service::pagination::rewrite_operators;
///
/// assert_eq!(
///     rewrite_operators(r#"{"age":{"gte":"18"},"score":{"lt":"5"}}"#),
///     r#"{"age":{"$gte":"18"},"score":{"lt":"5"}}"#
/// );
/// assert_eq!(rewrite_operators(r#"{"gtex":"1"}"#), r#"{"gtex":"1"}"#);
/// ```
pub fn rewrite_operators(text: &str) -> Cow<'_, str> {
    OPERATOR_TOKEN.replace(text, "$$$1")
}

/// Untyped query object as received from a caller
///
/// Values are strings when built from a query string. Bracketed keys nest one
/// level, so `age[gte]=18` becomes `{"age": {"gte": "18"}}`. A repeated key
/// keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuery(Map<String, Value>);

impl RawQuery {
    /// Empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flat key/value pair
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Build from decoded query-string pairs
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    /// use user_service::pagination::RawQuery;
    ///
    /// let query = RawQuery::from_pairs([("page", "2"), ("age[gte]", "18"), ("age[lt]", "65")]);
    /// assert_eq!(
    ///     serde_json::to_value(&query).unwrap(),
    ///     json!({"page": "2", "age": {"gte": "18", "lt": "65"}})
    /// );
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = Map::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = Value::String(value.into());
            match split_bracketed(key) {
                Some((field, sub)) => {
                    let slot = map
                        .entry(field.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if !slot.is_object() {
                        *slot = Value::Object(Map::new());
                    }
                    if let Value::Object(nested) = slot {
                        nested.insert(sub.to_string(), value);
                    }
                }
                None => {
                    map.insert(key.to_string(), value);
                }
            }
        }
        Self(map)
    }

    /// Underlying object
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether the query has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawQuery {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Split `field[sub]` into its parts
fn split_bracketed(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_suffix(']')?;
    let (field, sub) = inner.split_once('[')?;
    let nested = sub.contains(|c: char| c == '[' || c == ']');
    (!field.is_empty() && !sub.is_empty() && !nested).then_some((field, sub))
}

/// Filter plus page window and sort, ready for the executor
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// Predicate built from every non-pagination key
    pub filter: Filter,
    /// Page number, starting at 1
    pub page: u64,
    /// Page size, at least 1
    pub limit: u64,
    /// Sort string; empty means natural order
    pub sorted_by: String,
}

impl NormalizedQuery {
    /// Number of matching documents before this page
    #[must_use]
    pub fn skip(&self) -> u64 {
        self.limit.saturating_mul(self.page.saturating_sub(1))
    }

    /// Parsed sort specification
    #[must_use]
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::parse(&self.sorted_by)
    }

    /// Find options for the page fetch
    #[must_use]
    pub fn find_options(&self) -> FindOptions {
        FindOptions::new(self.sort_spec(), self.skip(), self.limit)
    }
}

/// Turns raw queries into [`NormalizedQuery`] values
///
/// Holds the defaults applied when a query omits `limit` or `sortedBy`, and
/// the optional cap on `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNormalizer {
    default_limit: u64,
    max_limit: u64,
    default_sort: String,
}

impl Default for QueryNormalizer {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: 0,
            default_sort: DEFAULT_SORTED_BY.to_string(),
        }
    }
}

impl QueryNormalizer {
    /// Normalizer with the built-in defaults and no limit cap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer using the configured defaults
    #[must_use]
    pub fn from_config(config: &PaginationConfig) -> Self {
        Self {
            default_limit: config.default_limit.max(1),
            max_limit: config.max_limit,
            default_sort: config.default_sort.clone(),
        }
    }

    /// Normalize a raw query
    ///
    /// The query is serialized, its first operator token rewritten, and the
    /// result parsed back. `page`, `limit` and `sortedBy` are then split off;
    /// every other key becomes part of the filter.
    ///
    /// # Errors
    ///
    /// Returns a `MalformedQuery` error (status 400) when the rewritten query
    /// cannot be parsed, when `page` or `limit` is not a positive integer, when
    /// `sortedBy` is not a string, or when a filter names an unknown operator.
    ///
    /// # Example
    ///
    /// ```rust
    /// use user_service::pagination::{QueryNormalizer, RawQuery};
    ///
    /// let query = RawQuery::from_pairs([("page", "3"), ("limit", "5"), ("role", "admin")]);
    /// let normalized = QueryNormalizer::new().normalize(&query).unwrap();
    /// assert_eq!(normalized.skip(), 10);
    /// assert_eq!(normalized.sorted_by, "createdAt");
    /// assert_eq!(normalized.filter.len(), 1);
    /// ```
    pub fn normalize(&self, raw: &RawQuery) -> Result<NormalizedQuery, ServiceError> {
        let text = serde_json::to_string(raw).map_err(malformed)?;
        let rewritten = rewrite_operators(&text);
        let mut object: Map<String, Value> = serde_json::from_str(&rewritten).map_err(malformed)?;

        let page = match object.remove(PAGE_KEY) {
            Some(value) => positive_integer(PAGE_KEY, &value)?,
            None => DEFAULT_PAGE,
        };
        let mut limit = match object.remove(LIMIT_KEY) {
            Some(value) => positive_integer(LIMIT_KEY, &value)?,
            None => self.default_limit,
        };
        if self.max_limit > 0 && limit > self.max_limit {
            tracing::debug!(requested = limit, max = self.max_limit, "clamping page size");
            limit = self.max_limit;
        }
        let sorted_by = match object.remove(SORTED_BY_KEY) {
            Some(Value::String(sort)) => sort.trim().to_string(),
            Some(other) => {
                return Err(malformed(format!(
                    "'{}' must be a string, found {}",
                    SORTED_BY_KEY, other
                )))
            }
            None => self.default_sort.clone(),
        };

        let filter = Filter::from_map(object).map_err(malformed)?;

        Ok(NormalizedQuery {
            filter,
            page,
            limit,
            sorted_by,
        })
    }
}

fn malformed(err: impl ToString) -> ServiceError {
    ServiceError::malformed_query(ServiceOperation::FindAllWithPagination, err.to_string())
}

fn positive_integer(key: &str, value: &Value) -> Result<u64, ServiceError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(malformed(format!(
            "'{}' must be a positive integer, found {}",
            key, value
        ))),
    }
}
