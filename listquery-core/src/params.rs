//! The untrusted list-request parameter bag.
//!
//! `RawListParams` can be deserialized from a JSON body or decoded from a raw
//! query string using the common REST conventions:
//!
//! ```rust
//! use listquery_core::params::RawListParams;
//!
//! let params = RawListParams::from_query(
//!     "filter[status]=active&filter[age][gte]=18&sort=-createdAt&paginate=20&page=2&relations=user",
//! )
//! .unwrap();
//!
//! assert_eq!(params.filter.len(), 2);
//! assert_eq!(params.sort.as_deref(), Some("-createdAt"));
//! assert_eq!(params.relations, vec!["user".to_string()]);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterValue, RawFilterExpr};
use crate::pagination::RawNumber;

/// Raw list parameters, exactly as supplied by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawListParams {
    /// Field name → plain value or operator map.
    pub filter: IndexMap<String, RawFilterExpr>,
    /// Single sort token, `-` prefixed for descending.
    pub sort: Option<String>,
    /// Page size; absent means unpaginated.
    pub paginate: Option<RawNumber>,
    /// 1-indexed page number.
    pub page: Option<RawNumber>,
    /// Relations to load.
    pub relations: Vec<String>,
    /// Relations to count.
    pub counts: Vec<String>,
}

impl RawListParams {
    /// Create an empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter expression.
    pub fn filter(mut self, field: impl Into<String>, expr: impl Into<RawFilterExpr>) -> Self {
        self.filter.insert(field.into(), expr.into());
        self
    }

    /// Set the sort token.
    pub fn sort(mut self, token: impl Into<String>) -> Self {
        self.sort = Some(token.into());
        self
    }

    /// Set the page size.
    pub fn paginate(mut self, size: impl Into<RawNumber>) -> Self {
        self.paginate = Some(size.into());
        self
    }

    /// Set the page number.
    pub fn page(mut self, page: impl Into<RawNumber>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Request a relation.
    pub fn relation(mut self, name: impl Into<String>) -> Self {
        self.relations.push(name.into());
        self
    }

    /// Request a relation count.
    pub fn count(mut self, name: impl Into<String>) -> Self {
        self.counts.push(name.into());
        self
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// Recognized keys: `filter[field]`, `filter[field][op]`, `sort`,
    /// `paginate`, `page`, `relations`/`relations[]`, `counts`/`counts[]`.
    /// Other keys are ignored. Values are kept as strings; repeated filter
    /// keys accumulate into a list. The result does not depend on key order:
    /// repeated plain values become `in`, a single one becomes `eq`.
    pub fn from_query(query: &str) -> QueryResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        let mut filters: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "sort" => params.sort = non_empty(&value),
                "paginate" => params.paginate = non_empty(&value).map(RawNumber::Text),
                "page" => params.page = non_empty(&value).map(RawNumber::Text),
                "relations" | "relations[]" => push_names(&mut params.relations, &value),
                "counts" | "counts[]" => push_names(&mut params.counts, &value),
                k if k == "filter" || k.starts_with("filter[") => {
                    let (field, operator) = parse_filter_key(k)?;
                    filters
                        .entry(field.to_string())
                        .or_default()
                        .entry(operator.unwrap_or(PLAIN).to_string())
                        .or_default()
                        .push(value.into_owned());
                }
                other => trace!(key = %other, "Ignoring unrecognized list parameter"),
            }
        }

        params.filter = filters
            .into_iter()
            .map(|(field, operators)| (field, collect_expr(operators)))
            .collect();
        Ok(params)
    }
}

/// Slot for `filter[field]=value`; operator segments are never empty.
const PLAIN: &str = "";

fn collect_expr(mut operators: IndexMap<String, Vec<String>>) -> RawFilterExpr {
    if operators.len() == 1 {
        if let Some(values) = operators.shift_remove(PLAIN) {
            return RawFilterExpr::Value(one_or_list(values));
        }
    }

    let mut merged: IndexMap<String, Vec<String>> = IndexMap::new();
    for (operator, values) in operators {
        let operator = match (operator.as_str(), values.len()) {
            (PLAIN, 1) => "eq".to_string(),
            (PLAIN, _) => "in".to_string(),
            _ => operator,
        };
        merged.entry(operator).or_default().extend(values);
    }

    RawFilterExpr::Operators(
        merged
            .into_iter()
            .map(|(operator, values)| (operator, one_or_list(values)))
            .collect(),
    )
}

/// A single value stays unwrapped; repeats become a list.
fn one_or_list(mut values: Vec<String>) -> FilterValue {
    if values.len() == 1 {
        if let Some(value) = values.pop() {
            return FilterValue::String(value);
        }
    }
    FilterValue::List(values.into_iter().map(FilterValue::String).collect())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn push_names(names: &mut Vec<String>, value: &str) {
    names.extend(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}

/// Split `filter[field]` / `filter[field][op]` into its parts.
fn parse_filter_key(key: &str) -> QueryResult<(&str, Option<&str>)> {
    let malformed = |message: &str| QueryError::invalid_query_string(key, message);

    let rest = key
        .strip_prefix("filter[")
        .ok_or_else(|| malformed("expected `filter[field]`"))?;
    let (field, rest) = rest
        .split_once(']')
        .ok_or_else(|| malformed("unterminated bracket"))?;
    if field.is_empty() {
        return Err(malformed("empty field name"));
    }
    if rest.is_empty() {
        return Ok((field, None));
    }

    let operator = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| malformed("expected `filter[field][operator]`"))?;
    if operator.is_empty() || operator.contains('[') || operator.contains(']') {
        return Err(malformed("expected a single operator segment"));
    }
    Ok((field, Some(operator)))
}
