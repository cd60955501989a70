//! Filter grammar: raw filter expressions, operators, and the validated predicate tree.
//!
//! A filter expression arrives either as a plain value (equality) or as a map
//! of operator tokens to operands:
//!
//! ```rust
//! use listquery_core::filter::{Constraint, FilterOperator, FilterValue, RawFilterExpr};
//!
//! let plain: RawFilterExpr = serde_json::from_str(r#""active""#).unwrap();
//! assert_eq!(plain, RawFilterExpr::Value(FilterValue::String("active".into())));
//!
//! let range: RawFilterExpr = serde_json::from_str(r#"{"gte": 18, "lt": 65}"#).unwrap();
//! assert!(matches!(range, RawFilterExpr::Operators(_)));
//!
//! assert_eq!("starts_with".parse::<FilterOperator>(), Ok(FilterOperator::StartsWith));
//! assert_eq!(Constraint::IsNull.operator(), FilterOperator::Null);
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::debug;

use crate::config::AllowListConfig;
use crate::error::{QueryError, QueryResult};

/// Name of a filterable or sortable field.
pub type FieldName = SmolStr;

/// A filter operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// The fixed set of operator tokens accepted by the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// `eq`: equals.
    Eq,
    /// `not`: not equals.
    Not,
    /// `gt`: greater than.
    Gt,
    /// `gte`: greater than or equal.
    Gte,
    /// `lt`: less than.
    Lt,
    /// `lte`: less than or equal.
    Lte,
    /// `in`: member of a set.
    In,
    /// `not_in`: not a member of a set.
    NotIn,
    /// `like`: raw SQL-style pattern (`%`, `_`).
    Like,
    /// `contains`: substring match.
    Contains,
    /// `starts_with`: prefix match.
    StartsWith,
    /// `ends_with`: suffix match.
    EndsWith,
    /// `null`: `true` for IS NULL, `false` for IS NOT NULL.
    Null,
}

impl FilterOperator {
    /// Every operator in the grammar.
    pub const ALL: [FilterOperator; 13] = [
        Self::Eq,
        Self::Not,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Like,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::Null,
    ];

    /// The token used in request parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Not => "not",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Like => "like",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Null => "null",
        }
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not part of the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter operator `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| UnknownOperator(token.to_string()))
    }
}

/// A compact set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorSet(u16);

impl OperatorSet {
    /// No operators.
    pub const EMPTY: Self = Self(0);

    /// Every operator in the grammar.
    pub const ALL: Self = Self((1 << FilterOperator::ALL.len()) - 1);

    /// Check membership.
    #[inline]
    pub const fn contains(self, op: FilterOperator) -> bool {
        self.0 & op.bit() != 0
    }

    /// Add an operator.
    #[inline]
    pub const fn with(self, op: FilterOperator) -> Self {
        Self(self.0 | op.bit())
    }

    /// Check if the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the operators in grammar order.
    pub fn iter(self) -> impl Iterator<Item = FilterOperator> {
        FilterOperator::ALL
            .into_iter()
            .filter(move |op| self.contains(*op))
    }
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<FilterOperator> for OperatorSet {
    fn from_iter<I: IntoIterator<Item = FilterOperator>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// A filterable field and the operators it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    /// Field name as it appears in `filter[...]`.
    pub name: FieldName,
    /// Operators accepted on this field.
    pub operators: OperatorSet,
}

impl FieldSpec {
    /// A field accepting every grammar operator.
    pub fn new(name: impl Into<FieldName>) -> Self {
        Self {
            name: name.into(),
            operators: OperatorSet::ALL,
        }
    }

    /// Restrict the accepted operators.
    pub fn operators(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.operators = operators.into_iter().collect();
        self
    }

    /// Check whether the operator is accepted.
    pub fn accepts(&self, op: FilterOperator) -> bool {
        self.operators.contains(op)
    }
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// An unvalidated filter expression for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFilterExpr {
    /// Operator token → operand, e.g. `{"gte": 18}`.
    Operators(IndexMap<String, FilterValue>),
    /// A plain value: equality, or set membership for a list, or IS NULL for null.
    Value(FilterValue),
}

impl From<FilterValue> for RawFilterExpr {
    fn from(v: FilterValue) -> Self {
        Self::Value(v)
    }
}

impl From<&str> for RawFilterExpr {
    fn from(v: &str) -> Self {
        Self::Value(v.into())
    }
}

/// A normalized comparison constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Equals the value (a null value means IS NULL).
    Equals(FilterValue),
    /// Not equals the value (a null value means IS NOT NULL).
    NotEquals(FilterValue),
    /// Less than.
    Lt(FilterValue),
    /// Less than or equal.
    Lte(FilterValue),
    /// Greater than.
    Gt(FilterValue),
    /// Greater than or equal.
    Gte(FilterValue),
    /// In a list of values.
    In(Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(Vec<FilterValue>),
    /// Raw pattern match.
    Like(String),
    /// Contains (LIKE %value%).
    Contains(String),
    /// Starts with (LIKE value%).
    StartsWith(String),
    /// Ends with (LIKE %value).
    EndsWith(String),
    /// Is null.
    IsNull,
    /// Is not null.
    IsNotNull,
}

impl Constraint {
    /// The grammar operator this constraint was parsed from.
    pub fn operator(&self) -> FilterOperator {
        match self {
            Self::Equals(_) => FilterOperator::Eq,
            Self::NotEquals(_) => FilterOperator::Not,
            Self::Lt(_) => FilterOperator::Lt,
            Self::Lte(_) => FilterOperator::Lte,
            Self::Gt(_) => FilterOperator::Gt,
            Self::Gte(_) => FilterOperator::Gte,
            Self::In(_) => FilterOperator::In,
            Self::NotIn(_) => FilterOperator::NotIn,
            Self::Like(_) => FilterOperator::Like,
            Self::Contains(_) => FilterOperator::Contains,
            Self::StartsWith(_) => FilterOperator::StartsWith,
            Self::EndsWith(_) => FilterOperator::EndsWith,
            Self::IsNull | Self::IsNotNull => FilterOperator::Null,
        }
    }
}

/// Validated filters: allow-listed field → constraints that must all hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredicateTree {
    fields: IndexMap<FieldName, Vec<Constraint>>,
}

impl PredicateTree {
    /// Constraints on a field.
    pub fn get(&self, field: &str) -> Option<&[Constraint]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Check whether a field is constrained.
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Constrained field names, in request order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.keys()
    }

    /// Iterate over fields and their constraints.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &[Constraint])> {
        self.fields.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of constrained fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is constrained.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of constraints across all fields.
    pub fn constraint_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    fn insert(&mut self, field: FieldName, constraints: Vec<Constraint>) {
        self.fields.insert(field, constraints);
    }
}

/// Parses raw filter maps into predicate trees restricted to the allow-list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterGrammarParser;

impl FilterGrammarParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw filter map.
    ///
    /// Returns `None` when nothing is allow-listed or nothing was requested.
    /// Any unknown field, operator, or malformed operand rejects the whole map.
    pub fn parse(
        &self,
        filters: &IndexMap<String, RawFilterExpr>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PredicateTree>> {
        if config.allowed_filters().is_empty() || filters.is_empty() {
            return Ok(None);
        }

        let mut tree = PredicateTree::default();
        for (field, expr) in filters {
            let Some(spec) = config.filter_spec(field) else {
                debug!(field = %field, "Rejected filter on field outside allow-list");
                return Err(QueryError::invalid_filter_field(
                    field.as_str(),
                    config.filter_names(),
                ));
            };
            let constraints = parse_expr(spec, expr)?;
            tree.insert(spec.name.clone(), constraints);
        }

        debug!(
            fields = tree.len(),
            constraints = tree.constraint_count(),
            "Parsed filters"
        );
        Ok(Some(tree))
    }
}

fn parse_expr(spec: &FieldSpec, expr: &RawFilterExpr) -> QueryResult<Vec<Constraint>> {
    match expr {
        RawFilterExpr::Value(value) => {
            let op = match value {
                FilterValue::List(_) => FilterOperator::In,
                FilterValue::Null => FilterOperator::Null,
                _ => FilterOperator::Eq,
            };
            check_accepted(spec, op)?;
            let constraint = match value {
                FilterValue::List(_) => Constraint::In(parse_set(spec, op, value)?),
                FilterValue::Null => Constraint::IsNull,
                _ => Constraint::Equals(value.clone()),
            };
            Ok(vec![constraint])
        }
        RawFilterExpr::Operators(ops) => {
            if ops.is_empty() {
                return Err(QueryError::invalid_filter_value(
                    spec.name.as_str(),
                    "{}",
                    "expression has no operators",
                ));
            }
            ops.iter()
                .map(|(token, operand)| {
                    let op = token.parse::<FilterOperator>().map_err(|_| {
                        debug!(field = %spec.name, operator = %token, "Rejected unknown filter operator");
                        QueryError::unknown_filter_operator(spec.name.as_str(), token.as_str())
                    })?;
                    check_accepted(spec, op)?;
                    build_constraint(spec, op, operand)
                })
                .collect()
        }
    }
}

fn check_accepted(spec: &FieldSpec, op: FilterOperator) -> QueryResult<()> {
    if spec.accepts(op) {
        Ok(())
    } else {
        debug!(field = %spec.name, operator = %op, "Rejected operator not accepted by field");
        Err(QueryError::operator_not_allowed(
            spec.name.as_str(),
            op.as_str(),
            spec.operators.iter().map(|op| op.as_str()),
        ))
    }
}

fn build_constraint(
    spec: &FieldSpec,
    op: FilterOperator,
    operand: &FilterValue,
) -> QueryResult<Constraint> {
    let invalid = |message: &str| {
        QueryError::invalid_filter_value(spec.name.as_str(), op.as_str(), message)
            .with_value(operand.to_string())
    };

    Ok(match op {
        FilterOperator::Eq | FilterOperator::Not => {
            if operand.is_list() {
                return Err(invalid("expected a single value, use `in` for lists"));
            }
            if op == FilterOperator::Eq {
                Constraint::Equals(operand.clone())
            } else {
                Constraint::NotEquals(operand.clone())
            }
        }
        FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
            if operand.is_list() || operand.is_null() {
                return Err(invalid("expected a single non-null value"));
            }
            let v = operand.clone();
            match op {
                FilterOperator::Gt => Constraint::Gt(v),
                FilterOperator::Gte => Constraint::Gte(v),
                FilterOperator::Lt => Constraint::Lt(v),
                _ => Constraint::Lte(v),
            }
        }
        FilterOperator::In => Constraint::In(parse_set(spec, op, operand)?),
        FilterOperator::NotIn => Constraint::NotIn(parse_set(spec, op, operand)?),
        FilterOperator::Like
        | FilterOperator::Contains
        | FilterOperator::StartsWith
        | FilterOperator::EndsWith => {
            let FilterValue::String(pattern) = operand else {
                return Err(invalid("expected a string"));
            };
            let pattern = pattern.clone();
            match op {
                FilterOperator::Like => Constraint::Like(pattern),
                FilterOperator::Contains => Constraint::Contains(pattern),
                FilterOperator::StartsWith => Constraint::StartsWith(pattern),
                _ => Constraint::EndsWith(pattern),
            }
        }
        FilterOperator::Null => match parse_flag(operand) {
            Some(true) => Constraint::IsNull,
            Some(false) => Constraint::IsNotNull,
            None => return Err(invalid("expected true or false")),
        },
    })
}

/// Operand of a set-membership operator: a list, a comma-separated string, or one scalar.
fn parse_set(
    spec: &FieldSpec,
    op: FilterOperator,
    operand: &FilterValue,
) -> QueryResult<Vec<FilterValue>> {
    let values = match operand {
        FilterValue::List(items) => {
            if items.iter().any(|v| v.is_list() || v.is_null()) {
                return Err(QueryError::invalid_filter_value(
                    spec.name.as_str(),
                    op.as_str(),
                    "list items must be non-null scalars",
                )
                .with_value(operand.to_string()));
            }
            items.clone()
        }
        FilterValue::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FilterValue::from)
            .collect(),
        FilterValue::Null => Vec::new(),
        scalar => vec![scalar.clone()],
    };

    if values.is_empty() {
        return Err(QueryError::invalid_filter_value(
            spec.name.as_str(),
            op.as_str(),
            "expected at least one value",
        )
        .with_value(operand.to_string()));
    }
    Ok(values)
}

fn parse_flag(operand: &FilterValue) -> Option<bool> {
    match operand {
        FilterValue::Bool(b) => Some(*b),
        FilterValue::Int(1) => Some(true),
        FilterValue::Int(0) => Some(false),
        FilterValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn config() -> AllowListConfig {
        AllowListConfig::builder()
            .filter("status")
            .filter("age")
            .filter(FieldSpec::new("email").operators([FilterOperator::Eq, FilterOperator::Contains]))
            .build()
    }

    fn filters(entries: &[(&str, RawFilterExpr)]) -> IndexMap<String, RawFilterExpr> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn ops(entries: &[(&str, FilterValue)]) -> RawFilterExpr {
        RawFilterExpr::Operators(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_operator_tokens_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(op.as_str().parse::<FilterOperator>(), Ok(op));
        }
        assert!("regex".parse::<FilterOperator>().is_err());
        assert!("EQ".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_operator_set() {
        let set: OperatorSet = [FilterOperator::Eq, FilterOperator::In].into_iter().collect();
        assert!(set.contains(FilterOperator::Eq));
        assert!(!set.contains(FilterOperator::Like));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![FilterOperator::Eq, FilterOperator::In]);
        assert_eq!(OperatorSet::ALL.iter().count(), FilterOperator::ALL.len());
        assert!(OperatorSet::EMPTY.is_empty());
    }

    #[test]
    fn test_plain_value_is_equality() {
        let tree = FilterGrammarParser::new()
            .parse(&filters(&[("status", "active".into())]), &config())
            .unwrap()
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.get("status"),
            Some(&[Constraint::Equals("active".into())][..])
        );
    }

    #[test]
    fn test_plain_list_and_null() {
        let tree = FilterGrammarParser::new()
            .parse(
                &filters(&[
                    ("status", FilterValue::from(vec!["a", "b"]).into()),
                    ("age", FilterValue::Null.into()),
                ]),
                &config(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(
            tree.get("status"),
            Some(&[Constraint::In(vec!["a".into(), "b".into()])][..])
        );
        assert_eq!(tree.get("age"), Some(&[Constraint::IsNull][..]));
    }

    #[test]
    fn test_range_operators_are_anded() {
        let tree = FilterGrammarParser::new()
            .parse(
                &filters(&[("age", ops(&[("gte", 18.into()), ("lt", 65.into())]))]),
                &config(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(
            tree.get("age"),
            Some(&[Constraint::Gte(18.into()), Constraint::Lt(65.into())][..])
        );
        assert_eq!(tree.constraint_count(), 2);
    }

    #[test]
    fn test_in_from_comma_separated_string() {
        let tree = FilterGrammarParser::new()
            .parse(
                &filters(&[("status", ops(&[("in", "active, pending,".into())]))]),
                &config(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(
            tree.get("status"),
            Some(&[Constraint::In(vec!["active".into(), "pending".into()])][..])
        );
    }

    #[test]
    fn test_null_flag() {
        let tree = FilterGrammarParser::new()
            .parse(
                &filters(&[
                    ("status", ops(&[("null", "false".into())])),
                    ("age", ops(&[("null", true.into())])),
                ]),
                &config(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(tree.get("status"), Some(&[Constraint::IsNotNull][..]));
        assert_eq!(tree.get("age"), Some(&[Constraint::IsNull][..]));
    }

    #[test]
    fn test_empty_inputs_are_not_errors() {
        let parser = FilterGrammarParser::new();
        assert_eq!(parser.parse(&IndexMap::new(), &config()).unwrap(), None);

        let no_allow_list = AllowListConfig::builder().sort("name").build();
        let result = parser
            .parse(&filters(&[("anything", "x".into())]), &no_allow_list)
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FilterGrammarParser::new()
            .parse(
                &filters(&[("status", "active".into()), ("password", "x".into())]),
                &config(),
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFilterField);
        assert_eq!(err.context.field, Some("password".to_string()));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = FilterGrammarParser::new()
            .parse(&filters(&[("age", ops(&[("between", 1.into())]))]), &config())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFilterOperator);
        assert_eq!(err.context.operator, Some("between".to_string()));
    }

    #[test]
    fn test_operator_not_accepted_by_field() {
        let err = FilterGrammarParser::new()
            .parse(&filters(&[("email", ops(&[("gt", "a".into())]))]), &config())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFilterOperator);
        assert!(err.context.suggestions[0].text.contains("eq, contains"));

        // a plain list needs `in`, which email does not accept
        let err = FilterGrammarParser::new()
            .parse(
                &filters(&[("email", FilterValue::from(vec!["a"]).into())]),
                &config(),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilterOperator);
    }

    #[test]
    fn test_operand_shape_rejected() {
        let parser = FilterGrammarParser::new();
        let cases = [
            ops(&[("eq", FilterValue::from(vec![1, 2]))]),
            ops(&[("gt", FilterValue::Null)]),
            ops(&[("contains", 3.into())]),
            ops(&[("null", "maybe".into())]),
            ops(&[("in", "".into())]),
            ops(&[("in", FilterValue::List(vec![FilterValue::Null]))]),
            ops(&[]),
        ];
        for expr in cases {
            let err = parser
                .parse(&filters(&[("age", expr.clone())]), &config())
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidFilterValue, "{:?}", expr);
        }
    }

    #[test]
    fn test_raw_expr_deserialization() {
        let map: IndexMap<String, RawFilterExpr> = serde_json::from_str(
            r#"{"status": "active", "age": {"gte": 18}, "tags": ["a", "b"], "deleted_at": null}"#,
        )
        .unwrap();

        assert_eq!(map["status"], RawFilterExpr::Value("active".into()));
        assert_eq!(map["age"], ops(&[("gte", 18.into())]));
        assert_eq!(map["tags"], RawFilterExpr::Value(vec!["a", "b"].into()));
        assert_eq!(map["deleted_at"], RawFilterExpr::Value(FilterValue::Null));
    }

    #[test]
    fn test_predicate_tree_serializes_as_map() {
        let tree = FilterGrammarParser::new()
            .parse(&filters(&[("status", "active".into())]), &config())
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json, serde_json::json!({"status": [{"equals": "active"}]}));
    }
}
