//! Sort types and the single-key sort clause resolver.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

use crate::config::AllowListConfig;
use crate::error::{QueryError, QueryResult};

/// Leading marker on a sort token that selects descending order.
pub const DESCENDING_MARKER: char = '-';

/// Order used when a request does not ask for one: most recently updated first.
pub const DEFAULT_ORDER: OrderByField = OrderByField::desc_static("updated_at");

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[serde(rename = "ASC")]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Asc
    }
}

/// Order by specification for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OrderByField {
    /// The column name to order by.
    pub column: Cow<'static, str>,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(column: impl Into<Cow<'static, str>>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Create a new order by field with a static column name (zero allocation).
    #[inline]
    pub const fn new_static(column: &'static str, order: SortOrder) -> Self {
        Self {
            column: Cow::Borrowed(column),
            order,
        }
    }

    /// Create an ascending order.
    pub fn asc(column: impl Into<Cow<'static, str>>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    /// Create a descending order.
    pub fn desc(column: impl Into<Cow<'static, str>>) -> Self {
        Self::new(column, SortOrder::Desc)
    }

    /// Create a descending order with a static column name (zero allocation).
    #[inline]
    pub const fn desc_static(column: &'static str) -> Self {
        Self::new_static(column, SortOrder::Desc)
    }

    /// Write the SQL directly to a buffer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use listquery_core::types::OrderByField;
    ///
    /// let field = OrderByField::desc("created_at");
    /// let mut buffer = String::with_capacity(64);
    /// buffer.push_str("ORDER BY ");
    /// field.write_sql(&mut buffer);
    /// assert_eq!(buffer, "ORDER BY created_at DESC");
    /// ```
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        buffer.push_str(&self.column);
        buffer.push(' ');
        buffer.push_str(self.order.as_sql());
    }

    /// Parse a sort token (`name` or `-name`) without consulting an allow-list.
    ///
    /// Used for configuration defaults. Returns `None` for an empty or
    /// non-identifier token.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let (name, order) = split_direction(token);
        if !is_identifier(name) {
            return None;
        }
        Some(Self::new(normalize_column(name), order))
    }
}

impl fmt::Display for OrderByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.order)
    }
}

/// Normalize a client-facing field name to the storage column convention (snake_case).
pub fn normalize_column(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Check that a name only uses ASCII letters, digits, and underscores.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn split_direction(token: &str) -> (&str, SortOrder) {
    match token.strip_prefix(DESCENDING_MARKER) {
        Some(rest) => (rest, SortOrder::Desc),
        None => (token, SortOrder::Asc),
    }
}

/// Resolves one sort token against the sortable allow-list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortClauseResolver;

impl SortClauseResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve a sort token.
    ///
    /// No token (or a blank one) yields the configured default order. The
    /// name is normalized before the allow-list check, so allow-lists are
    /// declared in snake_case.
    pub fn resolve(
        &self,
        token: Option<&str>,
        config: &AllowListConfig,
    ) -> QueryResult<OrderByField> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(config.default_order().clone());
        };

        let (name, order) = split_direction(token);
        if !is_identifier(name) {
            debug!(token = %token, "Rejected malformed sort token");
            return Err(QueryError::invalid_sort_field(token, config.sort_names()));
        }

        let column = normalize_column(name);
        if !config.allows_sort(&column) {
            debug!(token = %token, column = %column, "Rejected sort on column outside allow-list");
            return Err(QueryError::invalid_sort_field(token, config.sort_names()));
        }

        Ok(OrderByField::new(column, order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;

    fn config() -> AllowListConfig {
        AllowListConfig::builder()
            .sort("age")
            .sort("created_at")
            .build()
    }

    #[test]
    fn test_order_by_display() {
        assert_eq!(OrderByField::asc("name").to_string(), "name ASC");
        assert_eq!(DEFAULT_ORDER.to_string(), "updated_at DESC");
    }

    #[test]
    fn test_normalize_column() {
        assert_eq!(normalize_column("createdAt"), "created_at");
        assert_eq!(normalize_column("created_at"), "created_at");
        assert_eq!(normalize_column("age"), "age");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("createdAt"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("age,name"));
        assert!(!is_identifier("-age"));
        assert!(!is_identifier("age; DROP TABLE users"));
    }

    #[test]
    fn test_descending_marker() {
        let order = SortClauseResolver::new().resolve(Some("-age"), &config()).unwrap();
        assert_eq!(order, OrderByField::desc("age"));
    }

    #[test]
    fn test_ascending_without_marker() {
        let order = SortClauseResolver::new().resolve(Some("age"), &config()).unwrap();
        assert_eq!(order, OrderByField::asc("age"));
    }

    #[test]
    fn test_camel_case_normalized_before_check() {
        let order = SortClauseResolver::new()
            .resolve(Some("-createdAt"), &config())
            .unwrap();
        assert_eq!(order, OrderByField::desc("created_at"));
    }

    #[test]
    fn test_missing_token_uses_default() {
        let resolver = SortClauseResolver::new();
        assert_eq!(resolver.resolve(None, &config()).unwrap(), DEFAULT_ORDER);
        assert_eq!(resolver.resolve(Some("  "), &config()).unwrap(), DEFAULT_ORDER);
    }

    #[test]
    fn test_configured_default() {
        let config = AllowListConfig::builder()
            .sort("name")
            .default_order(OrderByField::asc("name"))
            .build();
        let order = SortClauseResolver::new().resolve(None, &config).unwrap();
        assert_eq!(order, OrderByField::asc("name"));
    }

    #[test]
    fn test_rejections() {
        let resolver = SortClauseResolver::new();
        for token in ["name", "-name", "-", "--age", "age,created_at", "age desc", "updated_at"] {
            let err = resolver.resolve(Some(token), &config()).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidSortField, "{}", token);
            assert_eq!(err.context.value, Some(token.to_string()));
        }
    }

    #[test]
    fn test_from_token() {
        assert_eq!(OrderByField::from_token("-createdAt"), Some(OrderByField::desc("created_at")));
        assert_eq!(OrderByField::from_token("name"), Some(OrderByField::asc("name")));
        assert_eq!(OrderByField::from_token(""), None);
        assert_eq!(OrderByField::from_token("a b"), None);
    }
}
