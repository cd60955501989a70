//! SQL rendering for query descriptors.
//!
//! The descriptor itself is persistence-agnostic; this module is one adapter
//! that turns it into a parameterized `SELECT`. Relation and count selections
//! have no single-table SQL form and are left to the caller.

use crate::builder::QueryDescriptor;
use crate::filter::{Constraint, FilterValue, PredicateTree};

/// Escape a string for use in SQL (for identifiers, not values).
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Check if an identifier needs quoting.
pub fn needs_quoting(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "user", "order", "group", "select", "from", "where", "table", "index", "key", "primary",
        "foreign", "check", "default", "null", "not", "and", "or", "in", "is", "like", "between",
        "case", "when", "then", "else", "end", "as", "on", "join", "limit", "offset", "union",
        "all", "distinct", "having", "into", "values", "set", "returning",
    ];

    if RESERVED.contains(&name.to_lowercase().as_str()) {
        return true;
    }
    !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier if needed.
pub fn quote_identifier(name: &str) -> String {
    if needs_quoting(name) {
        escape_identifier(name)
    } else {
        name.to_string()
    }
}

/// Target SQL dialect; decides the parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseType {
    /// PostgreSQL uses $1, $2, etc.
    #[default]
    PostgreSQL,
    /// MySQL uses ?, ?, etc.
    MySQL,
    /// SQLite uses ?, ?, etc.
    SQLite,
}

impl DatabaseType {
    /// Get the parameter placeholder for this database type.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => "?".to_string(),
        }
    }

    /// `ESCAPE` clause naming the backslash as the `LIKE` escape character.
    ///
    /// MySQL treats backslash as an escape inside string literals, so it needs two.
    pub fn like_escape_clause(&self) -> &'static str {
        match self {
            Self::MySQL => " ESCAPE '\\\\'",
            Self::PostgreSQL | Self::SQLite => " ESCAPE '\\'",
        }
    }
}

/// Escape `LIKE` wildcards so the value matches literally.
///
/// Backslash is the escape character; pair with [`DatabaseType::like_escape_clause`].
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Accumulates SQL text and its bound parameters.
#[derive(Debug, Clone, Default)]
pub struct SqlBuilder {
    db_type: DatabaseType,
    sql: String,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            sql: String::with_capacity(128),
            params: Vec::new(),
        }
    }

    /// Create a PostgreSQL SQL builder.
    pub fn postgres() -> Self {
        Self::new(DatabaseType::PostgreSQL)
    }

    /// Create a MySQL SQL builder.
    pub fn mysql() -> Self {
        Self::new(DatabaseType::MySQL)
    }

    /// Create a SQLite SQL builder.
    pub fn sqlite() -> Self {
        Self::new(DatabaseType::SQLite)
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a placeholder and bind its value.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.params.push(value.into());
        let placeholder = self.db_type.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    /// Push an identifier (properly quoted if needed).
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&quote_identifier(name));
        self
    }

    /// Push a comma-separated placeholder list for the values.
    pub fn push_param_list(&mut self, values: &[FilterValue]) -> &mut Self {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value.clone());
        }
        self
    }

    /// Push the conjunction of every constraint in the tree.
    ///
    /// An empty tree renders `TRUE`.
    pub fn push_predicates(&mut self, tree: &PredicateTree) -> &mut Self {
        let mut first = true;
        for (field, constraints) in tree.iter() {
            for constraint in constraints {
                if !first {
                    self.sql.push_str(" AND ");
                }
                first = false;
                self.push_constraint(field, constraint);
            }
        }
        if first {
            self.sql.push_str("TRUE");
        }
        self
    }

    /// Push a single constraint on a column.
    pub fn push_constraint(&mut self, column: &str, constraint: &Constraint) -> &mut Self {
        match constraint {
            Constraint::Equals(FilterValue::Null) | Constraint::IsNull => {
                self.push_identifier(column).push(" IS NULL")
            }
            Constraint::NotEquals(FilterValue::Null) | Constraint::IsNotNull => {
                self.push_identifier(column).push(" IS NOT NULL")
            }
            Constraint::Equals(v) => self.comparison(column, "=", v.clone()),
            Constraint::NotEquals(v) => self.comparison(column, "!=", v.clone()),
            Constraint::Lt(v) => self.comparison(column, "<", v.clone()),
            Constraint::Lte(v) => self.comparison(column, "<=", v.clone()),
            Constraint::Gt(v) => self.comparison(column, ">", v.clone()),
            Constraint::Gte(v) => self.comparison(column, ">=", v.clone()),
            Constraint::In(values) if values.is_empty() => self.push("FALSE"),
            Constraint::NotIn(values) if values.is_empty() => self.push("TRUE"),
            Constraint::In(values) => self
                .push_identifier(column)
                .push(" IN (")
                .push_param_list(values)
                .push(")"),
            Constraint::NotIn(values) => self
                .push_identifier(column)
                .push(" NOT IN (")
                .push_param_list(values)
                .push(")"),
            Constraint::Like(pattern) => self.comparison(column, "LIKE", pattern.as_str()),
            Constraint::Contains(s) => self.escaped_like(column, format!("%{}%", escape_like(s))),
            Constraint::StartsWith(s) => self.escaped_like(column, format!("{}%", escape_like(s))),
            Constraint::EndsWith(s) => self.escaped_like(column, format!("%{}", escape_like(s))),
        }
    }

    /// `LIKE` against a pattern whose literal part was passed through [`escape_like`].
    fn escaped_like(&mut self, column: &str, pattern: String) -> &mut Self {
        let escape = self.db_type.like_escape_clause();
        self.comparison(column, "LIKE", pattern).push(escape)
    }

    fn comparison(&mut self, column: &str, op: &str, value: impl Into<FilterValue>) -> &mut Self {
        self.push_identifier(column)
            .push(" ")
            .push(op)
            .push(" ")
            .push_param(value)
    }

    /// Build the final SQL string and parameters.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.sql, self.params)
    }

    /// Get the current SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[FilterValue] {
        &self.params
    }

    /// Get the next parameter index.
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }
}

impl QueryDescriptor {
    /// Render a parameterized `SELECT * FROM table ...` for this descriptor.
    ///
    /// ```rust
    /// use listquery_core::{AllowListConfig, DatabaseType, ListQueryBuilder, RawListParams};
    ///
    /// let builder = ListQueryBuilder::new(
    ///     AllowListConfig::builder().filter("status").sort("age").build(),
    /// );
    /// let params = RawListParams::new().filter("status", "active").sort("-age").paginate(5).page(2);
    ///
    /// let (sql, values) = builder
    ///     .parse_params(Some(&params))
    ///     .unwrap()
    ///     .to_select_sql("users", DatabaseType::PostgreSQL);
    /// assert_eq!(sql, "SELECT * FROM users WHERE status = $1 ORDER BY age DESC LIMIT 5 OFFSET 5");
    /// assert_eq!(values.len(), 1);
    /// ```
    pub fn to_select_sql(&self, table: &str, db_type: DatabaseType) -> (String, Vec<FilterValue>) {
        let mut builder = SqlBuilder::new(db_type);
        builder.push("SELECT * FROM ").push_identifier(table);

        if let Some(filter) = self.filter().filter(|f| !f.is_empty()) {
            builder.push(" WHERE ").push_predicates(filter);
        }
        if let Some(order) = self.order() {
            builder
                .push(" ORDER BY ")
                .push_identifier(&order.column)
                .push(" ")
                .push(order.order.as_sql());
        }
        if let Some(window) = self.window() {
            builder.push(" ");
            window.write_sql(&mut builder.sql);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ListQueryBuilder;
    use crate::config::AllowListConfig;
    use crate::params::RawListParams;
    use pretty_assertions::assert_eq;

    fn descriptor(query: &str) -> QueryDescriptor {
        let builder = ListQueryBuilder::new(
            AllowListConfig::builder()
                .filters(["status", "age", "name", "deleted_at", "order"])
                .sorts(["age", "order"])
                .build(),
        );
        let params = RawListParams::from_query(query).unwrap();
        builder.parse_params(Some(&params)).unwrap()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("user"), "\"user\"");
        assert_eq!(quote_identifier("my_table"), "my_table");
        assert_eq!(escape_identifier("has\"quote"), "\"has\"\"quote\"");
        assert!(needs_quoting("has space"));
    }

    #[test]
    fn test_database_placeholder() {
        assert_eq!(DatabaseType::PostgreSQL.placeholder(5), "$5");
        assert_eq!(DatabaseType::MySQL.placeholder(1), "?");
        assert_eq!(DatabaseType::SQLite.placeholder(1), "?");
    }

    #[test]
    fn test_default_order_only() {
        let (sql, params) = descriptor("").to_select_sql("users", DatabaseType::PostgreSQL);
        assert_eq!(sql, "SELECT * FROM users ORDER BY updated_at DESC");
        assert!(params.is_empty());
    }

    #[test]
    fn test_constraints_and_placeholders() {
        let d = descriptor("filter[age][gte]=18&filter[age][lt]=65&filter[status][in]=a,b&sort=age");

        let (sql, params) = d.to_select_sql("users", DatabaseType::PostgreSQL);
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE age >= $1 AND age < $2 AND status IN ($3, $4) ORDER BY age ASC"
        );
        assert_eq!(params, vec!["18".into(), "65".into(), "a".into(), "b".into()]);

        let (sql, _) = d.to_select_sql("users", DatabaseType::MySQL);
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE age >= ? AND age < ? AND status IN (?, ?) ORDER BY age ASC"
        );
    }

    #[test]
    fn test_patterns_and_nulls() {
        let d = descriptor("filter[name][starts_with]=Jo&filter[deleted_at][null]=true");
        let (sql, params) = d.to_select_sql("users", DatabaseType::SQLite);
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE name LIKE ? ESCAPE '\\' AND deleted_at IS NULL ORDER BY updated_at DESC"
        );
        assert_eq!(params, vec![FilterValue::String("Jo%".into())]);
    }

    #[test]
    fn test_single_comparison() {
        let mut builder = SqlBuilder::postgres();
        builder.push_constraint("age", &Constraint::Equals(FilterValue::Int(30)));
        builder.push(" AND ");
        builder.push_constraint("age", &Constraint::Lte(FilterValue::Int(65)));

        let (sql, params) = builder.build();
        assert_eq!(sql, "age = $1 AND age <= $2");
        assert_eq!(params, vec![FilterValue::Int(30), FilterValue::Int(65)]);
    }

    #[test]
    fn test_pattern_wildcards_match_literally() {
        let mut builder = SqlBuilder::postgres();
        builder.push_constraint("title", &Constraint::Contains("50%_off\\".into()));

        let (sql, params) = builder.build();
        assert_eq!(sql, "title LIKE $1 ESCAPE '\\'");
        assert_eq!(params, vec![FilterValue::String("%50\\%\\_off\\\\%".into())]);
    }

    #[test]
    fn test_raw_like_is_not_escaped() {
        let mut builder = SqlBuilder::mysql();
        builder.push_constraint("title", &Constraint::Like("50%".into()));
        builder.push(" AND ");
        builder.push_constraint("title", &Constraint::EndsWith("_x".into()));

        let (sql, params) = builder.build();
        assert_eq!(sql, "title LIKE ? AND title LIKE ? ESCAPE '\\\\'");
        assert_eq!(params, vec![FilterValue::from("50%"), FilterValue::from("%\\_x")]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("a%b_c\\d"), "a\\%b\\_c\\\\d");
    }

    #[test]
    fn test_reserved_words_quoted() {
        let d = descriptor("filter[order]=1&sort=-order&paginate=10&page=3");
        let (sql, _) = d.to_select_sql("user", DatabaseType::PostgreSQL);
        assert_eq!(
            sql,
            "SELECT * FROM \"user\" WHERE \"order\" = $1 ORDER BY \"order\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_empty_in_list() {
        let mut builder = SqlBuilder::postgres();
        builder.push_constraint("id", &Constraint::In(Vec::new()));
        builder.push(" OR ");
        builder.push_constraint("id", &Constraint::NotIn(Vec::new()));
        assert_eq!(builder.sql(), "FALSE OR TRUE");
        assert_eq!(builder.next_param_index(), 1);
    }
}
