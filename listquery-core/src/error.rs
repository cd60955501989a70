//! Error types for list-query translation with actionable messages.
//!
//! Every failure produced while translating request parameters is a client
//! input error: the request is rejected before any descriptor reaches the
//! persistence layer, and nothing here is worth retrying.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: L{category}{number}
//! - 1xxx: Filter errors (unknown field, unknown operator, bad operand)
//! - 2xxx: Sort errors
//! - 3xxx: Pagination errors
//! - 4xxx: Transport decoding errors
//!
//! ```rust
//! use listquery_core::{ErrorCode, QueryError};
//!
//! let err = QueryError::invalid_sort_field("-password", ["created_at", "name"]);
//! assert_eq!(err.code, ErrorCode::InvalidSortField);
//! assert_eq!(err.status_code(), 422);
//! assert!(err.to_string().contains("L2001"));
//! ```

use miette::Diagnostic;
use std::fmt;
use thiserror::Error;

/// Result type for list-query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// HTTP status used for every validation failure (Unprocessable Entity).
pub const UNPROCESSABLE_ENTITY: u16 = 422;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Filter errors (1xxx)
    /// Filter references a field outside the allow-list (L1001).
    InvalidFilterField = 1001,
    /// Filter uses an operator outside the grammar or not accepted by the field (L1002).
    InvalidFilterOperator = 1002,
    /// Filter operand has the wrong shape for its operator (L1003).
    InvalidFilterValue = 1003,

    // Sort errors (2xxx)
    /// Sort token normalizes to a column outside the allow-list (L2001).
    InvalidSortField = 2001,

    // Pagination errors (3xxx)
    /// Page size or page number is non-numeric or out of range (L3001).
    InvalidPaginationValue = 3001,

    // Transport errors (4xxx)
    /// Raw query string could not be decoded into list parameters (L4001).
    InvalidQueryString = 4001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "L1001").
    pub fn code(&self) -> String {
        format!("L{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidFilterField => "Invalid filter field",
            Self::InvalidFilterOperator => "Invalid filter operator",
            Self::InvalidFilterValue => "Invalid filter value",
            Self::InvalidSortField => "Invalid sort field",
            Self::InvalidPaginationValue => "Invalid pagination value",
            Self::InvalidQueryString => "Invalid query string",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional example of a valid parameter.
    pub example: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            example: None,
        }
    }

    /// Add an example.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The parameter that was being parsed (`filter`, `sort`, `paginate`, ...).
    pub parameter: Option<String>,
    /// The field involved.
    pub field: Option<String>,
    /// The operator token involved.
    pub operator: Option<String>,
    /// The offending raw value.
    pub value: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Create new empty context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Errors that can occur while translating list parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Set the parameter being parsed.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.context.parameter = Some(parameter.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the operator token.
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.context.operator = Some(operator.into());
        self
    }

    /// Set the offending raw value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.context.value = Some(value.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a suggestion with an example parameter.
    pub fn with_example_suggestion(
        mut self,
        text: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_example(example));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    // ============== Constructor Functions ==============

    /// Create an error for a filter field outside the allow-list.
    pub fn invalid_filter_field<I, S>(field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidFilterField,
            format!("Filtering on `{}` is not allowed", field),
        )
        .with_parameter("filter")
        .with_field(&field)
        .with_suggestion(allowed_list("Filterable fields", allowed))
    }

    /// Create an error for an operator token outside the grammar.
    pub fn unknown_filter_operator(field: impl Into<String>, operator: impl Into<String>) -> Self {
        let field = field.into();
        let operator = operator.into();
        Self::new(
            ErrorCode::InvalidFilterOperator,
            format!("Unknown filter operator `{}` on `{}`", operator, field),
        )
        .with_parameter("filter")
        .with_field(&field)
        .with_operator(&operator)
        .with_example_suggestion(
            "Use one of: eq, not, gt, gte, lt, lte, in, not_in, like, contains, starts_with, ends_with, null",
            format!("filter[{}][eq]=value", field),
        )
    }

    /// Create an error for a grammar operator the field does not accept.
    pub fn operator_not_allowed<I, S>(
        field: impl Into<String>,
        operator: impl Into<String>,
        allowed: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field = field.into();
        let operator = operator.into();
        Self::new(
            ErrorCode::InvalidFilterOperator,
            format!("Operator `{}` is not allowed on `{}`", operator, field),
        )
        .with_parameter("filter")
        .with_field(&field)
        .with_operator(&operator)
        .with_suggestion(allowed_list("Accepted operators", allowed))
    }

    /// Create an error for an operand that does not fit its operator.
    pub fn invalid_filter_value(
        field: impl Into<String>,
        operator: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let operator = operator.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidFilterValue,
            format!("Invalid value for `{}` ({}): {}", field, operator, message),
        )
        .with_parameter("filter")
        .with_field(&field)
        .with_operator(&operator)
    }

    /// Create an error for a sort token outside the allow-list.
    pub fn invalid_sort_field<I, S>(token: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let token = token.into();
        Self::new(
            ErrorCode::InvalidSortField,
            format!("Invalid sort field `{}`", token),
        )
        .with_parameter("sort")
        .with_value(&token)
        .with_suggestion(allowed_list("Sortable fields", allowed))
        .with_example_suggestion("Prefix the field with `-` for descending order", "sort=-created_at")
        .with_help("Only a single sort field is supported per request")
    }

    /// Create an error for a bad page size or page number.
    pub fn invalid_pagination(
        parameter: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let parameter = parameter.into();
        let value = value.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidPaginationValue,
            format!("Invalid {} `{}`: {}", parameter, value, message),
        )
        .with_parameter(&parameter)
        .with_value(&value)
        .with_example_suggestion("Use positive whole numbers", "paginate=20&page=2")
    }

    /// Create an error for a query string that cannot be decoded.
    pub fn invalid_query_string(key: impl Into<String>, message: impl Into<String>) -> Self {
        let key = key.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidQueryString,
            format!("Malformed query parameter `{}`: {}", key, message),
        )
        .with_value(&key)
        .with_example_suggestion(
            "Use bracket notation for filters",
            "filter[status]=active&filter[age][gte]=18",
        )
    }

    // ============== Error Checks ==============

    /// Check if this error concerns the filter parameter.
    pub fn is_filter_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidFilterField
                | ErrorCode::InvalidFilterOperator
                | ErrorCode::InvalidFilterValue
        )
    }

    /// Every translation error is caused by client input.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Client input errors are never retried.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        UNPROCESSABLE_ENTITY
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref parameter) = self.context.parameter {
            output.push_str(&format!("  → Parameter: {}\n", parameter));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(ref operator) = self.context.operator {
            output.push_str(&format!("  → Operator: {}\n", operator));
        }
        if let Some(ref value) = self.context.value {
            // Raw client input, keep it short
            let value_display = if value.chars().count() > 80 {
                format!("{}...", value.chars().take(80).collect::<String>())
            } else {
                value.clone()
            };
            output.push_str(&format!("  → Value: {}\n", value_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref example) = suggestion.example {
                    output.push_str(&format!("     e.g. {}\n", example));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

fn allowed_list<I, S>(label: &str, allowed: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = allowed
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    if names.is_empty() {
        format!("{}: none are configured for this resource", label)
    } else {
        format!("{}: {}", label, names.join(", "))
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating allow-list configuration.
///
/// These are programmer errors surfaced at startup, never client errors.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Error reading a configuration file.
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(listquery::config::io_error))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or shape error.
    #[error("invalid config file: {source}")]
    #[diagnostic(code(listquery::config::toml_error))]
    Toml {
        #[source]
        source: toml::de::Error,
    },

    /// No resource with this name is configured.
    #[error("no list configuration for resource `{name}`")]
    #[diagnostic(code(listquery::config::unknown_resource))]
    UnknownResource { name: String },

    /// A field name is not a plain identifier.
    #[error("invalid field name `{name}` in resource `{resource}`")]
    #[diagnostic(
        code(listquery::config::invalid_field_name),
        help("field names may only contain ASCII letters, digits, and underscores")
    )]
    InvalidFieldName { resource: String, name: String },

    /// A filter declares an operator outside the grammar.
    #[error("unknown operator `{operator}` on `{resource}.{field}`")]
    #[diagnostic(
        code(listquery::config::unknown_operator),
        help("valid operators: eq, not, gt, gte, lt, lte, in, not_in, like, contains, starts_with, ends_with, null")
    )]
    UnknownOperator {
        resource: String,
        field: String,
        operator: String,
    },

    /// A filter declares an empty operator list.
    #[error("filter `{resource}.{field}` declares no operators")]
    #[diagnostic(code(listquery::config::no_operators))]
    NoOperators { resource: String, field: String },

    /// The default sort token is malformed.
    #[error("invalid default sort `{token}` in resource `{resource}`")]
    #[diagnostic(code(listquery::config::invalid_default_sort))]
    InvalidDefaultSort { resource: String, token: String },

    /// The maximum page size is zero.
    #[error("max_page_size must be at least 1 in resource `{resource}`")]
    #[diagnostic(code(listquery::config::invalid_page_size))]
    InvalidPageSize { resource: String },
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidFilterField.code(), "L1001");
        assert_eq!(ErrorCode::InvalidSortField.code(), "L2001");
        assert_eq!(ErrorCode::InvalidPaginationValue.code(), "L3001");
    }

    #[test]
    fn test_invalid_filter_field_lists_allowed() {
        let err = QueryError::invalid_filter_field("password", ["status", "age"]);
        assert!(err.is_filter_error());
        assert_eq!(err.context.field, Some("password".to_string()));
        assert!(err.context.suggestions[0].text.contains("status, age"));
    }

    #[test]
    fn test_empty_allow_list_suggestion() {
        let err = QueryError::invalid_sort_field("name", Vec::<String>::new());
        assert!(err.context.suggestions[0].text.contains("none are configured"));
    }

    #[test]
    fn test_all_errors_are_unprocessable() {
        let errors = [
            QueryError::invalid_filter_field("a", ["b"]),
            QueryError::unknown_filter_operator("a", "regex"),
            QueryError::invalid_filter_value("a", "in", "expected a list"),
            QueryError::invalid_sort_field("a", ["b"]),
            QueryError::invalid_pagination("page", "x", "not a number"),
            QueryError::invalid_query_string("filter[", "unterminated bracket"),
        ];
        for err in errors {
            assert_eq!(err.status_code(), 422);
            assert!(err.is_client_error());
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::unknown_filter_operator("age", "between");

        let output = err.display_full();
        assert!(output.contains("L1002"));
        assert!(output.contains("Field: age"));
        assert!(output.contains("Operator: between"));
        assert!(output.contains("Suggestions"));
        assert!(output.contains("filter[age][eq]=value"));
    }

    #[test]
    fn test_display_full_truncates_long_values() {
        let long = "x".repeat(500);
        let err = QueryError::invalid_pagination("paginate", long, "not a number");
        let output = err.display_full();
        assert!(output.contains(&format!("{}...", "x".repeat(80))));
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::UnknownOperator {
            resource: "notifications".into(),
            field: "read".into(),
            operator: "regex".into(),
        };
        assert_eq!(err.to_string(), "unknown operator `regex` on `notifications.read`");

        let err = ConfigError::UnknownResource { name: "users".into() };
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn test_error_macro() {
        let err = query_error!(
            ErrorCode::InvalidFilterValue,
            "Pattern must be a string",
            with_field = "name",
            with_operator = "like"
        );

        assert_eq!(err.code, ErrorCode::InvalidFilterValue);
        assert_eq!(err.context.field, Some("name".to_string()));
        assert_eq!(err.context.operator, Some("like".to_string()));
    }
}
