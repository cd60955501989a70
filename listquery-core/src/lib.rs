//! # listquery-core
//!
//! Translates untrusted list-request parameters into a validated,
//! persistence-agnostic query description.
//!
//! This crate provides:
//! - A filter grammar (`eq`, `gte`, `in`, `contains`, ...) checked against a per-resource allow-list
//! - Single-field sort resolution with a `-` prefix for descending order
//! - Page-number pagination converted to take/skip
//! - Relation and relation-count selection
//! - TOML configuration for per-resource allow-lists
//! - A parameterized SQL adapter for the resulting descriptor
//!
//! ## Building a descriptor
//!
//! ```rust
//! use listquery_core::{AllowListConfig, Constraint, ListQueryBuilder, RawListParams};
//!
//! let builder = ListQueryBuilder::new(
//!     AllowListConfig::builder()
//!         .filters(["status", "age"])
//!         .sorts(["age", "createdAt"])
//!         .build(),
//! );
//!
//! let params = RawListParams::from_query(
//!     "filter[status]=active&filter[age][gte]=21&sort=-createdAt&paginate=20&page=3",
//! )
//! .unwrap();
//!
//! let descriptor = builder.parse_params(Some(&params)).unwrap();
//! let filter = descriptor.filter().unwrap();
//! assert_eq!(filter.get("age"), Some(&[Constraint::Gte("21".into())][..]));
//! assert_eq!(descriptor.order().unwrap().to_string(), "created_at DESC");
//! assert_eq!((descriptor.take(), descriptor.skip()), (Some(20), Some(40)));
//! ```
//!
//! ## Rejections
//!
//! Anything outside the allow-list rejects the whole request with a
//! structured [`QueryError`] that maps to HTTP 422:
//!
//! ```rust
//! use listquery_core::{AllowListConfig, ErrorCode, ListQueryBuilder, RawListParams};
//!
//! let builder = ListQueryBuilder::new(AllowListConfig::builder().sort("name").build());
//! let err = builder
//!     .parse_params(Some(&RawListParams::new().sort("-password")))
//!     .unwrap_err();
//!
//! assert_eq!(err.code, ErrorCode::InvalidSortField);
//! assert_eq!(err.status_code(), 422);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod pagination;
pub mod params;
pub mod relations;
pub mod sql;
pub mod types;

pub use builder::{
    DescriptorParts, FilterResolver, ListQueryBuilder, PaginationResolver, QueryDescriptor,
    RelationResolver, SortResolver,
};
pub use config::{AllowListConfig, AllowListConfigBuilder, FilterEntry, ListQueryConfig, ResourceConfig};
pub use error::{ConfigError, ConfigResult, ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{
    Constraint, FieldName, FieldSpec, FilterGrammarParser, FilterOperator, FilterValue,
    OperatorSet, PredicateTree, RawFilterExpr,
};
pub use pagination::{PageWindow, PaginationCalculator, RawNumber};
pub use params::RawListParams;
pub use relations::{RelationName, RelationSelector, RelationSet};
pub use sql::{DatabaseType, SqlBuilder};
pub use types::{OrderByField, SortClauseResolver, SortOrder, DEFAULT_ORDER};

// Re-export logging utilities
pub use logging::{init as init_logging, is_debug_enabled, LogFormat, LogSettings};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{ListQueryBuilder, QueryDescriptor};
    pub use crate::config::{AllowListConfig, ListQueryConfig};
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::filter::{Constraint, FieldSpec, FilterOperator, FilterValue, PredicateTree};
    pub use crate::pagination::PageWindow;
    pub use crate::params::RawListParams;
    pub use crate::types::{OrderByField, SortOrder};
    pub use crate::query_error;
}
