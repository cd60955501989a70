//! # listquery
//!
//! Safe, allow-listed query parameters for list endpoints.
//!
//! listquery turns the untrusted `filter`, `sort`, `paginate`, `page`,
//! `relations` and `counts` parameters of a list request into a validated
//! [`QueryDescriptor`] that any persistence layer can execute:
//! - Filters and sorts are restricted to per-resource allow-lists
//! - Sort names are normalized to snake_case columns with `-` for descending
//! - Page numbers become take/skip windows
//! - Any violation rejects the whole request with a structured 422 error
//!
//! ## Quick Start
//!
//! ```rust
//! use listquery::prelude::*;
//!
//! let config = ListQueryConfig::from_str(
//!     r#"
//!     [resources.notifications]
//!     filters = ["read", { name = "created_at", operators = ["gte", "lte"] }]
//!     sorts = ["created_at"]
//!     max_page_size = 50
//!     "#,
//! )
//! .unwrap();
//!
//! let builder = ListQueryBuilder::new(config.resource("notifications").unwrap());
//! let params = RawListParams::from_query("filter[read]=false&sort=-createdAt&paginate=10").unwrap();
//! let descriptor = builder.parse_params(Some(&params)).unwrap();
//!
//! assert_eq!(descriptor.order(), Some(&OrderByField::desc("created_at")));
//! assert_eq!(descriptor.take(), Some(10));
//! assert_eq!(descriptor.skip(), Some(0));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Descriptor rendering to parameterized SQL.
pub mod sql {
    pub use listquery_core::sql::*;
}

/// Opt-in logging setup.
pub mod logging {
    pub use listquery_core::logging::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use listquery_core::prelude::*;
    pub use listquery_core::{DatabaseType, RawNumber};
}

// Re-export key types at the crate root
pub use listquery_core::{
    AllowListConfig, ConfigError, Constraint, ErrorCode, FieldSpec, FilterOperator, FilterValue,
    ListQueryBuilder, ListQueryConfig, OrderByField, PageWindow, PredicateTree, QueryDescriptor,
    QueryError, QueryResult, RawFilterExpr, RawListParams, RelationSet, SortOrder,
};
