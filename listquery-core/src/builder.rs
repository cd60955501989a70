//! The query descriptor and the builder that produces it.
//!
//! `ListQueryBuilder` owns a resource's allow-list configuration and runs the
//! filter, sort, pagination, and relation resolvers independently over one
//! request's parameters, merging their results into a [`QueryDescriptor`].
//!
//! ```rust
//! use listquery_core::{AllowListConfig, ListQueryBuilder, OrderByField, RawListParams};
//!
//! let builder = ListQueryBuilder::new(
//!     AllowListConfig::builder()
//!         .filters(["status", "age"])
//!         .sorts(["status", "age"])
//!         .build(),
//! );
//!
//! let params = RawListParams::new()
//!     .filter("status", "active")
//!     .sort("-age")
//!     .paginate(5)
//!     .page(1);
//!
//! let descriptor = builder.parse_params(Some(&params)).unwrap();
//! assert_eq!(descriptor.order(), Some(&OrderByField::desc("age")));
//! assert_eq!(descriptor.take(), Some(5));
//! assert_eq!(descriptor.skip(), Some(0));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::config::AllowListConfig;
use crate::error::QueryResult;
use crate::filter::{FilterGrammarParser, PredicateTree, RawFilterExpr};
use crate::pagination::{PageWindow, PaginationCalculator, RawNumber};
use crate::params::RawListParams;
use crate::relations::{RelationSelector, RelationSet};
use crate::types::{OrderByField, SortClauseResolver};

/// Turns the raw filter map into a predicate tree.
pub trait FilterResolver: Send + Sync {
    /// Validate filters; `None` means no filtering.
    fn parse_filters(
        &self,
        filters: &IndexMap<String, RawFilterExpr>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PredicateTree>>;
}

/// Turns the sort token into an order clause.
pub trait SortResolver: Send + Sync {
    /// Resolve the order; a missing token yields the configured default.
    fn parse_sorting(
        &self,
        token: Option<&str>,
        config: &AllowListConfig,
    ) -> QueryResult<OrderByField>;
}

/// Turns page size and page number into a window.
pub trait PaginationResolver: Send + Sync {
    /// Compute the window; `None` means unpaginated.
    fn parse_pagination(
        &self,
        paginate: Option<&RawNumber>,
        page: Option<&RawNumber>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PageWindow>>;
}

/// Turns requested relation names into canonical sets.
pub trait RelationResolver: Send + Sync {
    /// Relations to load.
    fn parse_relations(&self, names: &[String]) -> RelationSet;

    /// Relations to count.
    fn parse_counts(&self, names: &[String]) -> RelationSet;
}

impl FilterResolver for FilterGrammarParser {
    fn parse_filters(
        &self,
        filters: &IndexMap<String, RawFilterExpr>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PredicateTree>> {
        self.parse(filters, config)
    }
}

impl SortResolver for SortClauseResolver {
    fn parse_sorting(
        &self,
        token: Option<&str>,
        config: &AllowListConfig,
    ) -> QueryResult<OrderByField> {
        self.resolve(token, config)
    }
}

impl PaginationResolver for PaginationCalculator {
    fn parse_pagination(
        &self,
        paginate: Option<&RawNumber>,
        page: Option<&RawNumber>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PageWindow>> {
        self.calculate(paginate, page, config)
    }
}

impl RelationResolver for RelationSelector {
    fn parse_relations(&self, names: &[String]) -> RelationSet {
        self.relations(names)
    }

    fn parse_counts(&self, names: &[String]) -> RelationSet {
        self.counts(names)
    }
}

/// A validated, persistence-agnostic list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDescriptor {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<PredicateTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<OrderByField>,
    #[serde(skip_serializing_if = "RelationSet::is_empty")]
    relations: RelationSet,
    #[serde(skip_serializing_if = "RelationSet::is_empty")]
    count_relations: RelationSet,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    window: Option<PageWindow>,
}

/// The owned pieces of a [`QueryDescriptor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorParts {
    /// Validated filters.
    pub filter: Option<PredicateTree>,
    /// Order clause.
    pub order: Option<OrderByField>,
    /// Relations to load.
    pub relations: RelationSet,
    /// Relations to count.
    pub count_relations: RelationSet,
    /// Pagination window.
    pub window: Option<PageWindow>,
}

impl QueryDescriptor {
    /// An empty descriptor: list everything in storage order.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validated filters.
    pub fn filter(&self) -> Option<&PredicateTree> {
        self.filter.as_ref()
    }

    /// Order clause.
    pub fn order(&self) -> Option<&OrderByField> {
        self.order.as_ref()
    }

    /// Relations to load.
    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }

    /// Relations to count.
    pub fn count_relations(&self) -> &RelationSet {
        &self.count_relations
    }

    /// Pagination window.
    pub fn window(&self) -> Option<PageWindow> {
        self.window
    }

    /// Maximum number of records to return.
    pub fn take(&self) -> Option<u64> {
        self.window.map(|w| w.take)
    }

    /// Number of records to skip.
    pub fn skip(&self) -> Option<u64> {
        self.window.map(|w| w.skip)
    }

    /// Check if the descriptor requests nothing at all.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.order.is_none()
            && self.relations.is_empty()
            && self.count_relations.is_empty()
            && self.window.is_none()
    }

    /// Consume the descriptor.
    pub fn into_parts(self) -> DescriptorParts {
        DescriptorParts {
            filter: self.filter,
            order: self.order,
            relations: self.relations,
            count_relations: self.count_relations,
            window: self.window,
        }
    }
}

/// Builds query descriptors for one resource.
///
/// Cloning is cheap: the configuration is shared.
#[derive(Debug, Clone)]
pub struct ListQueryBuilder<
    F = FilterGrammarParser,
    S = SortClauseResolver,
    P = PaginationCalculator,
    R = RelationSelector,
> {
    config: Arc<AllowListConfig>,
    filters: F,
    sorting: S,
    pagination: P,
    relations: R,
}

impl ListQueryBuilder {
    /// Create a builder with the default resolvers.
    pub fn new(config: impl Into<Arc<AllowListConfig>>) -> Self {
        Self::with_resolvers(
            config,
            FilterGrammarParser::new(),
            SortClauseResolver::new(),
            PaginationCalculator::new(),
            RelationSelector::new(),
        )
    }
}

impl<F, S, P, R> ListQueryBuilder<F, S, P, R>
where
    F: FilterResolver,
    S: SortResolver,
    P: PaginationResolver,
    R: RelationResolver,
{
    /// Create a builder with explicit resolvers.
    pub fn with_resolvers(
        config: impl Into<Arc<AllowListConfig>>,
        filters: F,
        sorting: S,
        pagination: P,
        relations: R,
    ) -> Self {
        Self {
            config: config.into(),
            filters,
            sorting,
            pagination,
            relations,
        }
    }

    /// The allow-list configuration.
    pub fn config(&self) -> &AllowListConfig {
        &self.config
    }

    /// Translate request parameters into a descriptor.
    ///
    /// `None` yields an empty descriptor. Any validation failure rejects the
    /// whole request; no partial descriptor is produced.
    pub fn parse_params(&self, params: Option<&RawListParams>) -> QueryResult<QueryDescriptor> {
        let Some(params) = params else {
            return Ok(QueryDescriptor::empty());
        };

        let result = self.build(params);
        match &result {
            Ok(descriptor) => debug!(
                filters = descriptor.filter().map_or(0, PredicateTree::len),
                order = ?descriptor.order().map(ToString::to_string),
                take = ?descriptor.take(),
                skip = ?descriptor.skip(),
                relations = descriptor.relations().len(),
                counts = descriptor.count_relations().len(),
                "Built list query descriptor"
            ),
            Err(e) => debug!(code = %e.code, error = %e.message, "Rejected list parameters"),
        }
        result
    }

    fn build(&self, params: &RawListParams) -> QueryResult<QueryDescriptor> {
        let config = self.config.as_ref();

        let filter = self.filters.parse_filters(&params.filter, config)?;
        let order = self.sorting.parse_sorting(params.sort.as_deref(), config)?;
        let relations = self.relations.parse_relations(&params.relations);
        let count_relations = self.relations.parse_counts(&params.counts);
        let window = self.pagination.parse_pagination(
            params.paginate.as_ref(),
            params.page.as_ref(),
            config,
        )?;

        Ok(QueryDescriptor {
            filter,
            order: Some(order),
            relations,
            count_relations,
            window,
        })
    }
}
