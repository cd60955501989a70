//! Allow-list configuration, built in code or loaded from `listquery.toml`.
//!
//! ```toml
//! [resources.notifications]
//! filters = ["read", { name = "created_at", operators = ["gte", "lte"] }]
//! sorts = ["created_at", "updated_at"]
//! default_sort = "-created_at"
//! max_page_size = 100
//! ```

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::filter::{FieldName, FieldSpec, FilterOperator};
use crate::types::{DEFAULT_ORDER, OrderByField, is_identifier, normalize_column};

/// Per-resource allow-lists and list defaults.
///
/// Immutable once built; share it behind an `Arc` across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AllowListConfig {
    filters: IndexMap<FieldName, FieldSpec>,
    sorts: IndexSet<FieldName>,
    default_order: OrderByField,
    max_page_size: Option<u64>,
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            filters: IndexMap::new(),
            sorts: IndexSet::new(),
            default_order: DEFAULT_ORDER,
            max_page_size: None,
        }
    }
}

impl AllowListConfig {
    /// Start building a configuration.
    pub fn builder() -> AllowListConfigBuilder {
        AllowListConfigBuilder::default()
    }

    /// Filterable fields by name.
    pub fn allowed_filters(&self) -> &IndexMap<FieldName, FieldSpec> {
        &self.filters
    }

    /// Sortable columns (snake_case).
    pub fn allowed_sorts(&self) -> &IndexSet<FieldName> {
        &self.sorts
    }

    /// The spec for a filterable field.
    pub fn filter_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.filters.get(name)
    }

    /// Names of the filterable fields.
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|k| k.as_str())
    }

    /// Check whether a normalized column is sortable.
    pub fn allows_sort(&self, column: &str) -> bool {
        self.sorts.contains(column)
    }

    /// Names of the sortable columns.
    pub fn sort_names(&self) -> impl Iterator<Item = &str> {
        self.sorts.iter().map(|k| k.as_str())
    }

    /// Order applied when a request carries no sort token.
    pub fn default_order(&self) -> &OrderByField {
        &self.default_order
    }

    /// Largest accepted page size, if bounded.
    pub fn max_page_size(&self) -> Option<u64> {
        self.max_page_size
    }
}

/// Fluent builder for [`AllowListConfig`].
#[derive(Debug, Clone, Default)]
pub struct AllowListConfigBuilder {
    config: AllowListConfig,
}

impl AllowListConfigBuilder {
    /// Allow filtering on a field.
    pub fn filter(mut self, spec: impl Into<FieldSpec>) -> Self {
        let spec = spec.into();
        self.config.filters.insert(spec.name.clone(), spec);
        self
    }

    /// Allow filtering on several fields.
    pub fn filters<I, S>(self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        specs.into_iter().fold(self, |builder, spec| builder.filter(spec))
    }

    /// Allow sorting on a column. The name is normalized to snake_case.
    pub fn sort(mut self, column: impl AsRef<str>) -> Self {
        self.config
            .sorts
            .insert(FieldName::from(normalize_column(column.as_ref())));
        self
    }

    /// Allow sorting on several columns.
    pub fn sorts<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        columns.into_iter().fold(self, |builder, column| builder.sort(column))
    }

    /// Override the order used when no sort token is supplied.
    pub fn default_order(mut self, order: OrderByField) -> Self {
        self.config.default_order = order;
        self
    }

    /// Reject page sizes above `max`.
    pub fn max_page_size(mut self, max: u64) -> Self {
        self.config.max_page_size = Some(max);
        self
    }

    /// Finish building.
    pub fn build(self) -> AllowListConfig {
        self.config
    }
}

/// Contents of a `listquery.toml` file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListQueryConfig {
    /// Per-resource list settings, keyed by resource name.
    #[serde(default)]
    pub resources: IndexMap<String, ResourceConfig>,
}

impl ListQueryConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Toml { source: e })
    }

    /// Validated allow-lists for one resource.
    pub fn resource(&self, name: &str) -> ConfigResult<AllowListConfig> {
        let resource = self
            .resources
            .get(name)
            .ok_or_else(|| ConfigError::UnknownResource {
                name: name.to_string(),
            })?;
        resource.to_allow_list(name)
    }

    /// Validated allow-lists for every resource.
    pub fn allow_lists(&self) -> ConfigResult<IndexMap<String, AllowListConfig>> {
        self.resources
            .iter()
            .map(|(name, resource)| Ok((name.clone(), resource.to_allow_list(name)?)))
            .collect()
    }
}

/// List settings for one resource.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Filterable fields.
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    /// Sortable columns.
    #[serde(default)]
    pub sorts: Vec<String>,
    /// Sort token used when a request has none (e.g. `"-created_at"`).
    #[serde(default)]
    pub default_sort: Option<String>,
    /// Largest accepted page size.
    #[serde(default)]
    pub max_page_size: Option<u64>,
}

/// A filterable field: a bare name accepts every operator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterEntry {
    /// Field accepting every operator.
    Name(String),
    /// Field restricted to the listed operators.
    Detailed {
        /// Field name.
        name: String,
        /// Accepted operator tokens.
        operators: Vec<String>,
    },
}

impl FilterEntry {
    /// The field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }
}

impl ResourceConfig {
    /// Validate and convert into an [`AllowListConfig`].
    pub fn to_allow_list(&self, resource: &str) -> ConfigResult<AllowListConfig> {
        let mut builder = AllowListConfig::builder();

        for entry in &self.filters {
            let name = entry.name();
            check_identifier(resource, name)?;
            let spec = match entry {
                FilterEntry::Name(_) => FieldSpec::new(name),
                FilterEntry::Detailed { operators, .. } => {
                    if operators.is_empty() {
                        return Err(ConfigError::NoOperators {
                            resource: resource.to_string(),
                            field: name.to_string(),
                        });
                    }
                    let ops = operators
                        .iter()
                        .map(|token| {
                            token.parse::<FilterOperator>().map_err(|_| {
                                ConfigError::UnknownOperator {
                                    resource: resource.to_string(),
                                    field: name.to_string(),
                                    operator: token.clone(),
                                }
                            })
                        })
                        .collect::<ConfigResult<Vec<_>>>()?;
                    FieldSpec::new(name).operators(ops)
                }
            };
            builder = builder.filter(spec);
        }

        for column in &self.sorts {
            check_identifier(resource, column)?;
            builder = builder.sort(column);
        }

        if let Some(token) = &self.default_sort {
            let order =
                OrderByField::from_token(token).ok_or_else(|| ConfigError::InvalidDefaultSort {
                    resource: resource.to_string(),
                    token: token.clone(),
                })?;
            builder = builder.default_order(order);
        }

        match self.max_page_size {
            Some(0) => {
                return Err(ConfigError::InvalidPageSize {
                    resource: resource.to_string(),
                });
            }
            Some(max) => builder = builder.max_page_size(max),
            None => {}
        }

        Ok(builder.build())
    }
}

fn check_identifier(resource: &str, name: &str) -> ConfigResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidFieldName {
            resource: resource.to_string(),
            name: name.to_string(),
        })
    }
}
