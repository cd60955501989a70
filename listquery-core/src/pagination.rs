//! Page-based pagination: page size and page number into a take/skip window.
//!
//! ```rust
//! use listquery_core::pagination::PageWindow;
//!
//! // Page 3 with 25 items per page
//! let window = PageWindow::page(3, 25).unwrap();
//! assert_eq!(window.skip, 50);
//! assert_eq!(window.take, 25);
//! assert_eq!(window.to_sql(), "LIMIT 25 OFFSET 50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use tracing::debug;

use crate::config::AllowListConfig;
use crate::error::{QueryError, QueryResult};

/// Page number used when the request does not carry one.
pub const DEFAULT_PAGE: u64 = 1;

/// An unvalidated number as it arrives from a query string or JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// Integer input.
    Int(i64),
    /// Float input; only whole values are accepted.
    Float(f64),
    /// Textual input, e.g. from a query string.
    Text(String),
}

impl RawNumber {
    /// Check if the value carries no content (an empty string).
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Coerce to a non-negative whole number.
    ///
    /// `parameter` names the request parameter for error reporting.
    pub fn to_u64(&self, parameter: &str) -> QueryResult<u64> {
        let invalid = |message: &str| {
            QueryError::invalid_pagination(parameter, self.to_string(), message)
        };

        match self {
            Self::Int(n) => u64::try_from(*n).map_err(|_| invalid("must not be negative")),
            Self::Float(f) => {
                if !f.is_finite() || f.fract() != 0.0 {
                    return Err(invalid("must be a whole number"));
                }
                if *f < 0.0 {
                    return Err(invalid("must not be negative"));
                }
                // u64::MAX as f64 rounds up to 2^64
                if *f >= u64::MAX as f64 {
                    return Err(invalid("is too large"));
                }
                Ok(*f as u64)
            }
            Self::Text(s) => {
                let s = s.trim();
                if let Some(digits) = s.strip_prefix('-') {
                    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                        return Err(invalid("must not be negative"));
                    }
                }
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid("must be a whole number"));
                }
                s.parse::<u64>().map_err(|_| invalid("is too large"))
            }
        }
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RawNumber {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for RawNumber {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for RawNumber {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// The slice of an ordered result set to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageWindow {
    /// Maximum number of records to take.
    pub take: u64,
    /// Number of records to skip.
    pub skip: u64,
}

impl PageWindow {
    /// Window for a 1-indexed page. Returns `None` when page is 0 or the offset overflows.
    pub fn page(page: u64, page_size: u64) -> Option<Self> {
        let skip = page.checked_sub(1)?.checked_mul(page_size)?;
        Some(Self {
            take: page_size,
            skip,
        })
    }

    /// Generate SQL LIMIT/OFFSET clause.
    pub fn to_sql(&self) -> String {
        let mut sql = String::with_capacity(48);
        self.write_sql(&mut sql);
        sql
    }

    /// Write SQL LIMIT/OFFSET clause directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        let _ = write!(buffer, "LIMIT {}", self.take);
        if self.skip > 0 {
            let _ = write!(buffer, " OFFSET {}", self.skip);
        }
    }
}

/// Converts page size and page number into a [`PageWindow`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationCalculator;

impl PaginationCalculator {
    /// Create a new calculator.
    pub fn new() -> Self {
        Self
    }

    /// Compute the window.
    ///
    /// Without a page size the listing is unpaginated and the page number is
    /// ignored. Page numbers below 1 are rejected rather than clamped.
    pub fn calculate(
        &self,
        paginate: Option<&RawNumber>,
        page: Option<&RawNumber>,
        config: &AllowListConfig,
    ) -> QueryResult<Option<PageWindow>> {
        let Some(paginate) = paginate.filter(|p| !p.is_blank()) else {
            return Ok(None);
        };

        let page_size = paginate.to_u64("paginate")?;
        if page_size == 0 {
            return Err(QueryError::invalid_pagination(
                "paginate",
                paginate.to_string(),
                "must be at least 1",
            ));
        }
        if let Some(max) = config.max_page_size() {
            if page_size > max {
                debug!(page_size, max, "Rejected page size above maximum");
                return Err(QueryError::invalid_pagination(
                    "paginate",
                    paginate.to_string(),
                    format!("must not exceed {}", max),
                ));
            }
        }

        let page_number = match page.filter(|p| !p.is_blank()) {
            Some(raw) => {
                let n = raw.to_u64("page")?;
                if n == 0 {
                    return Err(QueryError::invalid_pagination(
                        "page",
                        raw.to_string(),
                        "pages start at 1",
                    ));
                }
                n
            }
            None => DEFAULT_PAGE,
        };

        let window = PageWindow::page(page_number, page_size).ok_or_else(|| {
            QueryError::invalid_pagination("page", page_number.to_string(), "offset is too large")
        })?;
        debug!(take = window.take, skip = window.skip, "Computed page window");
        Ok(Some(window))
    }
}
