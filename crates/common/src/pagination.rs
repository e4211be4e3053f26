//! Pagination and sort query helpers for list endpoints

use serde::Deserialize;

/// Default page size for list endpoints
const DEFAULT_LIMIT: i64 = 25;

/// Maximum page size for list endpoints
const MAX_LIMIT: i64 = 100;

/// Sort direction for a single sort key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One field of a sort specification, e.g. `created_at:desc`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: Direction,
}

impl SortKey {
    /// Parse a single `field` or `field:direction` token
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let (field, direction) = match token.split_once(':') {
            Some((field, dir)) if dir.eq_ignore_ascii_case("desc") => (field, Direction::Desc),
            Some((field, _)) => (field, Direction::Asc),
            None => (token, Direction::Asc),
        };
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        Some(SortKey {
            field: field.to_string(),
            direction,
        })
    }
}

/// Resolved paging parameters handed to the repository layer
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
    pub sort: Vec<SortKey>,
}

/// Pagination query parameters for list endpoints
///
/// Usable directly as `Query<Pagination>` in handlers. Sort grammar is a
/// comma-separated list of `field` or `field:desc` tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl Pagination {
    /// Get the offset, defaulting to 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Get the limit, defaulting to 25, capped at 100
    pub fn limit(&self) -> i64 {
        self.limit_with_max(MAX_LIMIT)
    }

    /// Get the limit with a caller-supplied upper bound (see `Config::page_limit_max`)
    pub fn limit_with_max(&self, max: i64) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max.max(1))
    }

    /// Parse the sort parameter into ordered sort keys, dropping empty tokens
    pub fn sort_keys(&self) -> Vec<SortKey> {
        self.sort
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(SortKey::parse)
            .collect()
    }

    /// Resolve into a [`PageRequest`] for the repository layer
    pub fn page(&self) -> PageRequest {
        PageRequest {
            offset: self.offset(),
            limit: self.limit(),
            sort: self.sort_keys(),
        }
    }
}
