//! Query parameters and pagination utilities
//!
//! List endpoints accept:
//!
//! ```text
//! GET /api/clients?page=2&limit=10
//! GET /api/expenses?category=rent&sort=amount:desc
//! GET /api/vendors?search=acme&includeDeleted=true
//! GET /api/assets?populate=false
//! ```
//!
//! Any parameter that is not one of the reserved keys is an exact-match
//! filter on a field of the resource.

use crate::config::PaginationConfig;
use crate::core::entity::Resource;
use crate::core::error::BooksError;
use serde::Serialize;
use std::collections::HashMap;

const RESERVED: &[&str] = &["page", "limit", "search", "sort", "includeDeleted", "populate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort field and direction
///
/// # Format
/// - `field:asc` or `field` (ascending)
/// - `field:desc` (descending)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: "createdAt".to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn parse(raw: &str) -> Result<Self, BooksError> {
        let (field, direction) = match raw.split_once(':') {
            Some((field, "asc")) => (field, SortDirection::Asc),
            Some((field, "desc")) => (field, SortDirection::Desc),
            Some((_, other)) => {
                return Err(BooksError::bad_request(format!(
                    "Invalid sort direction '{}', expected 'asc' or 'desc'",
                    other
                )));
            }
            None => (raw, SortDirection::Asc),
        };

        if field.is_empty() {
            return Err(BooksError::bad_request("Sort field must not be empty"));
        }

        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }
}

/// Parsed list query, shared by every storage backend
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Case-insensitive substring matched against the resource's search fields
    pub search: Option<String>,

    /// Exact-match filters, sorted by field name
    pub filters: Vec<(String, String)>,

    pub sort: SortSpec,

    /// Include soft-deleted records
    pub include_deleted: bool,

    /// Embed referenced documents in the response
    pub populate: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PaginationConfig::default().default_limit,
            search: None,
            filters: Vec::new(),
            sort: SortSpec::default(),
            include_deleted: false,
            populate: true,
        }
    }
}

impl ListQuery {
    /// Build a query from raw query-string pairs, validating field names against `T`
    pub fn from_params<T: Resource>(
        params: &HashMap<String, String>,
        pagination: &PaginationConfig,
    ) -> Result<Self, BooksError> {
        let page = match params.get("page") {
            Some(raw) => parse_number("page", raw)?.max(1),
            None => 1,
        };

        let limit = match params.get("limit") {
            Some(raw) => parse_number("limit", raw)?,
            None => pagination.default_limit,
        }
        .clamp(1, pagination.max_limit.max(1));

        let search = params
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let sort = match params.get("sort") {
            Some(raw) => {
                let sort = SortSpec::parse(raw)?;
                if !T::is_queryable(&sort.field) {
                    return Err(unknown_field::<T>(&sort.field));
                }
                sort
            }
            None => SortSpec::default(),
        };

        let include_deleted = match params.get("includeDeleted") {
            Some(raw) => parse_bool("includeDeleted", raw)?,
            None => false,
        };

        let populate = match params.get("populate") {
            Some(raw) => parse_bool("populate", raw)?,
            None => true,
        };

        let mut filters = Vec::new();
        for (key, value) in params {
            if RESERVED.contains(&key.as_str()) {
                continue;
            }
            if !T::is_queryable(key) {
                return Err(unknown_field::<T>(key));
            }
            filters.push((key.clone(), value.clone()));
        }
        filters.sort();

        Ok(Self {
            page,
            limit,
            search,
            filters,
            sort,
            include_deleted,
            populate,
        })
    }

    /// Number of records to skip, saturating for absurd page numbers
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Flags accepted by single-record endpoints: `populate` (default true)
/// and, for deletes, `hard` (default false)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    pub populate: bool,
    pub hard: bool,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            populate: true,
            hard: false,
        }
    }
}

impl ItemQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, BooksError> {
        let mut query = Self::default();
        if let Some(raw) = params.get("populate") {
            query.populate = parse_bool("populate", raw)?;
        }
        if let Some(raw) = params.get("hard") {
            query.hard = parse_bool("hard", raw)?;
        }
        Ok(query)
    }
}

fn parse_number(name: &str, raw: &str) -> Result<usize, BooksError> {
    raw.trim().parse::<usize>().map_err(|_| {
        BooksError::bad_request(format!("'{}' must be a positive integer, got '{}'", name, raw))
    })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, BooksError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(BooksError::bad_request(format!(
            "'{}' must be true or false, got '{}'",
            name, raw
        ))),
    }
}

fn unknown_field<T: Resource>(field: &str) -> BooksError {
    BooksError::UnknownField {
        resource: T::resource_name_singular().to_string(),
        field: field.to_string(),
    }
}

/// One page of records plus the total matching count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    pub total_pages: usize,

    pub has_next: bool,

    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };
        let start = (page - 1).saturating_mul(limit);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}
