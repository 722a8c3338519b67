//! Offset pagination shared by every listing operation.
//!
//! Callers hand in loosely typed [`PaginationParams`] (straight off the query
//! string); [`PaginationParams::resolve`] applies the defaults, checks the
//! bounds and parses the sort field against the entity's whitelist.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `"asc"` in any case selects ascending; every other token descending.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// A sortable column of some entity, addressed by its camelCase API name.
pub trait SortField: Sized + Copy {
    fn parse(name: &str) -> Option<Self>;
    fn column(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PaginationParams {
    pub fn resolve<S: SortField>(&self) -> Result<PageRequest<S>> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err(Error::InvalidPagination(format!(
                "page must be at least 1, got {}",
                page
            )));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidPagination(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            Error::InvalidPagination(format!("page {} is out of range", page))
        })?;
        let sort_name = self.sort_by.as_deref().unwrap_or(DEFAULT_SORT_FIELD);
        let sort_by = S::parse(sort_name).ok_or_else(|| {
            Error::InvalidPagination(format!("cannot sort by '{}'", sort_name))
        })?;
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::from_token)
            .unwrap_or_default();

        Ok(PageRequest {
            page,
            limit,
            sort_by,
            order,
            offset,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<S> {
    pub page: i64,
    pub limit: i64,
    pub sort_by: S,
    pub order: SortOrder,
    /// Checked against overflow in [`PaginationParams::resolve`].
    offset: i64,
}

impl<S> PageRequest<S> {
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new<S>(data: Vec<T>, total: i64, request: &PageRequest<S>) -> Self {
        Self {
            data,
            meta: PaginationMeta::new(total, request.page, request.limit),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `ILIKE`.
pub fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
