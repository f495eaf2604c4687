//! # Paginator
//!
//! Slices an ordered, already-filtered sequence into fixed-size pages and
//! carries enough metadata to render next/previous controls. Pure function
//! of its inputs; the store is never consulted here.

use crate::error::{AppError, Result};

/// System-wide page size for every listing view.
pub const PAGE_LIMIT: usize = 10;

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// At most `page_size` items, in the order the sequence arrived.
    pub items: Vec<T>,
    /// 1-based page number after clamping.
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Converts the page items while keeping the paging metadata intact.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

/// Parses the `page` query parameter. Absent means page 1; anything that is
/// not a positive integer is an `InvalidPage` error, which callers recover
/// from by falling back to page 1.
pub fn parse_page(raw: Option<&str>) -> Result<usize> {
    match raw {
        None => Ok(1),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(AppError::InvalidPage(s.to_string())),
        },
    }
}

/// Slices `items` into the requested page. A request past the end clamps to
/// the last page, and below the start to the first; an empty sequence yields
/// a single empty page 1. The last page holds the remainder.
pub fn paginate<T>(items: Vec<T>, requested: usize, page_size: usize) -> Page<T> {
    assert!(page_size > 0, "page_size must be positive");

    let total_items = items.len();
    let total_pages = std::cmp::max(1, total_items.div_ceil(page_size));
    let number = requested.clamp(1, total_pages);

    let start = (number - 1) * page_size;
    let page_items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    Page {
        items: page_items,
        number,
        total_pages,
        total_items,
    }
}
