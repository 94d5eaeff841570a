//! Offset pagination over any sea-orm `Select`.
//!
//! Callers build (and order, and scope) the query; [`paginate`] counts the
//! full result set and fetches one window of it.

use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QuerySelect, Select};
use serde::{Deserialize, Serialize};

use crate::ResultEngine;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

/// A normalized page request: `page` is 1-based and `per_page` is within
/// `1..=MAX_PER_PAGE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Build a request from raw (untrusted) values.
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One window of a result set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages: total_items.div_ceil(request.per_page),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        })
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Count `select` and fetch the window described by `request`.
///
/// A page past the end yields no items but still reports the totals.
pub async fn paginate<'db, E, C>(
    select: Select<E>,
    db: &'db C,
    request: PageRequest,
) -> ResultEngine<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'db,
    C: ConnectionTrait,
{
    let total_items = select.clone().count(db).await?;
    if request.offset() >= total_items {
        return Ok(Page::new(Vec::new(), request, total_items));
    }

    let items = select
        .offset(request.offset())
        .limit(request.per_page)
        .all(db)
        .await?;
    Ok(Page::new(items, request, total_items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_normalizes_out_of_range_values() {
        let request = PageRequest::new(Some(0), Some(0));
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 1);

        let request = PageRequest::new(None, Some(10_000));
        assert_eq!(request.per_page(), MAX_PER_PAGE);
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(Some(1), Some(20)).offset(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(Some(1), Some(10));
        assert_eq!(Page::<()>::new(Vec::new(), request, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(Vec::new(), request, 10).total_pages, 1);
        assert_eq!(Page::<()>::new(Vec::new(), request, 11).total_pages, 2);
    }

    #[test]
    fn map_keeps_window_metadata() {
        let request = PageRequest::new(Some(2), Some(2));
        let page = Page::new(vec![1, 2], request, 5).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
    }
}
