//! Page-number pagination.

use serde::Serialize;

/// Errors from invalid pagination parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Pages are numbered from 1.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one entry.
    #[error("perpage must be at least 1")]
    ZeroPerPage,
}

/// Which slice of a listing to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request from optional client parameters.
    ///
    /// `per_page` defaults to `default_per_page` and is capped at
    /// `max_per_page`.
    ///
    /// # Errors
    ///
    /// Returns an error if either parameter is zero.
    pub fn new(
        page: Option<u32>,
        per_page: Option<u32>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Result<Self, PageError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageError::ZeroPage);
        }
        let per_page = per_page.unwrap_or(default_per_page);
        if per_page == 0 {
            return Err(PageError::ZeroPerPage);
        }
        Ok(Self {
            page,
            per_page: per_page.min(max_per_page.max(1)),
        })
    }

    /// The first page with `per_page` entries.
    #[must_use]
    pub const fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Entries per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// One page of a listing.
///
/// A page past the end is not an error: it has the real `count` and no
/// `results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total number of entries across all pages.
    pub count: u64,
    /// Next page number, if there is one.
    pub next: Option<u32>,
    /// Previous page number, if there is one.
    pub previous: Option<u32>,
    /// Entries on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble a page from a fetched slice and the total count.
    #[must_use]
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        let seen = u64::from(request.page) * u64::from(request.per_page);
        Self {
            count,
            next: (seen < count).then(|| request.page + 1),
            previous: (request.page > 1).then(|| request.page - 1),
            results,
        }
    }

    /// Paginate an already-materialized listing.
    #[must_use]
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let count = all.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let results = all
            .into_iter()
            .skip(skip)
            .take(request.per_page as usize)
            .collect();
        Self::new(results, count, request)
    }

    /// Transform every entry, keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
