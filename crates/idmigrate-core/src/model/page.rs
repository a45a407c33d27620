//! Paginated collection model
//!
//! A source collection is read as a sequence of `limit`/`offset` pages. The
//! cursor is a plain value: it can be inspected, cloned, or rebuilt at any
//! offset to restart from a given page.

/// Largest page the source API serves
pub const MAX_PAGE_LIMIT: u32 = 500;

/// One page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    /// The first page with the given limit
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// One page of records
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    /// Collection size when the source reports it
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total_count: Option<u64>) -> Self {
        Self {
            records,
            total_count,
        }
    }
}

/// Position within a paginated collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    limit: u32,
    next_offset: u64,
    follow: bool,
    max_pages: Option<u32>,
    pages_fetched: u32,
    exhausted: bool,
}

impl PageCursor {
    /// Start a cursor at offset 0
    ///
    /// With `follow = false` the cursor yields exactly one page.
    pub fn new(limit: u32, follow: bool, max_pages: Option<u32>) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            next_offset: 0,
            follow,
            max_pages,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Restart the sequence at a given offset
    pub fn resume_at(mut self, offset: u64) -> Self {
        self.next_offset = offset;
        self.exhausted = false;
        self
    }

    /// The next page to request, or `None` once the collection is done
    pub fn next_request(&self) -> Option<PageRequest> {
        if self.exhausted {
            return None;
        }
        if self.pages_fetched > 0 && !self.follow {
            return None;
        }
        if let Some(max) = self.max_pages {
            if self.pages_fetched >= max {
                return None;
            }
        }
        Some(PageRequest {
            limit: self.limit,
            offset: self.next_offset,
        })
    }

    /// Record a received page
    pub fn advance(&mut self, received: usize, total_count: Option<u64>) {
        self.pages_fetched += 1;
        self.next_offset += received as u64;

        let short_page = received < self.limit as usize;
        let reached_total = total_count.is_some_and(|total| self.next_offset >= total);
        if short_page || reached_total || !self.follow {
            self.exhausted = true;
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// True when more pages may exist but `max_pages` stopped the cursor
    pub fn truncated(&self) -> bool {
        !self.exhausted && self.max_pages.is_some_and(|max| self.pages_fetched >= max)
    }
}
