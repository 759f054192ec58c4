//! Page window computation for the paginated browsing views.

/// Maximum number of page links shown at once.
const MAX_VISIBLE_PAGES: u32 = 9;

/// Turns a total count, current page, and page size into a bounded window of
/// visible page numbers.
///
/// The window holds up to nine entries centered on the current page, clamped
/// to `[1, total_pages]`; the returned range is inclusive of its end bound
/// on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    /// Total number of items across all pages.
    pub total_count: u64,
    /// Current 1-based page.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
}

impl PaginationController {
    /// Build a controller starting on page 1.
    pub fn new(total_count: u64, page_size: u32) -> Self {
        Self {
            total_count,
            page: 1,
            page_size,
        }
    }

    /// Number of full pages the item count fills.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        (self.total_count / u64::from(self.page_size)) as u32
    }

    /// Visible page numbers: a window of up to nine entries centered on the
    /// current page. When the window underflows page 1 it shifts right by
    /// the deficit, and symmetrically shifts left past the last page; the
    /// start is always floored at 1.
    pub fn visible_pages(&self) -> Vec<u32> {
        let total_pages = self.total_pages();
        if total_pages == 0 {
            return Vec::new();
        }

        let half = i64::from(MAX_VISIBLE_PAGES / 2);
        let page = i64::from(self.page);
        let mut start = page - half;
        let mut end = page + half;

        if start < 1 {
            end += 1 - start;
            start = 1;
        }
        if end > i64::from(total_pages) {
            start -= end - i64::from(total_pages);
            end = i64::from(total_pages);
        }
        start = start.max(1);

        (start..=end).map(|page| page as u32).collect()
    }

    /// How many items are visible up to and including the current page.
    pub fn visible_items_count(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.page_size)).min(self.total_count)
    }

    /// Advance one page; no-op on the last page.
    pub fn next_page(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
        }
    }

    /// Go back one page; no-op on the first page.
    pub fn previous_page(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    /// Jump to `page` without bounds adjustment; the window computation
    /// clamps overshoot.
    pub fn go_to_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}
