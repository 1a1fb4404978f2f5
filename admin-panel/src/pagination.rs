use crate::config::SIBLINGS_COUNT;

/// One slot in the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page {
        number: u64,
        is_current: bool,
        disabled: bool,
    },
    /// Stands in for the skipped page numbers between the ends and the siblings window.
    Gap,
}

/// The page numbers to offer for a record count, purely numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationModel {
    total_count: u64,
    page_size: u64,
    current_page: u64,
    siblings_count: u64,
}

impl PaginationModel {
    pub fn new(total_count: u64, page_size: u64, current_page: u64) -> Self {
        Self {
            total_count,
            page_size,
            current_page,
            siblings_count: SIBLINGS_COUNT,
        }
    }

    pub fn with_siblings_count(mut self, siblings_count: u64) -> Self {
        self.siblings_count = siblings_count;
        self
    }

    /// `ceil(total_count / page_size)`, zero when there is nothing to page through.
    pub fn last_page(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }

    /// The requested page, clamped into `1..=last_page`.
    pub fn current_page(&self) -> u64 {
        self.current_page.clamp(1, self.last_page().max(1))
    }

    /// First page, a gap, the siblings window around the current page, a gap, last page.
    ///
    /// Gaps only appear when at least one number is skipped. With no records this is a single disabled page.
    pub fn items(&self) -> Vec<PageItem> {
        let last_page = self.last_page();
        if last_page == 0 {
            return vec![PageItem::Page {
                number: 1,
                is_current: true,
                disabled: true,
            }];
        }

        let current = self.current_page();
        let page = |number: u64| PageItem::Page {
            number,
            is_current: number == current,
            disabled: number == current,
        };

        let window_start = current.saturating_sub(self.siblings_count).max(1);
        let window_end = current.saturating_add(self.siblings_count).min(last_page);

        let mut items = Vec::new();
        if window_start > 1 {
            items.push(page(1));
            if window_start > 2 {
                items.push(PageItem::Gap);
            }
        }
        items.extend((window_start..=window_end).map(page));
        if window_end < last_page {
            if window_end + 1 < last_page {
                items.push(PageItem::Gap);
            }
            items.push(page(last_page));
        }
        items
    }

    /// The page numbers on offer, gaps dropped.
    pub fn page_numbers(&self) -> Vec<u64> {
        self.items()
            .into_iter()
            .filter_map(|item| match item {
                PageItem::Page { number, .. } => Some(number),
                PageItem::Gap => None,
            })
            .collect()
    }

    /// 1-based positions of the first and last record on the current page, `(0, 0)` when empty.
    pub fn record_range(&self) -> (u64, u64) {
        if self.last_page() == 0 {
            return (0, 0);
        }
        let current = self.current_page();
        let first = (current - 1).saturating_mul(self.page_size) + 1;
        let last = current.saturating_mul(self.page_size).min(self.total_count);
        (first, last)
    }
}
