//! Derived views over the saved collection: search filter and pagination.
//!
//! Everything here is a pure function of the collection and the view state, so
//! views are recomputed on demand instead of being kept in sync.

use crate::model::SavedForecast;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Case-insensitive substring match on name, country, description and the
/// rounded temperature. A blank term returns everything in original order.
pub fn search<'a>(items: &'a [SavedForecast], term: &str) -> Vec<&'a SavedForecast> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items.iter().filter(|item| matches_term(item, &needle)).collect()
}

fn matches_term(item: &SavedForecast, needle: &str) -> bool {
    let w = &item.weather;
    w.name.to_lowercase().contains(needle)
        || w.country.to_lowercase().contains(needle)
        || w.description.to_lowercase().contains(needle)
        || w.rounded_temp().to_string().contains(needle)
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// One page of a filtered sequence. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub items: Vec<&'a SavedForecast>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `filtered` into the requested page. A page beyond the last one
/// (typically after the filter narrowed) falls back to page 1.
pub fn paginate<'a>(filtered: &[&'a SavedForecast], page: usize, page_size: usize) -> Page<'a> {
    let page_size = page_size.max(1);
    let total = total_pages(filtered.len(), page_size);
    let page = if page == 0 || page > total { 1 } else { page };

    let items = filtered
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .copied()
        .collect();

    Page {
        items,
        page,
        total_pages: total,
        total_items: filtered.len(),
    }
}

/// Search term and current page, as held by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub term: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            term: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Compute the visible page. If the stored page no longer exists it is
    /// reset to 1 so the next render stays consistent.
    pub fn render<'a>(&mut self, items: &'a [SavedForecast]) -> Page<'a> {
        let filtered = search(items, &self.term);
        let page = paginate(&filtered, self.page, self.page_size);
        self.page = page.page;
        page
    }
}
