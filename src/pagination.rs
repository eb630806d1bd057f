//! Common functionality for paging list views.

use serde::Deserialize;

/// The config that controls how to display pages of data.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of page links to show in the pagination strip.
    pub max_page_links: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_links: 5,
        }
    }
}

/// The paging query parameters accepted by list views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub per_page: Option<u64>,
}

/// The resolved paging facts for one rendered list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// The total number of rows across all pages.
    pub total: u64,
    /// The total number of pages.
    pub pages: u64,
    /// The 1-based page being displayed, clamped into range.
    pub current_page: u64,
    /// The number of rows per page.
    pub per_page: u64,
}

impl PageInfo {
    /// Resolve the paging facts for `total` rows.
    ///
    /// A requested page past the end is clamped to the last page, and page 0
    /// to the first. An empty data set still has one (empty) page.
    pub fn new(total: u64, query: &PageQuery, config: &PaginationConfig) -> Self {
        let per_page = query.per_page.unwrap_or(config.default_page_size).max(1);
        let pages = total.div_ceil(per_page).max(1);
        let current_page = query.page.unwrap_or(config.default_page).clamp(1, pages);

        Self {
            total,
            pages,
            current_page,
            per_page,
        }
    }

    /// The number of rows to skip to reach the current page.
    pub fn offset(&self) -> u64 {
        (self.current_page - 1) * self.per_page
    }
}

/// One element of the pagination strip under a list view.
#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    /// A link to another page.
    Page(u64),
    /// The page being displayed.
    CurrPage(u64),
    /// A gap between page links.
    Ellipsis,
    /// A link to the next page.
    NextButton(u64),
    /// A link to the previous page.
    BackButton(u64),
}

/// Build the pagination strip for the current page.
///
/// At most `max_page_links` numbered links are shown, centred on the current
/// page, with the first and last page always reachable through ellipsis
/// links.
pub fn create_pagination_indicators(info: &PageInfo, max_page_links: u64) -> Vec<PaginationIndicator> {
    let PageInfo {
        pages, current_page, ..
    } = *info;

    let map_page = |page| {
        if page == current_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let half_window = max_page_links / 2;
    let mut indicators: Vec<PaginationIndicator> = if pages <= max_page_links {
        (1..=pages).map(map_page).collect()
    } else if current_page <= half_window {
        (1..=max_page_links).map(map_page).collect()
    } else if current_page > pages - half_window {
        ((pages - max_page_links + 1)..=pages).map(map_page).collect()
    } else {
        ((current_page - half_window)..=(current_page + half_window))
            .map(map_page)
            .collect()
    };

    if pages > max_page_links {
        if current_page > half_window + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if current_page < pages - half_window {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(pages));
        }
    }

    if current_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(current_page - 1));
    }

    if current_page < pages {
        indicators.push(PaginationIndicator::NextButton(current_page + 1));
    }

    indicators
}
