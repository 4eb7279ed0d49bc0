//! Request path parsing and the page selection decision table.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::contract::{PageRecord, SitemapDataset};
use crate::error::{InvalidPage, SitemapError};

fn sitemap_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^/sitemap(?:-(\d+))?\.xml$").expect("static sitemap regex"))
}

/// Extracts the requested page from a path like `/sitemap.xml` or `/sitemap-02.xml`.
///
/// `0` means no specific page. A query string is ignored.
pub fn parse_request_path(path: &str) -> Result<usize, SitemapError> {
    let path_only = path.split('?').next().unwrap_or(path);
    let caps = sitemap_path_regex()
        .captures(path_only)
        .ok_or_else(|| SitemapError::InvalidRequestPath(path.to_string()))?;

    match caps.get(1) {
        None => Ok(0),
        Some(digits) => digits
            .as_str()
            .parse::<usize>()
            .map_err(|_| SitemapError::InvalidRequestPath(path.to_string())),
    }
}

/// What to render for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    /// A `<urlset>` of the entries in this range of the sorted dataset.
    Sitemap(Range<usize>),
    /// A `<sitemapindex>` listing this many sub-sitemaps.
    Index { page_count: usize },
}

/// Number of sitemap pages needed for `total` entries at `max` per page.
pub fn page_count(total: usize, max: usize) -> usize {
    if max == 0 {
        return 1;
    }
    total.div_ceil(max).max(1)
}

/// Decides what a request for `page` renders, given `total` entries and a page limit of `max`.
///
/// Pages after the first start one entry early, so each repeats the last entry of
/// the page before it.
pub fn select_page(total: usize, max: usize, page: usize) -> Result<PageSelection, InvalidPage> {
    if max == 0 {
        return if page == 0 {
            Ok(PageSelection::Sitemap(0..total))
        } else {
            Err(InvalidPage::PagingDisabled { page })
        };
    }

    if total <= max {
        return match page {
            0 | 1 => Ok(PageSelection::Sitemap(0..total)),
            _ => Err(InvalidPage::OutOfRange { page, page_count: 1 }),
        };
    }

    let pages = page_count(total, max);
    match page {
        0 => Ok(PageSelection::Index { page_count: pages }),
        p if p <= pages => {
            let start = ((p - 1) * max).saturating_sub(1);
            let end = (start + max).min(total);
            Ok(PageSelection::Sitemap(start..end))
        }
        p => Err(InvalidPage::OutOfRange { page: p, page_count: pages }),
    }
}

/// The dataset entries that fall inside `range`, in key order.
pub fn slice_dataset<'a>(
    data: &'a SitemapDataset,
    range: Range<usize>,
) -> impl Iterator<Item = (&'a String, &'a Vec<PageRecord>)> + 'a {
    data.iter().skip(range.start).take(range.len())
}
