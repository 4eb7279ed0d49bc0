//! High-level pipeline: aggregate → finalise URLs → select page → serialise.
//!
//! [`generate_sitemap`] runs one request end to end against any
//! [`PageRecordSource`]. It is used by the HTTP server, the CLI and the
//! integration tests.
//!
//! # Error Handling
//! Source failures and configuration defects are returned as [`SitemapError`].
//! A page that cannot be served is logged and reported as
//! [`SitemapOutcome::NotFound`]; no XML is produced for it.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::aggregate::{SitemapAggregator, DEFAULT_PAGE_SIZE};
use crate::config::SitemapConfig;
use crate::contract::{PageRecordSource, SitemapPlugin};
use crate::error::SitemapError;
use crate::paginate::{select_page, slice_dataset, PageSelection};
use crate::plugins::process_sitemap;
use crate::serialize::{build_sitemap, build_sitemap_index};

/// Which site to query and how large each source batch is.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub site_name: String,
    pub page_size: u32,
}

impl SourceOptions {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Sitemap,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapOutcome {
    Document { kind: DocumentKind, xml: String },
    NotFound,
}

/// Produces the document for `page` (0 = whole sitemap or index).
pub async fn generate_sitemap<S>(
    source: &S,
    options: &SourceOptions,
    plugins: &[Box<dyn SitemapPlugin>],
    config: &SitemapConfig,
    page: usize,
) -> Result<SitemapOutcome, SitemapError>
where
    S: PageRecordSource + ?Sized,
{
    info!(site = %options.site_name, host = %config.hostname, page, "Starting sitemap XML generation");
    let start = Instant::now();

    // A page request can never succeed with paging disabled; skip the fetch.
    if config.max_pages_per_sitemap == 0 && page != 0 {
        warn!(page, "Tried to render a sitemap page when paging was disabled");
        return Ok(SitemapOutcome::NotFound);
    }

    let aggregator = SitemapAggregator::new(source, options.site_name.clone())
        .with_page_size(options.page_size);
    let data = aggregator.get_all_sitemap_items(&config.languages).await?;
    debug!(paths = data.len(), "Sitemap items returned");

    let data = process_sitemap(data, config, plugins)?;
    let total = data.len();
    if tracing::enabled!(tracing::Level::TRACE) {
        match serde_json::to_string_pretty(&data) {
            Ok(json) => tracing::trace!(json = %json, "Processed sitemap data as JSON"),
            Err(e) => warn!(error = ?e, "Failed to serialize processed sitemap data as JSON"),
        }
    }

    debug!(
        total,
        max_per_sitemap = config.max_pages_per_sitemap,
        page,
        "Selecting sitemap page"
    );
    let selection = match select_page(total, config.max_pages_per_sitemap, page) {
        Ok(selection) => selection,
        Err(invalid) => {
            warn!(reason = %invalid, "Invalid sitemap page requested");
            return Ok(SitemapOutcome::NotFound);
        }
    };

    let outcome = match selection {
        PageSelection::Sitemap(range) => {
            let count = range.len();
            let xml = build_sitemap(slice_dataset(&data, range), config)?;
            info!(paths = count, "Rendered sitemap");
            SitemapOutcome::Document {
                kind: DocumentKind::Sitemap,
                xml,
            }
        }
        PageSelection::Index { page_count } => {
            let xml = build_sitemap_index(page_count, &config.hostname)?;
            info!(page_count, "Rendered sitemap index");
            SitemapOutcome::Document {
                kind: DocumentKind::Index,
                xml,
            }
        }
    };

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Ending sitemap XML generation");
    Ok(outcome)
}
