//! Aggregation: drives a [`PageRecordSource`] across all languages and builds the
//! path-keyed [`SitemapDataset`].
//!
//! Languages are fetched one after the other and each language follows its own
//! cursor chain, so ordering is deterministic and the source never sees more than
//! one request at a time. Any fetch failure aborts the whole aggregation.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::contract::{PageRecord, PageRecordSource, RawRoute, RouteQuery, SitemapDataset};
use crate::error::SitemapError;

/// Change frequency value that removes a route from the sitemap.
pub const EXCLUSION_MARKER: &str = "DoNotInclude";

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Records grouped by language, in the order the languages were requested.
pub type LanguageRecords = Vec<(String, Vec<PageRecord>)>;

pub struct SitemapAggregator<'a, S: ?Sized> {
    source: &'a S,
    site_name: String,
    page_size: u32,
}

impl<'a, S> SitemapAggregator<'a, S>
where
    S: PageRecordSource + ?Sized,
{
    pub fn new(source: &'a S, site_name: impl Into<String>) -> Self {
        Self {
            source,
            site_name: site_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetches every language and returns the sorted, path-keyed dataset.
    pub async fn get_all_sitemap_items(
        &self,
        languages: &[String],
    ) -> Result<SitemapDataset, SitemapError> {
        if languages.is_empty() {
            error!("Sitemap aggregation requested without languages");
            return Err(SitemapError::config("The list of languages cannot be empty"));
        }
        if self.site_name.trim().is_empty() {
            error!("Sitemap aggregation requested without a site name");
            return Err(SitemapError::config("The service needs a site name"));
        }
        if self.page_size == 0 {
            return Err(SitemapError::config("page size must be greater than zero"));
        }

        let start = Instant::now();
        let mut raw: LanguageRecords = Vec::with_capacity(languages.len());

        for language in languages {
            if raw.iter().any(|(l, _)| l == language) {
                debug!(language = %language, "Language listed twice, skipping");
                continue;
            }
            let items = self.get_sitemap_items(language).await?;
            raw.push((language.clone(), items));
        }

        let data = invert_sitemap_to_items(raw);
        info!(
            site = %self.site_name,
            paths = data.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregated sitemap items"
        );
        Ok(data)
    }

    async fn get_sitemap_items(&self, language: &str) -> Result<Vec<PageRecord>, SitemapError> {
        debug!(language = %language, "Fetching sitemap data");
        let routes = self.get_routes_for_language(language).await?;
        let fetched = routes.len();

        let items: Vec<PageRecord> = routes
            .into_iter()
            .filter(|route| route.change_frequency.as_deref() != Some(EXCLUSION_MARKER))
            .map(|route| to_page_record(route, language))
            .collect();

        debug!(
            language = %language,
            fetched,
            kept = items.len(),
            "Mapped routes to page records"
        );
        Ok(items)
    }

    /// Follows the cursor chain until the source reports no more data.
    async fn get_routes_for_language(&self, language: &str) -> Result<Vec<RawRoute>, SitemapError> {
        let mut results = Vec::new();
        let mut after = String::new();

        loop {
            let query = RouteQuery {
                site_name: self.site_name.clone(),
                language: language.to_string(),
                page_size: self.page_size,
                after: after.clone(),
            };
            let page = self.source.fetch_routes(query).await.map_err(|e| {
                error!(error = %e, language = %language, cursor = %after, "Route fetch failed");
                SitemapError::UpstreamFetchFailure {
                    language: language.to_string(),
                    source: e,
                }
            })?;

            debug!(
                language = %language,
                batch = page.results.len(),
                total = page.total,
                has_next = page.has_next,
                "Fetched route batch"
            );
            results.extend(page.results);

            if !page.has_next {
                break;
            }
            if page.end_cursor.is_empty() || page.end_cursor == after {
                error!(language = %language, cursor = %page.end_cursor, "Source reported more data without advancing the cursor");
                return Err(SitemapError::MalformedPagination {
                    language: language.to_string(),
                    reason: format!("hasNext is true but cursor '{}' does not advance", page.end_cursor),
                });
            }
            after = page.end_cursor;
        }

        Ok(results)
    }
}

fn to_page_record(route: RawRoute, language: &str) -> PageRecord {
    let last_modified = parse_updated_date(&route.updated);
    if last_modified.is_none() {
        warn!(
            item_path = %route.item_path,
            language = %language,
            updated = %route.updated,
            "Unparsable last-updated value, lastmod will be omitted"
        );
    }
    PageRecord::new(
        route.item_path,
        route.url_path,
        last_modified,
        route.template,
        language,
    )
}

/// Parses the `YYYYMMDD` prefix of a last-updated value into a UTC date.
///
/// Returns `None` for anything that is not a real calendar date.
pub fn parse_updated_date(value: &str) -> Option<NaiveDate> {
    let year = value.get(0..4)?.parse::<i32>().ok()?;
    let month = value.get(4..6)?.parse::<u32>().ok()?;
    let day = value.get(6..8)?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Turns language-keyed records into the path-keyed, sorted dataset.
///
/// A second record for the same path and language replaces the first.
pub fn invert_sitemap_to_items(data: LanguageRecords) -> SitemapDataset {
    let mut inverted = SitemapDataset::new();
    for (_language, records) in data {
        for record in records {
            let variants = inverted.entry(record.item_path.clone()).or_default();
            match variants.iter_mut().find(|r| r.language == record.language) {
                Some(existing) => {
                    debug!(item_path = %record.item_path, language = %record.language, "Duplicate record, keeping the later one");
                    *existing = record;
                }
                None => variants.push(record),
            }
        }
    }
    inverted
}
