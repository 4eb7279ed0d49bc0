//! # contract: data model and seams of the sitemap pipeline
//!
//! This module defines the records that flow through the pipeline and the two
//! traits the rest of the crate is written against:
//!
//! - [`PageRecordSource`]: the paginated route query consumed by the aggregator.
//!   Real implementations talk to a remote API; tests use the generated
//!   `MockPageRecordSource`.
//! - [`SitemapPlugin`]: one URL finalisation rule in the ordered plugin pipeline.
//!
//! ## Mocking & Testing
//! - The source trait is annotated for `mockall` so consumers can generate deterministic
//!   mocks for unit/integration tests (enabled by the default `test-export-mocks` feature).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::SitemapConfig;
pub use crate::error::SourceError;

/// Path-keyed dataset: item path -> one record per language variant.
///
/// A `BTreeMap` keeps keys in ascending byte order, so the homepage and other
/// short paths come first.
pub type SitemapDataset = BTreeMap<String, Vec<PageRecord>>;

/// The finalised URL decision for a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalUrl {
    pub url: String,
    /// Whether later plugins may still claim this record.
    pub should_process: bool,
}

impl Default for FinalUrl {
    fn default() -> Self {
        Self {
            url: String::new(),
            should_process: true,
        }
    }
}

/// One language variant of a page, as aggregated from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// Content tree path (the dataset key).
    pub item_path: String,
    /// Candidate public URL path.
    pub path: String,
    /// `None` when the source sent a date that could not be parsed.
    pub last_modified: Option<NaiveDate>,
    /// Content type name.
    pub template: String,
    pub language: String,
    #[serde(rename = "final")]
    pub final_url: FinalUrl,
}

impl PageRecord {
    pub fn new(
        item_path: impl Into<String>,
        path: impl Into<String>,
        last_modified: Option<NaiveDate>,
        template: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            item_path: item_path.into(),
            path: path.into(),
            last_modified,
            template: template.into(),
            language: language.into(),
            final_url: FinalUrl::default(),
        }
    }

    pub fn should_process(&self) -> bool {
        self.final_url.should_process
    }

    /// Sets the final URL and closes the record to later plugins.
    ///
    /// Returns `false` and leaves the record untouched if it was already claimed.
    pub fn claim(&mut self, url: impl Into<String>) -> bool {
        if !self.final_url.should_process {
            return false;
        }
        self.final_url.url = url.into();
        self.final_url.should_process = false;
        true
    }
}

/// A raw route record as returned by the source, before mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRoute {
    pub item_path: String,
    pub url_path: String,
    pub template: String,
    /// Last updated timestamp, `YYYYMMDD...`.
    pub updated: String,
    /// Change frequency / exclusion marker value, if the route carries one.
    pub change_frequency: Option<String>,
}

/// One request against the paginated route query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    pub site_name: String,
    pub language: String,
    pub page_size: u32,
    /// Continuation cursor; empty for the first batch.
    pub after: String,
}

/// One batch of routes plus the continuation state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePage {
    pub total: u64,
    pub end_cursor: String,
    pub has_next: bool,
    pub results: Vec<RawRoute>,
}

/// Trait for the remote, cursor-paginated route query.
/// Allows plugging in real, test, or mockable sources.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageRecordSource: Send + Sync {
    /// Fetch a single batch of routes for one site and language.
    async fn fetch_routes(&self, query: RouteQuery) -> Result<RoutePage, SourceError>;
}

/// A URL finalisation rule.
///
/// Plugins run in ascending [`order`](SitemapPlugin::order) against the whole
/// dataset. A plugin may only touch records that still report
/// [`PageRecord::should_process`], and claims them with [`PageRecord::claim`].
pub trait SitemapPlugin: Send + Sync {
    fn order(&self) -> i32;

    fn process(&self, data: &mut SitemapDataset, config: &SitemapConfig);
}
