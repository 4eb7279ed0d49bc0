//! Error taxonomy for the sitemap pipeline.
//!
//! Upstream failures and configuration defects are returned to the caller.
//! Invalid paths and invalid page numbers are resolved by
//! [`crate::generate::generate_sitemap`] into a not-found outcome instead.

use thiserror::Error;

/// Error type for [`crate::contract::PageRecordSource`] implementations.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Why a requested sitemap page cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPage {
    #[error("page {page} requested while paging is disabled")]
    PagingDisabled { page: usize },
    #[error("page {page} is out of range, only {page_count} page(s) available")]
    OutOfRange { page: usize, page_count: usize },
}

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("request path does not look like a sitemap: {0}")]
    InvalidRequestPath(String),

    #[error("invalid sitemap page: {0}")]
    InvalidPageNumber(#[from] InvalidPage),

    #[error("fetching routes for language '{language}' failed: {source}")]
    UpstreamFetchFailure {
        language: String,
        #[source]
        source: SourceError,
    },

    #[error("source returned malformed pagination state for language '{language}': {reason}")]
    MalformedPagination { language: String, reason: String },

    #[error("configuration defect: {0}")]
    ConfigurationDefect(String),

    #[error("record {path} [{language}] was not claimed by any plugin")]
    UnclaimedRecord { path: String, language: String },

    #[error("failed to write sitemap XML: {0}")]
    Xml(String),
}

impl SitemapError {
    pub fn config(msg: impl Into<String>) -> Self {
        SitemapError::ConfigurationDefect(msg.into())
    }
}
