//! URL finalisation: an ordered, short-circuiting list of [`SitemapPlugin`]s.
//!
//! Plugins run in ascending order (ties keep registration order). The first
//! plugin that claims a record decides its final URL; later plugins skip it.
//! [`DefaultPlugin`] runs last and claims whatever is left.

use std::time::Instant;

use tracing::{debug, error, info};

use crate::config::SitemapConfig;
use crate::contract::{SitemapDataset, SitemapPlugin};
use crate::error::SitemapError;

/// Content type whose URLs carry two bucket folder segments.
pub const CONTAINER_TEMPLATE: &str = "Bucket Page";

/// Collapses bucket folder segments out of container page URLs.
///
/// `/buckets/a/b/page` becomes `/buckets/page`. Paths with fewer than four
/// segments are left for later plugins.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathCollapsePlugin;

impl PathCollapsePlugin {
    pub const ORDER: i32 = 1;
}

impl SitemapPlugin for PathCollapsePlugin {
    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn process(&self, data: &mut SitemapDataset, _config: &SitemapConfig) {
        for record in data.values_mut().flatten() {
            if record.template != CONTAINER_TEMPLATE || !record.should_process() {
                continue;
            }
            if let Some(url) = collapse_bucket_path(&record.path) {
                debug!(path = %record.path, url = %url, "Collapsed bucket path");
                record.claim(url);
            }
        }
    }
}

/// Removes the segments at `len-3` and `len-2` from a `/`-separated path of at
/// least four segments.
pub fn collapse_bucket_path(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 4 {
        return None;
    }
    let len = segments.len();
    segments.drain(len - 3..len - 1);
    Some(segments.join("/"))
}

/// Claims every unclaimed record with its original path.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPlugin;

impl DefaultPlugin {
    pub const ORDER: i32 = 9999;
}

impl SitemapPlugin for DefaultPlugin {
    fn order(&self) -> i32 {
        Self::ORDER
    }

    fn process(&self, data: &mut SitemapDataset, _config: &SitemapConfig) {
        for record in data.values_mut().flatten() {
            if record.should_process() {
                let url = record.path.clone();
                record.claim(url);
            }
        }
    }
}

/// The baseline plugin set: bucket path collapsing followed by the passthrough default.
pub fn default_plugins() -> Vec<Box<dyn SitemapPlugin>> {
    vec![Box::new(PathCollapsePlugin), Box::new(DefaultPlugin)]
}

/// Runs every plugin against the dataset in ascending order.
///
/// Fails if a record is still unclaimed afterwards, which can only happen when
/// the plugin set lacks a catch-all like [`DefaultPlugin`].
pub fn process_sitemap(
    mut data: SitemapDataset,
    config: &SitemapConfig,
    plugins: &[Box<dyn SitemapPlugin>],
) -> Result<SitemapDataset, SitemapError> {
    info!(plugins = plugins.len(), paths = data.len(), "Running sitemap plugins");
    let start = Instant::now();

    let mut ordered: Vec<&dyn SitemapPlugin> = plugins.iter().map(|p| p.as_ref()).collect();
    // sort_by_key is stable: equal orders keep registration order
    ordered.sort_by_key(|p| p.order());

    for plugin in ordered {
        plugin.process(&mut data, config);
    }

    if let Some(record) = data.values().flatten().find(|r| r.should_process()) {
        error!(item_path = %record.item_path, language = %record.language, "Record left unclaimed after all plugins");
        return Err(SitemapError::UnclaimedRecord {
            path: record.item_path.clone(),
            language: record.language.clone(),
        });
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Sitemap plugins finished");
    Ok(data)
}
