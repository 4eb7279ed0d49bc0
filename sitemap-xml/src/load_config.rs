/// `load_config` module: Loads a static YAML config file and merges environment overrides into the internal [`AppConfig`].
///
/// This module is the only place where YAML and process environment are parsed for the service.
///
/// # Responsibilities
/// - Parse the YAML file (server, GraphQL source, optional host header) into typed structs
/// - Inject secrets (`SITEMAP_API_KEY`) and the host header override (`SITEMAP_HOST_HEADER`) from the environment
/// - Collect `SITEMAPXML_*` variables as sitemap setting overrides, applied on top of the per-request defaults
/// - Fail fast with clear diagnostics when a required value is missing
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use sitemap_xml_core::aggregate::DEFAULT_PAGE_SIZE;
use sitemap_xml_core::config::{fold_prefixed_settings, SETTINGS_PREFIX};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const API_KEY_ENV: &str = "SITEMAP_API_KEY";
pub const HOST_HEADER_ENV: &str = "SITEMAP_HOST_HEADER";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    pub endpoint: String,
    pub site_name: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Fully merged service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSection,
    pub source: SourceSection,
    /// Header carrying the public hostname; `None` means the standard `Host` header.
    pub host_header: Option<String>,
    pub api_key: Option<String>,
    /// `SITEMAPXML_*` overrides, already stripped and lower-cased.
    pub overrides: BTreeMap<String, String>,
}

/// Loads a static YAML config file and injects env vars for secrets and sitemap overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    #[derive(Debug, Deserialize)]
    struct RawConfig {
        #[serde(default)]
        server: ServerSection,
        source: SourceSection,
        #[serde(default)]
        host_header: Option<String>,
    }

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.source.endpoint.trim().is_empty() {
        error!("source.endpoint is empty");
        anyhow::bail!("source.endpoint must be set: no GraphQL endpoint to fetch routes from");
    }
    if raw.source.site_name.trim().is_empty() {
        error!("source.site_name is empty");
        anyhow::bail!("source.site_name must be set");
    }
    if raw.source.page_size == 0 {
        anyhow::bail!("source.page_size must be greater than zero");
    }

    let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
    if api_key.is_some() {
        info!("{API_KEY_ENV} found in env");
    }

    let host_header = std::env::var(HOST_HEADER_ENV)
        .ok()
        .or(raw.host_header)
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty());

    let mut overrides = BTreeMap::new();
    fold_prefixed_settings(&mut overrides, std::env::vars(), SETTINGS_PREFIX);

    info!(
        endpoint = %raw.source.endpoint,
        site_name = %raw.source.site_name,
        host_header = host_header.as_deref().unwrap_or("host"),
        overrides = overrides.len(),
        "Config loaded and merged successfully"
    );

    Ok(AppConfig {
        server: raw.server,
        source: raw.source,
        host_header,
        api_key,
        overrides,
    })
}
