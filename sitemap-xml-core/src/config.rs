use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::SitemapError;

/// Prefix marking environment variables that override sitemap settings.
pub const SETTINGS_PREFIX: &str = "SITEMAPXML_";

/// How alternate-link `hreflang` values are derived from a locale code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum HrefLangMode {
    /// `en-US` stays `en-US`.
    #[default]
    LanguageAndRegion,
    /// `en-US` becomes `en`.
    LanguageOnly,
    /// `en-US` becomes `US`.
    RegionOnly,
}

impl FromStr for HrefLangMode {
    type Err = SitemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "language-and-region" => Ok(HrefLangMode::LanguageAndRegion),
            "language-only" => Ok(HrefLangMode::LanguageOnly),
            "region-only" => Ok(HrefLangMode::RegionOnly),
            other => Err(SitemapError::config(format!(
                "href_lang_mode must be one of language-and-region, language-only, region-only; got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for HrefLangMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HrefLangMode::LanguageAndRegion => "language-and-region",
            HrefLangMode::LanguageOnly => "language-only",
            HrefLangMode::RegionOnly => "region-only",
        };
        f.write_str(s)
    }
}

/// Typed, validated sitemap settings for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapConfig {
    pub hostname: String,
    /// Locales in the order their `<url>` entries are written.
    pub languages: Vec<String>,
    pub default_language: String,
    pub include_alternate_links: bool,
    pub include_x_default: bool,
    pub href_lang_mode: HrefLangMode,
    /// `0` disables paging.
    pub max_pages_per_sitemap: usize,
    /// Settings not recognised here, left for custom plugins.
    pub extra: BTreeMap<String, String>,
}

impl SitemapConfig {
    /// Builds the config from a flat settings map, validating every recognised key.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Result<Self, SitemapError> {
        let get = |key: &str| settings.get(key).map(|v| v.trim());

        let hostname = match get("hostname") {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => {
                error!("No hostname available for sitemap generation");
                return Err(SitemapError::config("hostname is required"));
            }
        };

        let languages = parse_languages(get("languages").unwrap_or("en"));
        if languages.is_empty() {
            error!("Sitemap languages setting is empty");
            return Err(SitemapError::config("The list of languages cannot be empty"));
        }

        let default_language = get("default_language").unwrap_or("en").to_string();
        let include_alternate_links =
            parse_bool("include_alternate_links", get("include_alternate_links"), true)?;
        let include_x_default = parse_bool("include_x_default", get("include_x_default"), true)?;
        let href_lang_mode = match get("href_lang_mode") {
            Some(mode) => mode.parse()?,
            None => HrefLangMode::default(),
        };

        let max_pages_per_sitemap = match get("max_pages_per_sitemap") {
            None | Some("") => 0,
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                error!(error = ?e, raw = %raw, "max_pages_per_sitemap is not a non-negative integer");
                SitemapError::config(format!(
                    "max_pages_per_sitemap must be a non-negative integer, got '{raw}'"
                ))
            })?,
        };

        let extra = settings
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let config = SitemapConfig {
            hostname,
            languages,
            default_language,
            include_alternate_links,
            include_x_default,
            href_lang_mode,
            max_pages_per_sitemap,
            extra,
        };
        config.trace_loaded();
        Ok(config)
    }

    pub fn trace_loaded(&self) {
        info!(
            hostname = %self.hostname,
            languages = self.languages.len(),
            max_pages_per_sitemap = self.max_pages_per_sitemap,
            "Loaded sitemap config"
        );
        debug!(config = ?self, "Sitemap config loaded (full debug)");
    }
}

const KNOWN_KEYS: [&str; 7] = [
    "hostname",
    "languages",
    "default_language",
    "include_alternate_links",
    "include_x_default",
    "href_lang_mode",
    "max_pages_per_sitemap",
];

/// The baseline settings for a host, before any overrides are folded in.
pub fn default_settings(hostname: &str) -> BTreeMap<String, String> {
    [
        ("hostname", hostname),
        ("languages", "en"),
        ("default_language", "en"),
        ("include_alternate_links", "true"),
        ("include_x_default", "true"),
        ("href_lang_mode", "language-and-region"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Folds `PREFIX_KEY=value` pairs into `settings` as `key=value`.
///
/// The prefix matches case-insensitively and the remainder is lower-cased.
/// Later pairs overwrite earlier ones and any existing default.
pub fn fold_prefixed_settings<I, K, V>(settings: &mut BTreeMap<String, String>, vars: I, prefix: &str)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let prefix = prefix.to_lowercase();
    for (key, value) in vars {
        let key = key.as_ref().to_lowercase();
        if let Some(setting) = key.strip_prefix(&prefix) {
            if setting.is_empty() {
                continue;
            }
            let value = value.into();
            debug!(setting = %setting, value = %value, "Creating sitemap setting");
            settings.insert(setting.to_string(), value);
        }
    }
}

/// Strips a trailing `:port` from a host header value.
pub fn host_from_header(value: &str) -> &str {
    value.split(':').next().unwrap_or(value).trim()
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, raw: Option<&str>, default: bool) -> Result<bool, SitemapError> {
    match raw {
        None => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
        Some(v) => Err(SitemapError::config(format!(
            "{key} must be 'true' or 'false', got '{v}'"
        ))),
    }
}
