//! HTTP server
//!
//! Axum-based server answering `/sitemap.xml` and `/sitemap-NN.xml`.
//! Every other path, and every page that cannot be served, is redirected to `/404`.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use sitemap_xml_core::config::{default_settings, host_from_header, SitemapConfig};
use sitemap_xml_core::contract::{PageRecordSource, SitemapPlugin};
use sitemap_xml_core::generate::{generate_sitemap, SitemapOutcome, SourceOptions};
use sitemap_xml_core::paginate::parse_request_path;
use sitemap_xml_core::SitemapError;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::load_config::AppConfig;

pub const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
const NOT_FOUND_PATH: &str = "/404";
const FALLBACK_HOST: &str = "localhost";

/// Shared, read-only state for the sitemap handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PageRecordSource>,
    pub plugins: Arc<Vec<Box<dyn SitemapPlugin>>>,
    pub options: SourceOptions,
    pub host_header: Option<String>,
    pub overrides: Arc<BTreeMap<String, String>>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn PageRecordSource>,
        plugins: Vec<Box<dyn SitemapPlugin>>,
    ) -> Self {
        Self {
            source,
            plugins: Arc::new(plugins),
            options: SourceOptions {
                site_name: config.source.site_name.clone(),
                page_size: config.source.page_size,
            },
            host_header: config.host_header.clone(),
            overrides: Arc::new(config.overrides.clone()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(sitemap)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Public hostname for the request, taken from the configured header or `Host`.
pub fn resolve_hostname(headers: &HeaderMap, host_header: Option<&str>) -> String {
    let name = host_header.unwrap_or(header::HOST.as_str());
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(host_from_header)
        .filter(|h| !h.is_empty())
        .unwrap_or(FALLBACK_HOST)
        .to_string()
}

/// Defaults for `hostname`, then the environment overrides on top.
pub fn request_config(
    hostname: &str,
    overrides: &BTreeMap<String, String>,
) -> Result<SitemapConfig, SitemapError> {
    let mut settings = default_settings(hostname);
    settings.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    SitemapConfig::from_settings(&settings)
}

fn not_found() -> Response {
    Redirect::temporary(NOT_FOUND_PATH).into_response()
}

async fn sitemap(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let page = match parse_request_path(uri.path()) {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "Tried to fetch a sitemap that didn't match format");
            return not_found();
        }
    };

    let hostname = resolve_hostname(&headers, state.host_header.as_deref());
    let config = match request_config(&hostname, &state.overrides) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, host = %hostname, "Invalid sitemap configuration");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match generate_sitemap(
        state.source.as_ref(),
        &state.options,
        state.plugins.as_slice(),
        &config,
        page,
    )
    .await
    {
        Ok(SitemapOutcome::Document { xml, .. }) => {
            ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response()
        }
        Ok(SitemapOutcome::NotFound) => not_found(),
        Err(e) => {
            error!(error = %e, host = %hostname, page, "Sitemap generation failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Binds the listen address and serves until Ctrl-C.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("Invalid HTTP listen address")?;

    let listener = TcpListener::bind(&addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("Sitemap server listening on http://{}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Sitemap server shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
