///
/// This module implements the CLI for sitemap-xml: command parsing, the `serve` and
/// `generate` subcommands, and the async [`run`] entrypoint used by `main()` and by
/// integration tests.
///
/// All pipeline logic lives in the [`sitemap-xml-core`] crate. This module only wires
/// configuration, the GraphQL source and the HTTP server together.
///
/// [`sitemap-xml-core`]: ../../sitemap-xml-core/
use crate::graphql::GraphQlSitemapClient;
use crate::load_config::{load_config, AppConfig};
use crate::server::{request_config, serve, AppState};
use anyhow::Result;
use clap::{Parser, Subcommand};
use sitemap_xml_core::contract::PageRecordSource;
use sitemap_xml_core::generate::{generate_sitemap, SitemapOutcome};
use sitemap_xml_core::paginate::parse_request_path;
use sitemap_xml_core::plugins::default_plugins;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for sitemap-xml: serve or render multi-language sitemaps.
#[derive(Parser)]
#[clap(
    name = "sitemap-xml",
    version,
    about = "Serve paginated, multi-language sitemap.xml documents from a GraphQL content API"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server answering /sitemap.xml and /sitemap-NN.xml
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Render one sitemap document to stdout
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Public hostname used for absolute URLs
        #[clap(long)]
        host: String,
        /// Request path, e.g. /sitemap.xml or /sitemap-02.xml
        #[clap(long, default_value = "/sitemap.xml")]
        path: String,
    },
}

fn graphql_source(config: &AppConfig) -> Arc<dyn PageRecordSource> {
    Arc::new(GraphQlSitemapClient::new(
        config.source.endpoint.clone(),
        config.api_key.clone(),
    ))
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Serve { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "serve", "Starting sitemap server");
            let state = AppState::new(&config, graphql_source(&config), default_plugins());
            serve(&config, state).await
        }
        Commands::Generate { config, host, path } => {
            let config = load_config(config)?;
            tracing::info!(command = "generate", host = %host, path = %path, "Generating sitemap");
            let page = parse_request_path(&path)?;
            let sitemap_config = request_config(&host, &config.overrides)?;
            let state = AppState::new(&config, graphql_source(&config), default_plugins());

            let outcome = generate_sitemap(
                state.source.as_ref(),
                &state.options,
                state.plugins.as_slice(),
                &sitemap_config,
                page,
            )
            .await?;

            match outcome {
                SitemapOutcome::Document { xml, .. } => {
                    println!("{xml}");
                    Ok(())
                }
                SitemapOutcome::NotFound => {
                    tracing::error!(command = "generate", path = %path, "No sitemap document for this page");
                    Err(anyhow::anyhow!("No sitemap document for {path}"))
                }
            }
        }
    }
}
