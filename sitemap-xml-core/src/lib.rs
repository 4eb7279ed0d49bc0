#![doc = "sitemap-xml-core: core pipeline library for sitemap-xml."]

//! This crate contains the data model and every pipeline stage for generating
//! multi-language sitemaps. Transport (HTTP, GraphQL) lives in the `sitemap-xml` crate.
//!
//! Stages, in the order data flows through them:
//! [`aggregate`] → [`plugins`] → [`paginate`] → [`serialize`], chained by [`generate`].

pub mod aggregate;
pub mod config;
pub mod contract;
pub mod error;
pub mod generate;
pub mod paginate;
pub mod plugins;
pub mod serialize;

pub use error::{InvalidPage, SitemapError};
