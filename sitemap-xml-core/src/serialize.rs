//! XML rendering for sitemaps and sitemap indexes.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::{HrefLangMode, SitemapConfig};
use crate::contract::PageRecord;
use crate::error::SitemapError;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

fn xml_err(e: impl std::fmt::Display) -> SitemapError {
    SitemapError::Xml(e.to_string())
}

/// The `hreflang` value for a locale code under `mode`.
///
/// Only five character codes such as `en-US` are shortened.
pub fn href_lang(language: &str, mode: HrefLangMode) -> &str {
    if language.len() != 5 {
        return language;
    }
    match mode {
        HrefLangMode::LanguageAndRegion => language,
        HrefLangMode::LanguageOnly => language.get(0..2).unwrap_or(language),
        HrefLangMode::RegionOnly => language.get(3..5).unwrap_or(language),
    }
}

fn absolute_url(hostname: &str, path: &str) -> String {
    format!("https://{hostname}{path}")
}

/// Renders a `<urlset>` with one `<url>` per path and configured language.
///
/// Entries are written path by path, and within a path in the order of
/// `config.languages`. A language with no record for a path is skipped.
pub fn build_sitemap<'a, I>(pages: I, config: &SitemapConfig) -> Result<String, SitemapError>
where
    I: IntoIterator<Item = (&'a String, &'a Vec<PageRecord>)>,
{
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    if config.include_alternate_links {
        urlset.push_attribute(("xmlns:xhtml", XHTML_NS));
    }
    writer.write_event(Event::Start(urlset)).map_err(xml_err)?;

    for (_item_path, variants) in pages {
        for language in &config.languages {
            let Some(page) = variants.iter().find(|p| &p.language == language) else {
                continue;
            };
            write_url(&mut writer, page, variants, config)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("urlset")))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn write_url(
    writer: &mut Writer<Vec<u8>>,
    page: &PageRecord,
    variants: &[PageRecord],
    config: &SitemapConfig,
) -> Result<(), SitemapError> {
    let host = config.hostname.as_str();

    writer
        .write_event(Event::Start(BytesStart::new("url")))
        .map_err(xml_err)?;
    writer
        .create_element("loc")
        .write_text_content(BytesText::new(&absolute_url(host, &page.final_url.url)))
        .map_err(xml_err)?;
    if let Some(date) = page.last_modified {
        writer
            .create_element("lastmod")
            .write_text_content(BytesText::new(&date.format("%Y-%m-%d").to_string()))
            .map_err(xml_err)?;
    }

    if config.include_alternate_links {
        for alt in variants.iter().filter(|p| p.language != page.language) {
            write_alternate(
                writer,
                href_lang(&alt.language, config.href_lang_mode),
                &absolute_url(host, &alt.final_url.url),
            )?;
        }

        if config.include_x_default {
            if let Some(default_page) = variants.iter().find(|p| p.language == config.default_language) {
                write_alternate(writer, "x-default", &absolute_url(host, &default_page.final_url.url))?;
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new("url")))
        .map_err(xml_err)?;
    Ok(())
}

fn write_alternate(writer: &mut Writer<Vec<u8>>, hreflang: &str, href: &str) -> Result<(), SitemapError> {
    writer
        .create_element("xhtml:link")
        .with_attribute(("rel", "alternate"))
        .with_attribute(("hreflang", hreflang))
        .with_attribute(("href", href))
        .write_empty()
        .map_err(xml_err)?;
    Ok(())
}

/// Renders a `<sitemapindex>` pointing at `/sitemap-01.xml` .. `/sitemap-NN.xml`.
pub fn build_sitemap_index(page_count: usize, hostname: &str) -> Result<String, SitemapError> {
    let mut writer = Writer::new(Vec::new());

    let mut index = BytesStart::new("sitemapindex");
    index.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(index)).map_err(xml_err)?;

    for page in 1..=page_count {
        writer
            .write_event(Event::Start(BytesStart::new("sitemap")))
            .map_err(xml_err)?;
        writer
            .create_element("loc")
            .write_text_content(BytesText::new(&absolute_url(
                hostname,
                &format!("/sitemap-{page:02}.xml"),
            )))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("sitemap")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("sitemapindex")))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}
