use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use sitemap_xml_core::config::{default_settings, SitemapConfig};
use sitemap_xml_core::contract::{PageRecord, SitemapDataset};
use sitemap_xml_core::serialize::build_sitemap;

fn config(pairs: &[(&str, &str)]) -> SitemapConfig {
    let mut settings = default_settings("www.example.com");
    for (k, v) in pairs {
        settings.insert(k.to_string(), v.to_string());
    }
    SitemapConfig::from_settings(&settings).unwrap()
}

fn claimed(item_path: &str, url: &str, language: &str) -> PageRecord {
    let mut record = PageRecord::new(item_path, url, NaiveDate::from_ymd_opt(2024, 3, 9), "Page", language);
    record.claim(url);
    record
}

fn home_dataset(languages: &[&str]) -> SitemapDataset {
    let variants = languages
        .iter()
        .map(|l| claimed("/home", &format!("/{l}"), l))
        .collect();
    SitemapDataset::from([("/home".to_string(), variants)])
}

/// Reads the whole document back, returning the names of all elements seen.
fn element_names(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                names.push(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!("document is not well-formed: {e}"),
        }
    }
    names
}

#[test]
fn test_empty_dataset_yields_empty_urlset() {
    let xml = build_sitemap(&SitemapDataset::new(), &config(&[])).unwrap();

    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains("<urlset"));
    assert!(xml.ends_with("</urlset>"));
    assert_eq!(element_names(&xml), vec!["urlset"]);
}

#[test]
fn test_url_entries_follow_configured_language_order() {
    let data = home_dataset(&["en", "fr"]);
    let xml = build_sitemap(&data, &config(&[("languages", "fr|en")])).unwrap();

    let fr = xml.find("<loc>https://www.example.com/fr</loc>").unwrap();
    let en = xml.find("<loc>https://www.example.com/en</loc>").unwrap();
    assert!(fr < en);
    assert!(xml.contains("<lastmod>2024-03-09</lastmod>"));
    assert_eq!(element_names(&xml).iter().filter(|n| *n == "url").count(), 2);
}

#[test]
fn test_languages_without_records_emit_nothing() {
    let data = home_dataset(&["en"]);
    let xml = build_sitemap(&data, &config(&[("languages", "en|de")])).unwrap();

    assert_eq!(xml.matches("<url>").count(), 1);
    assert!(!xml.contains("/de"));
}

#[test]
fn test_alternate_links_use_hreflang_mode() {
    struct TestCase {
        mode: &'static str,
        expected: &'static str,
    }
    let cases = [
        TestCase { mode: "language-and-region", expected: r#"hreflang="en-US""# },
        TestCase { mode: "language-only", expected: r#"hreflang="en""# },
        TestCase { mode: "region-only", expected: r#"hreflang="US""# },
    ];

    let data = home_dataset(&["en-US", "fr"]);
    for case in cases {
        let xml = build_sitemap(
            &data,
            &config(&[("languages", "en-US|fr"), ("href_lang_mode", case.mode), ("include_x_default", "false")]),
        )
        .unwrap();
        assert!(xml.contains(case.expected), "mode {}: {xml}", case.mode);
        assert!(xml.contains(r#"hreflang="fr""#), "mode {}: {xml}", case.mode);
        assert!(xml.contains(r#"xmlns:xhtml="http://www.w3.org/1999/xhtml""#));
    }
}

#[test]
fn test_alternate_links_skip_own_language() {
    let data = home_dataset(&["en", "fr"]);
    let xml = build_sitemap(&data, &config(&[("languages", "en|fr"), ("include_x_default", "false")])).unwrap();

    // one alternate per <url>: en points at fr and fr points at en
    assert_eq!(xml.matches("<xhtml:link").count(), 2);
    assert!(xml.contains(r#"<xhtml:link rel="alternate" hreflang="fr" href="https://www.example.com/fr"/>"#));
}

#[test]
fn test_x_default_emitted_once_per_url_when_default_exists() {
    let data = home_dataset(&["en", "fr"]);
    let xml = build_sitemap(&data, &config(&[("languages", "en|fr")])).unwrap();

    assert_eq!(xml.matches("<url>").count(), 2);
    assert_eq!(xml.matches(r#"hreflang="x-default""#).count(), 2);
    assert!(xml.contains(r#"hreflang="x-default" href="https://www.example.com/en""#));
}

#[test]
fn test_x_default_absent_without_default_language_variant() {
    let data = home_dataset(&["de", "fr"]);
    let xml = build_sitemap(&data, &config(&[("languages", "de|fr")])).unwrap();

    assert!(!xml.contains("x-default"));
}

#[test]
fn test_alternate_links_disabled_drops_namespace_and_links() {
    let data = home_dataset(&["en", "fr"]);
    let xml = build_sitemap(&data, &config(&[("languages", "en|fr"), ("include_alternate_links", "false")])).unwrap();

    assert!(!xml.contains("xmlns:xhtml"));
    assert!(!xml.contains("<xhtml:link"));
    assert!(!xml.contains("x-default"));
}

#[test]
fn test_missing_lastmod_is_omitted() {
    let mut record = PageRecord::new("/odd", "/odd", None, "Page", "en");
    record.claim("/odd");
    let data = SitemapDataset::from([("/odd".to_string(), vec![record])]);

    let xml = build_sitemap(&data, &config(&[])).unwrap();

    assert!(xml.contains("<loc>https://www.example.com/odd</loc>"));
    assert!(!xml.contains("<lastmod>"));
}

#[test]
fn test_urls_are_escaped() {
    let data = SitemapDataset::from([("/q".to_string(), vec![claimed("/q", "/search?a=1&b=2", "en")])]);

    let xml = build_sitemap(&data, &config(&[])).unwrap();

    assert!(xml.contains("/search?a=1&amp;b=2"));
    element_names(&xml);
}
