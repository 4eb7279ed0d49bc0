use chrono::NaiveDate;
use mockall::Sequence;
use sitemap_xml_core::aggregate::SitemapAggregator;
use sitemap_xml_core::contract::{MockPageRecordSource, RawRoute, RoutePage, RouteQuery};
use sitemap_xml_core::SitemapError;

fn route(item_path: &str, url_path: &str) -> RawRoute {
    RawRoute {
        item_path: item_path.to_string(),
        url_path: url_path.to_string(),
        template: "Page".to_string(),
        updated: "20240115T083000Z".to_string(),
        change_frequency: None,
    }
}

fn single_page(results: Vec<RawRoute>) -> RoutePage {
    RoutePage {
        total: results.len() as u64,
        end_cursor: String::new(),
        has_next: false,
        results,
    }
}

fn langs(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn test_inverts_languages_into_path_keyed_records() {
    let mut source = MockPageRecordSource::new();
    source
        .expect_fetch_routes()
        .times(2)
        .returning(|q: RouteQuery| {
            Ok(single_page(vec![route("/home", &format!("/{}", q.language))]))
        });

    let aggregator = SitemapAggregator::new(&source, "corporate");
    let data = aggregator
        .get_all_sitemap_items(&langs(&["en", "fr"]))
        .await
        .expect("aggregation should succeed");

    assert_eq!(data.len(), 1);
    let variants = &data["/home"];
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].language, "en");
    assert_eq!(variants[1].language, "fr");
    assert_eq!(variants[1].path, "/fr");
    for record in variants {
        assert!(record.final_url.should_process);
        assert!(record.final_url.url.is_empty());
        assert_eq!(record.last_modified, NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}

#[tokio::test]
async fn test_paths_are_sorted_ascending() {
    let mut source = MockPageRecordSource::new();
    source.expect_fetch_routes().return_once(|_| {
        Ok(single_page(vec![
            route("/zzz", "/zzz"),
            route("/aaa", "/aaa"),
            route("/", "/"),
        ]))
    });

    let data = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap();

    let keys: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["/", "/aaa", "/zzz"]);
}

#[tokio::test]
async fn test_excluded_routes_are_dropped() {
    let mut source = MockPageRecordSource::new();
    source.expect_fetch_routes().return_once(|_| {
        let mut hidden = route("/hidden", "/hidden");
        hidden.change_frequency = Some("DoNotInclude".to_string());
        let mut weekly = route("/weekly", "/weekly");
        weekly.change_frequency = Some("weekly".to_string());
        Ok(single_page(vec![hidden, weekly, route("/plain", "/plain")]))
    });

    let data = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap();

    assert!(!data.contains_key("/hidden"));
    assert!(data.contains_key("/weekly"));
    assert!(data.contains_key("/plain"));
}

#[tokio::test]
async fn test_follows_cursor_chain_until_no_more_data() {
    let mut source = MockPageRecordSource::new();
    let mut seq = Sequence::new();

    source
        .expect_fetch_routes()
        .withf(|q| q.after.is_empty() && q.page_size == 2 && q.site_name == "corporate")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(RoutePage {
                total: 3,
                end_cursor: "cursor-1".to_string(),
                has_next: true,
                results: vec![route("/a", "/a"), route("/b", "/b")],
            })
        });
    source
        .expect_fetch_routes()
        .withf(|q| q.after == "cursor-1")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(RoutePage {
                total: 3,
                end_cursor: "cursor-2".to_string(),
                has_next: false,
                results: vec![route("/c", "/c")],
            })
        });

    let data = SitemapAggregator::new(&source, "corporate")
        .with_page_size(2)
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap();

    assert_eq!(data.len(), 3);
}

#[tokio::test]
async fn test_fetch_failure_is_fatal() {
    let mut source = MockPageRecordSource::new();
    source
        .expect_fetch_routes()
        .withf(|q| q.language == "en")
        .return_once(|_| Ok(single_page(vec![route("/home", "/")])));
    source
        .expect_fetch_routes()
        .withf(|q| q.language == "fr")
        .return_once(|_| Err("upstream unavailable".into()));

    let err = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&langs(&["en", "fr"]))
        .await
        .unwrap_err();

    match err {
        SitemapError::UpstreamFetchFailure { language, .. } => assert_eq!(language, "fr"),
        other => panic!("expected upstream failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_advancing_cursor_is_rejected() {
    let mut source = MockPageRecordSource::new();
    source.expect_fetch_routes().times(1).returning(|_| {
        Ok(RoutePage {
            total: 10,
            end_cursor: String::new(),
            has_next: true,
            results: vec![route("/a", "/a")],
        })
    });

    let err = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SitemapError::MalformedPagination { .. }));
}

#[tokio::test]
async fn test_malformed_dates_do_not_fail_the_request() {
    let mut source = MockPageRecordSource::new();
    source.expect_fetch_routes().return_once(|_| {
        let mut broken = route("/broken", "/broken");
        broken.updated = "not-a-date".to_string();
        Ok(single_page(vec![broken]))
    });

    let data = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap();

    assert_eq!(data["/broken"][0].last_modified, None);
}

#[tokio::test]
async fn test_missing_languages_or_site_fail_before_fetching() {
    let mut source = MockPageRecordSource::new();
    source.expect_fetch_routes().never();

    let err = SitemapAggregator::new(&source, "corporate")
        .get_all_sitemap_items(&[])
        .await
        .unwrap_err();
    assert!(matches!(err, SitemapError::ConfigurationDefect(_)));

    let err = SitemapAggregator::new(&source, "  ")
        .get_all_sitemap_items(&langs(&["en"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SitemapError::ConfigurationDefect(_)));
}
