#![doc = "GraphQL route source: bridges the core `PageRecordSource` trait to a remote content delivery GraphQL endpoint."]
//
//! # GraphQL Route Source
//!
//! [`GraphQlSitemapClient`] implements [`PageRecordSource`] by issuing the `sitemap`
//! query against a content delivery GraphQL endpoint, one cursor page at a time.
//!
//! - Construct it with [`GraphQlSitemapClient::new`] from the endpoint URL and an optional API key.
//! - The API key is sent as the `sc_apikey` header.
//! - GraphQL `errors`, non-success statuses and missing `site.siteInfo` data are all
//!   surfaced as errors; the aggregator treats them as fatal for the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitemap_xml_core::contract::{PageRecordSource, RawRoute, RoutePage, RouteQuery, SourceError};

pub const SITEMAP_QUERY: &str = r#"query sitemap(
  $siteName: String!
  $language: String = "en"
  $pageSize: Int = 100
  $after: String = ""
) {
  site {
    siteInfo(site: $siteName) {
      routes(language: $language, first: $pageSize, after: $after) {
        total
        pageInfo {
          endCursor
          hasNext
        }
        results {
          route {
            path
            template {
              name
            }
            updated: field(name: "__Updated") {
              value
            }
            url {
              path
            }
            ... on _Sitemap {
              changeFrequency {
                ...enumVal
              }
            }
          }
        }
      }
    }
  }
}

fragment enumVal on LookupField {
  targetItem {
    field(name: "value") {
      value
    }
  }
}"#;

const API_KEY_HEADER: &str = "sc_apikey";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SitemapQueryVariables<'a> {
    site_name: &'a str,
    language: &'a str,
    page_size: u32,
    after: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: SitemapQueryVariables<'a>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SitemapQueryResult>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SitemapQueryResult {
    site: Option<SiteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteResult {
    site_info: Option<SiteInfoResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteInfoResult {
    routes: RoutesResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutesResult {
    #[serde(default)]
    total: u64,
    page_info: PageInfo,
    #[serde(default)]
    results: Vec<RouteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    end_cursor: Option<String>,
    has_next: bool,
}

#[derive(Debug, Deserialize)]
struct RouteResult {
    route: Option<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    path: String,
    template: Option<NamedValue>,
    updated: Option<StringValue>,
    url: UrlValue,
    change_frequency: Option<EnumValue>,
}

#[derive(Debug, Deserialize)]
struct NamedValue {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StringValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlValue {
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnumValue {
    target_item: Option<EnumTarget>,
}

#[derive(Debug, Deserialize)]
struct EnumTarget {
    field: Option<StringValue>,
}

impl From<Route> for RawRoute {
    fn from(route: Route) -> Self {
        RawRoute {
            item_path: route.path,
            url_path: route.url.path,
            template: route.template.map(|t| t.name).unwrap_or_default(),
            updated: route.updated.and_then(|u| u.value).unwrap_or_default(),
            change_frequency: route
                .change_frequency
                .and_then(|c| c.target_item)
                .and_then(|t| t.field)
                .and_then(|f| f.value),
        }
    }
}

pub struct GraphQlSitemapClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GraphQlSitemapClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.into();
        tracing::info!(
            endpoint = %endpoint,
            api_key_set = api_key.is_some(),
            "Initialized GraphQL sitemap client"
        );
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl PageRecordSource for GraphQlSitemapClient {
    async fn fetch_routes(&self, query: RouteQuery) -> Result<RoutePage, SourceError> {
        tracing::debug!(
            site = %query.site_name,
            language = %query.language,
            after = %query.after,
            "Requesting sitemap routes"
        );
        let body = GraphQlRequest {
            query: SITEMAP_QUERY,
            variables: SitemapQueryVariables {
                site_name: &query.site_name,
                language: &query.language,
                page_size: query.page_size,
                after: &query.after,
            },
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, endpoint = %self.endpoint, "Failed to reach GraphQL endpoint");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, endpoint = %self.endpoint, "GraphQL endpoint returned error. Response body: {text}");
            return Err(format!("GraphQL endpoint returned {status}").into());
        }

        let payload: GraphQlResponse = response.json().await.map_err(|e| {
            tracing::error!(error = ?e, "Failed to parse GraphQL response JSON");
            e
        })?;

        if !payload.errors.is_empty() {
            let messages: Vec<&str> = payload.errors.iter().map(|e| e.message.as_str()).collect();
            tracing::error!(errors = ?messages, "GraphQL query returned errors");
            return Err(format!("GraphQL errors: {}", messages.join("; ")).into());
        }

        let routes = payload
            .data
            .and_then(|d| d.site)
            .and_then(|s| s.site_info)
            .map(|i| i.routes)
            .ok_or_else(|| -> SourceError {
                format!("site '{}' returned no siteInfo", query.site_name).into()
            })?;

        let results: Vec<RawRoute> = routes
            .results
            .into_iter()
            .filter_map(|r| r.route)
            .map(RawRoute::from)
            .collect();

        Ok(RoutePage {
            total: routes.total,
            end_cursor: routes.page_info.end_cursor.unwrap_or_default(),
            has_next: routes.page_info.has_next,
            results,
        })
    }
}
