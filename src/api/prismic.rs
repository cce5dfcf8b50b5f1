//! HTTP client for the Prismic REST API v2
//!
//! Every query first resolves the repository's master ref, then runs a
//! `documents/search` predicate query against it. The master ref is not
//! cached: it changes each time content is published.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use super::responses::{ApiResponse, SearchResponse};
use super::{ContentError, ContentSource};
use crate::config::SiteConfig;
use crate::content::{Page, PostDetail, PostSummary};

const NEWEST_FIRST: &str = "[document.first_publication_date desc]";

/// Prismic repository client
#[derive(Clone)]
pub struct PrismicClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    document_type: String,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as
    /// `https://my-repo.cdn.prismic.io/api/v2`
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        document_type: &str,
    ) -> Result<Self, ContentError> {
        let http = Client::builder()
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
            document_type: document_type.to_string(),
        })
    }

    /// Create a client from the site configuration
    pub fn from_config(config: &SiteConfig) -> anyhow::Result<Self> {
        let endpoint = config.api_endpoint.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No content API configured: set api_endpoint in _config.yml or {}",
                crate::config::ENV_API_ENDPOINT
            )
        })?;
        Ok(Self::new(
            endpoint,
            config.access_token.clone(),
            &config.document_type,
        )?)
    }

    /// Resolve the ref of the currently published content
    async fn master_ref(&self) -> Result<String, ContentError> {
        let api: ApiResponse = self.send(self.http.get(&self.endpoint)).await?;
        api.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| ContentError::MissingRef(self.endpoint.clone()))
    }

    /// Run a predicate query against the master ref
    async fn search(
        &self,
        predicate: String,
        page_size: usize,
        page: u32,
    ) -> Result<SearchResponse, ContentError> {
        let reference = self.master_ref().await?;
        let url = format!("{}/documents/search", self.endpoint);
        let query = [
            ("ref", reference),
            ("q", predicate),
            ("pageSize", page_size.max(1).to_string()),
            ("page", page.to_string()),
            ("orderings", NEWEST_FIRST.to_string()),
        ];
        self.send(self.http.get(url).query(&query)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ContentError> {
        let request = match &self.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("GET {} -> {}", redact(response.url()), status);

        if !status.is_success() {
            return Err(ContentError::Status {
                status: status.as_u16(),
                url: redact(response.url()),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn fetch_page(
        &self,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<Page<PostSummary>, ContentError> {
        let page = match after {
            Some(cursor) => parse_cursor(cursor)?,
            None => 1,
        };
        let predicate = format!(r#"[[at(document.type,"{}")]]"#, self.document_type);
        let response = self.search(predicate, page_size, page).await?;

        let results = response
            .results
            .into_iter()
            .filter_map(|doc| {
                let summary = doc.into_summary();
                if summary.is_none() {
                    tracing::warn!("Skipping {} document without uid", self.document_type);
                }
                summary
            })
            .collect();

        Ok(Page::new(
            results,
            cursor_from_next_page(response.next_page.as_deref()),
        ))
    }

    async fn fetch_by_uid(&self, uid: &str) -> Result<PostDetail, ContentError> {
        let predicate = format!(
            r#"[[at(my.{}.uid,"{}")]]"#,
            self.document_type,
            uid.replace('\\', "\\\\").replace('"', "\\\"")
        );
        let response = self.search(predicate, 1, 1).await?;

        response
            .results
            .into_iter()
            .next()
            .map(|doc| doc.into_detail(uid))
            .ok_or_else(|| ContentError::NotFound(uid.to_string()))
    }
}

/// Cursors are the decimal page number of the next page
fn parse_cursor(cursor: &str) -> Result<u32, ContentError> {
    cursor
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| ContentError::InvalidCursor(cursor.to_string()))
}

/// Extract the `page` parameter from the `next_page` URL the API returns
fn cursor_from_next_page(next_page: Option<&str>) -> Option<String> {
    let url = Url::parse(next_page?).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())
        .filter(|value| parse_cursor(value).is_ok())
}

/// URL without the access token, safe to log
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn api_root() -> Json<serde_json::Value> {
        Json(json!({
            "refs": [
                {"id": "preview", "ref": "preview-ref", "isMasterRef": false},
                {"id": "master", "ref": "master-ref", "isMasterRef": true}
            ]
        }))
    }

    async fn search(Query(params): Query<HashMap<String, String>>) -> Response {
        if params.get("ref").map(String::as_str) != Some("master-ref") {
            return (StatusCode::BAD_REQUEST, "bad ref").into_response();
        }
        let q = params.get("q").cloned().unwrap_or_default();

        if q.contains("my.post-id.uid") {
            if q.contains(r#""como-utilizar-hooks""#) {
                return Json(json!({
                    "results": [{
                        "uid": "como-utilizar-hooks",
                        "first_publication_date": "2021-03-15T19:25:28+0000",
                        "data": {
                            "title": "Como utilizar Hooks",
                            "author": "Joseph Oliveira",
                            "banner": {"url": "https://images.example/hooks.png"},
                            "content": [{"heading": "Proin et varius", "body": [{"text": "Lorem ipsum"}]}]
                        }
                    }],
                    "next_page": null
                }))
                .into_response();
            }
            return Json(json!({"results": [], "next_page": null})).into_response();
        }

        let page = params.get("page").cloned().unwrap_or_default();
        let body = match page.as_str() {
            "1" => json!({
                "results": [{
                    "uid": "como-utilizar-hooks",
                    "first_publication_date": "2021-03-15T19:25:28+0000",
                    "data": {"title": "Como utilizar Hooks", "subtitle": "Pensando em sincronização", "author": "Joseph Oliveira"}
                }],
                "next_page": "https://repo.cdn.prismic.io/api/v2/documents/search?ref=master-ref&page=2&pageSize=1"
            }),
            _ => json!({
                "results": [{
                    "uid": "criando-um-app-cra-do-zero",
                    "first_publication_date": "2021-03-10T19:25:28+0000",
                    "data": {"title": "Criando um app CRA do zero", "subtitle": "Tudo sobre", "author": "Danilo Vieira"}
                }],
                "next_page": null
            }),
        };
        Json(body).into_response()
    }

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v2", addr)
    }

    #[test]
    fn test_cursor_from_next_page() {
        assert_eq!(
            cursor_from_next_page(Some(
                "https://repo.cdn.prismic.io/api/v2/documents/search?ref=x&page=3&pageSize=1"
            )),
            Some("3".to_string())
        );
        assert_eq!(cursor_from_next_page(None), None);
        assert_eq!(cursor_from_next_page(Some("not a url")), None);
    }

    #[test]
    fn test_parse_cursor_rejects_garbage() {
        assert!(parse_cursor("0").is_err());
        assert!(parse_cursor("abc").is_err());
        assert_eq!(parse_cursor("2").unwrap(), 2);
    }

    #[test]
    fn test_redact_strips_token() {
        let url = Url::parse("https://repo.example/api/v2?ref=a&access_token=secret").unwrap();
        assert_eq!(redact(&url), "https://repo.example/api/v2?ref=a");
    }

    #[tokio::test]
    async fn test_fetch_pages_follow_cursor() {
        let endpoint = spawn_stub().await;
        let client = PrismicClient::new(&endpoint, None, "post-id").unwrap();

        let first = client.fetch_page(1, None).await.unwrap();
        assert_eq!(first.results.len(), 1);
        assert_eq!(first.results[0].uid, "como-utilizar-hooks");
        assert_eq!(first.results[0].subtitle, "Pensando em sincronização");
        assert_eq!(first.next_page_cursor.as_deref(), Some("2"));

        let second = client.fetch_page(1, Some("2")).await.unwrap();
        assert_eq!(second.results[0].uid, "criando-um-app-cra-do-zero");
        assert!(!second.has_next());
    }

    #[tokio::test]
    async fn test_list_all_uids_walks_every_page() {
        let endpoint = spawn_stub().await;
        let client = PrismicClient::new(&endpoint, None, "post-id").unwrap();
        let uids = client.list_all_uids().await.unwrap();
        assert_eq!(uids, vec!["como-utilizar-hooks", "criando-um-app-cra-do-zero"]);
    }

    #[tokio::test]
    async fn test_fetch_by_uid() {
        let endpoint = spawn_stub().await;
        let client = PrismicClient::new(&endpoint, None, "post-id").unwrap();

        let post = client.fetch_by_uid("como-utilizar-hooks").await.unwrap();
        assert_eq!(post.title, "Como utilizar Hooks");
        assert_eq!(post.banner_url, "https://images.example/hooks.png");
        assert_eq!(post.full_text(), "Lorem ipsum");

        let missing = client.fetch_by_uid("nope").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_http_error_maps_to_status() {
        let endpoint = spawn_stub().await;
        let client =
            PrismicClient::new(&endpoint.replace("/api/v2", "/missing"), None, "post-id").unwrap();
        match client.fetch_page(1, None).await {
            Err(ContentError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {:?}", other.map(|p| p.results)),
        }
    }
}
