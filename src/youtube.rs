use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::constants::constants;
use crate::error::SearchError;

/// Entity kind a search is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
  Channel,
  Video,
}

impl ResultKind {
  pub fn as_str(self) -> &'static str {
    match self {
      ResultKind::Channel => "channel",
      ResultKind::Video => "video",
    }
  }
}

/// Parameters of one call to the search endpoint.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
  pub api_key: &'a str,
  pub kind: ResultKind,
  pub query: Option<&'a str>,
  pub channel_id: Option<&'a str>,
  pub max_results: Option<u32>,
  pub page_token: Option<&'a str>,
}

impl<'a> SearchRequest<'a> {
  /// Channel lookup by free-text query.
  pub fn channels(api_key: &'a str, query: &'a str) -> Self {
    Self { api_key, kind: ResultKind::Channel, query: Some(query), channel_id: None, max_results: None, page_token: None }
  }

  /// One page of a channel's videos.
  pub fn channel_videos(api_key: &'a str, channel_id: &'a str, page_size: u32, page_token: Option<&'a str>) -> Self {
    Self {
      api_key,
      kind: ResultKind::Video,
      query: None,
      channel_id: Some(channel_id),
      max_results: Some(page_size),
      page_token,
    }
  }

  fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("part", "snippet".to_string()), ("type", self.kind.as_str().to_string())];
    if let Some(q) = self.query {
      pairs.push(("q", q.to_string()));
    }
    if let Some(id) = self.channel_id {
      pairs.push(("channelId", id.to_string()));
    }
    if let Some(n) = self.max_results {
      pairs.push(("maxResults", n.to_string()));
    }
    if let Some(token) = self.page_token.filter(|t| !t.is_empty()) {
      pairs.push(("pageToken", token.to_string()));
    }
    pairs.push(("key", self.api_key.to_string()));
    pairs
  }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
  pub next_page_token: Option<String>,
  #[serde(default)]
  pub items: Vec<SearchItem>,
}

impl SearchPage {
  /// Continuation token, treating an empty string as absent.
  pub fn continuation(&self) -> Option<&str> {
    self.next_page_token.as_deref().filter(|t| !t.is_empty())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
  #[serde(default)]
  pub id: ItemId,
  pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemId {
  pub channel_id: Option<String>,
  pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
  pub channel_id: Option<String>,
  pub title: Option<String>,
}

impl SearchItem {
  pub fn video_id(&self) -> Option<&str> {
    self.id.video_id.as_deref().filter(|id| !id.is_empty())
  }

  /// Channel id from the snippet, falling back to the resource id.
  pub fn channel_id(&self) -> Option<&str> {
    self
      .snippet
      .as_ref()
      .and_then(|s| s.channel_id.as_deref())
      .or(self.id.channel_id.as_deref())
      .filter(|id| !id.is_empty())
  }

  pub fn title(&self) -> Option<&str> {
    self.snippet.as_ref().and_then(|s| s.title.as_deref())
  }
}

/// A search backend. `YouTubeClient` is the production implementation;
/// anything answering the same requests can stand in for it.
pub trait SearchProvider: Send + Sync {
  fn search(&self, request: &SearchRequest<'_>) -> impl Future<Output = Result<SearchPage, SearchError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: String,
  #[serde(default)]
  errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
  #[serde(default)]
  reason: String,
}

const QUOTA_REASONS: [&str; 4] = ["quotaExceeded", "rateLimitExceeded", "userRateLimitExceeded", "dailyLimitExceeded"];

/// Map a non-2xx response to a `SearchError`.
pub fn classify_error(status: StatusCode, body: &str) -> SearchError {
  let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
  let message = match &parsed {
    Some(env) if !env.error.message.is_empty() => env.error.message.clone(),
    _ => body.trim().to_string(),
  };
  let quota_reason = match &parsed {
    Some(env) => env.error.errors.iter().any(|e| QUOTA_REASONS.contains(&e.reason.as_str())),
    None => body.contains("quotaExceeded"),
  };

  match status {
    StatusCode::TOO_MANY_REQUESTS => SearchError::QuotaExceeded { status: status.as_u16(), message },
    StatusCode::FORBIDDEN if quota_reason => SearchError::QuotaExceeded { status: status.as_u16(), message },
    StatusCode::FORBIDDEN => SearchError::Forbidden { message },
    _ => SearchError::Status { status: status.as_u16(), message },
  }
}

/// HTTP client for the YouTube Data API `search` endpoint.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
  http: Client,
  base_url: String,
}

impl YouTubeClient {
  pub fn new() -> Result<Self> {
    Self::with_base_url(&constants().api_base_url)
  }

  pub fn with_base_url(base_url: &str) -> Result<Self> {
    let http =
      Client::builder().timeout(constants().request_timeout()).build().context("Failed to build HTTP client")?;
    Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
  }
}

impl SearchProvider for YouTubeClient {
  async fn search(&self, request: &SearchRequest<'_>) -> Result<SearchPage, SearchError> {
    let url = format!("{}/search", self.base_url);
    debug!(
      kind = request.kind.as_str(),
      channel_id = request.channel_id.unwrap_or(""),
      page_token = request.page_token.unwrap_or(""),
      "youtube: search request"
    );

    let response = self.http.get(&url).query(&request.query_pairs()).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
          debug!(status = status.as_u16(), err = %e.without_url(), "youtube: failed to read error body");
          String::new()
        }
      };
      return Err(classify_error(status, &body));
    }

    let page: SearchPage = response.json().await?;
    debug!(items = page.items.len(), has_more = page.continuation().is_some(), "youtube: search response");
    Ok(page)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  // --- classify_error ---

  const QUOTA_BODY: &str = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota.","errors":[{"message":"quota","domain":"youtube.quota","reason":"quotaExceeded"}]}}"#;

  #[test]
  fn classify_quota_exceeded() {
    let err = classify_error(StatusCode::FORBIDDEN, QUOTA_BODY);
    assert!(err.is_quota_exhausted());
    assert!(err.to_string().contains("exceeded your quota"));
  }

  #[test]
  fn classify_plain_forbidden() {
    let body = r#"{"error":{"code":403,"message":"API key not valid","errors":[{"reason":"forbidden"}]}}"#;
    let err = classify_error(StatusCode::FORBIDDEN, body);
    assert!(matches!(err, SearchError::Forbidden { ref message } if message == "API key not valid"));
  }

  #[test]
  fn classify_server_error() {
    let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
    assert!(matches!(err, SearchError::Status { status: 500, ref message } if message == "boom"));
  }

  #[test]
  fn classify_unparsed_body_mentioning_quota() {
    let err = classify_error(StatusCode::FORBIDDEN, "quotaExceeded");
    assert!(err.is_quota_exhausted());
  }

  #[test]
  fn classify_too_many_requests() {
    assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, "").is_quota_exhausted());
  }

  // --- SearchPage / SearchItem ---

  #[test]
  fn page_parses_items_and_token() {
    let json = r#"{
      "nextPageToken": "CDIQAA",
      "items": [
        {"id": {"kind": "youtube#video", "videoId": "v1"}, "snippet": {"channelId": "UC1", "title": "First"}},
        {"id": {"kind": "youtube#playlist", "playlistId": "p1"}, "snippet": {"channelId": "UC1", "title": "List"}}
      ]
    }"#;
    let page: SearchPage = serde_json::from_str(json).unwrap();
    assert_eq!(page.continuation(), Some("CDIQAA"));
    assert_eq!(page.items[0].video_id(), Some("v1"));
    assert_eq!(page.items[1].video_id(), None);
    assert_eq!(page.items[1].channel_id(), Some("UC1"));
  }

  #[test]
  fn page_without_items_or_token() {
    let page: SearchPage = serde_json::from_str("{}").unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.continuation(), None);

    let page: SearchPage = serde_json::from_str(r#"{"nextPageToken": ""}"#).unwrap();
    assert_eq!(page.continuation(), None);
  }

  #[test]
  fn channel_id_falls_back_to_resource_id() {
    let item: SearchItem = serde_json::from_str(r#"{"id": {"channelId": "UCx"}, "snippet": {"title": "T"}}"#).unwrap();
    assert_eq!(item.channel_id(), Some("UCx"));
    assert_eq!(item.title(), Some("T"));
  }

  #[test]
  fn query_pairs_skip_empty_page_token() {
    let req = SearchRequest::channel_videos("k", "UC1", 50, Some(""));
    let pairs = req.query_pairs();
    assert!(pairs.iter().all(|(k, _)| *k != "pageToken"));
    assert!(pairs.contains(&("maxResults", "50".to_string())));
    assert!(pairs.contains(&("type", "video".to_string())));
  }

  // --- YouTubeClient over HTTP ---

  #[tokio::test]
  async fn client_sends_channel_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search"))
      .and(query_param("type", "channel"))
      .and(query_param("part", "snippet"))
      .and(query_param("q", "lofi girl"))
      .and(query_param("key", "secret"))
      .respond_with(ResponseTemplate::new(200).set_body_raw(
        r#"{"items":[{"id":{"channelId":"UCSJ4"},"snippet":{"channelId":"UCSJ4","title":"Lofi Girl"}}]}"#,
        "application/json",
      ))
      .expect(1)
      .mount(&server)
      .await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let page = client.search(&SearchRequest::channels("secret", "lofi girl")).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].channel_id(), Some("UCSJ4"));
    assert_eq!(page.items[0].title(), Some("Lofi Girl"));
  }

  #[tokio::test]
  async fn client_sends_page_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search"))
      .and(query_param("channelId", "UC1"))
      .and(query_param("pageToken", "NEXT"))
      .and(query_param("maxResults", "50"))
      .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"items":[]}"#, "application/json"))
      .expect(1)
      .mount(&server)
      .await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let page = client.search(&SearchRequest::channel_videos("k", "UC1", 50, Some("NEXT"))).await.unwrap();
    assert!(page.items.is_empty());
  }

  #[tokio::test]
  async fn client_maps_quota_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search"))
      .respond_with(ResponseTemplate::new(403).set_body_raw(QUOTA_BODY, "application/json"))
      .mount(&server)
      .await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let err = client.search(&SearchRequest::channels("k", "anything")).await.unwrap_err();
    assert!(err.is_quota_exhausted());
    assert_eq!(err.status(), Some(403));
  }

  #[tokio::test]
  async fn client_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).and(path("/search")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let err = client.search(&SearchRequest::channels("k", "anything")).await.unwrap_err();
    assert!(matches!(err, SearchError::Status { status: 503, .. }));
  }

  #[tokio::test]
  async fn client_maps_empty_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search"))
      .respond_with(ResponseTemplate::new(429))
      .mount(&server)
      .await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let err = client.search(&SearchRequest::channels("k", "anything")).await.unwrap_err();
    assert!(matches!(err, SearchError::QuotaExceeded { status: 429, ref message } if message.is_empty()));
  }

  #[tokio::test]
  async fn connection_error_does_not_expose_key() {
    let client = YouTubeClient::with_base_url("http://127.0.0.1:9").unwrap();
    let err = client.search(&SearchRequest::channels("SUPERSECRETKEY", "x")).await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
  }

  #[tokio::test]
  async fn decode_error_does_not_expose_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/search"))
      .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
      .mount(&server)
      .await;

    let client = YouTubeClient::with_base_url(&server.uri()).unwrap();
    let err = client.search(&SearchRequest::channels("SUPERSECRETKEY", "x")).await.unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert!(!err.to_string().contains("SUPERSECRETKEY"));
  }
}
