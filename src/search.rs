//! Channel-resolve, paginate, sample: the search workflow.
//!
//! A search runs in two sequential phases. The resolver looks up the first
//! channel matching the query; the sampler pages through that channel's
//! videos (bounded by `max_pages`) and picks one id uniformly at random.
//! Each phase reports its own outcome so a failed video phase never hides a
//! successfully resolved channel.

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::SearchError;
use crate::retry::{RetryPolicy, retry_on_quota};
use crate::youtube::{SearchProvider, SearchRequest};

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
  pub id: String,
  pub title: String,
}

#[derive(Debug)]
pub enum ChannelOutcome {
  Resolved(Channel),
  NotFound,
  Failed(SearchError),
}

#[derive(Debug)]
pub enum VideoOutcome {
  /// At least one video was collected and `selected` is one of them.
  Sampled { total: usize, selected: String },
  /// The channel has no videos the search endpoint returns.
  Empty,
  Failed(SearchError),
}

/// Limits for the video pagination loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerLimits {
  pub page_size: u32,
  pub max_pages: usize,
}

impl Default for SamplerLimits {
  fn default() -> Self {
    let c = crate::constants::constants();
    Self { page_size: c.page_size, max_pages: c.max_pages }
  }
}

/// Progress of one search, tagged with the generation that started it.
#[derive(Debug)]
pub enum SearchEvent {
  ChannelResolved { generation: u64, outcome: ChannelOutcome },
  VideosSampled { generation: u64, outcome: VideoOutcome, ids: Vec<String> },
  Finished { generation: u64 },
}

impl SearchEvent {
  pub fn generation(&self) -> u64 {
    match self {
      SearchEvent::ChannelResolved { generation, .. }
      | SearchEvent::VideosSampled { generation, .. }
      | SearchEvent::Finished { generation } => *generation,
    }
  }
}

/// Trim a raw query; `None` when nothing is left.
pub fn normalize_query(raw: &str) -> Option<&str> {
  let q = raw.trim();
  if q.is_empty() { None } else { Some(q) }
}

fn require_key(api_key: Option<&str>) -> Result<&str, SearchError> {
  api_key.map(str::trim).filter(|k| !k.is_empty()).ok_or(SearchError::MissingApiKey)
}

/// Look up the first channel matching `query`.
pub async fn resolve_channel<P: SearchProvider>(
  provider: &P,
  api_key: Option<&str>,
  query: &str,
  policy: RetryPolicy,
) -> Result<Option<Channel>, SearchError> {
  let key = require_key(api_key)?;
  let request = SearchRequest::channels(key, query);
  let page = retry_on_quota(policy, || provider.search(&request)).await?;

  let Some(first) = page.items.first() else {
    return Ok(None);
  };
  let Some(id) = first.channel_id() else {
    warn!(query = %query, "search: first channel result carries no channel id");
    return Ok(None);
  };
  let title = first.title().unwrap_or(id).to_string();
  Ok(Some(Channel { id: id.to_string(), title }))
}

/// Collect the ids of a channel's videos, following continuation tokens for at
/// most `limits.max_pages` pages. Entries without a video id are dropped.
pub async fn collect_video_ids<P: SearchProvider>(
  provider: &P,
  api_key: Option<&str>,
  channel_id: &str,
  limits: SamplerLimits,
  policy: RetryPolicy,
) -> Result<Vec<String>, SearchError> {
  let key = require_key(api_key)?;
  let mut ids = Vec::new();
  let mut page_token: Option<String> = None;

  for page_no in 1..=limits.max_pages {
    let request = SearchRequest::channel_videos(key, channel_id, limits.page_size, page_token.as_deref());
    let page = retry_on_quota(policy, || provider.search(&request)).await?;

    let before = ids.len();
    ids.extend(page.items.iter().filter_map(|item| item.video_id()).map(str::to_string));
    info!(page = page_no, added = ids.len() - before, total = ids.len(), "search: video page collected");

    match page.continuation() {
      Some(token) => page_token = Some(token.to_string()),
      None => break,
    }
  }
  Ok(ids)
}

/// Uniformly pick one id; `None` for an empty slice.
pub fn pick_random<'a, R: Rng + ?Sized>(ids: &'a [String], rng: &mut R) -> Option<&'a str> {
  if ids.is_empty() {
    return None;
  }
  let idx = rng.random_range(0..ids.len());
  Some(ids[idx].as_str())
}

/// Collect a channel's videos and sample one of them.
pub async fn sample_video<P: SearchProvider>(
  provider: &P,
  api_key: Option<&str>,
  channel_id: &str,
  limits: SamplerLimits,
  policy: RetryPolicy,
) -> (VideoOutcome, Vec<String>) {
  match collect_video_ids(provider, api_key, channel_id, limits, policy).await {
    Ok(ids) => match pick_random(&ids, &mut rand::rng()) {
      Some(selected) => {
        let outcome = VideoOutcome::Sampled { total: ids.len(), selected: selected.to_string() };
        (outcome, ids)
      }
      None => {
        warn!(channel_id = %channel_id, "search: no videos found for channel");
        (VideoOutcome::Empty, ids)
      }
    },
    Err(e) => {
      warn!(channel_id = %channel_id, err = %e, "search: failed to collect videos");
      (VideoOutcome::Failed(e), Vec::new())
    }
  }
}

/// Run both phases for one search generation, reporting through `tx`.
/// The video phase only runs when a channel was resolved.
pub async fn run_search<P: SearchProvider>(
  provider: &P,
  api_key: Option<&str>,
  query: &str,
  generation: u64,
  limits: SamplerLimits,
  policy: RetryPolicy,
  tx: &mpsc::UnboundedSender<SearchEvent>,
) {
  info!(generation, query = %query, "search: resolving channel");
  let outcome = match resolve_channel(provider, api_key, query, policy).await {
    Ok(Some(channel)) => ChannelOutcome::Resolved(channel),
    Ok(None) => ChannelOutcome::NotFound,
    Err(e) => {
      warn!(generation, status = ?e.status(), err = %e, "search: channel lookup failed");
      ChannelOutcome::Failed(e)
    }
  };

  let channel_id = match &outcome {
    ChannelOutcome::Resolved(channel) => {
      info!(generation, channel_id = %channel.id, title = %channel.title, "search: channel resolved");
      Some(channel.id.clone())
    }
    _ => None,
  };
  let _ = tx.send(SearchEvent::ChannelResolved { generation, outcome });

  if let Some(channel_id) = channel_id {
    let (outcome, ids) = sample_video(provider, api_key, &channel_id, limits, policy).await;
    let _ = tx.send(SearchEvent::VideosSampled { generation, outcome, ids });
  }

  let _ = tx.send(SearchEvent::Finished { generation });
}
