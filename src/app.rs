use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::{embed_url, watch_url};
use crate::messages::{Locale, Message};
use crate::player::{VideoPlayer, open_in_browser};
use crate::retry::RetryPolicy;
use crate::search::{
  Channel, ChannelOutcome, SamplerLimits, SearchEvent, VideoOutcome, normalize_query, pick_random, run_search,
};
use crate::theme::{THEMES, Theme, theme_index};
use crate::youtube::{SearchProvider, YouTubeClient};

/// Transient state of the current search. Reset when a new search starts.
#[derive(Debug, Default)]
pub struct SearchState {
  pub query: String,
  pub channel: Option<ChannelOutcome>,
  pub video: Option<VideoOutcome>,
  pub loading: bool,
  pub video_ids: Vec<String>,
  pub selected: Option<String>,
  /// Incremented per search; events from older searches are dropped.
  pub generation: u64,
}

impl SearchState {
  pub fn resolved_channel(&self) -> Option<&Channel> {
    match &self.channel {
      Some(ChannelOutcome::Resolved(channel)) => Some(channel),
      _ => None,
    }
  }
}

pub struct App<P: SearchProvider + 'static = YouTubeClient> {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub theme_index: usize,
  pub locale: Locale,
  pub state: SearchState,
  pub player: VideoPlayer,
  /// Errors outside the search workflow (playback, browser hand-off).
  pub last_error: Option<String>,
  pub should_quit: bool,
  provider: Arc<P>,
  api_key: Option<String>,
  limits: SamplerLimits,
  policy: RetryPolicy,
  events_tx: mpsc::UnboundedSender<SearchEvent>,
  events_rx: mpsc::UnboundedReceiver<SearchEvent>,
}

impl<P: SearchProvider + 'static> App<P> {
  pub fn new(provider: P, api_key: Option<String>, locale: Locale, theme_name: Option<&str>) -> Self {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      theme_index: theme_index(theme_name),
      locale,
      state: SearchState::default(),
      player: VideoPlayer::new(),
      last_error: None,
      should_quit: false,
      provider: Arc::new(provider),
      api_key,
      limits: SamplerLimits::default(),
      policy: RetryPolicy::default(),
      events_tx,
      events_rx,
    }
  }

  #[cfg(test)]
  pub fn with_limits(mut self, limits: SamplerLimits, policy: RetryPolicy) -> Self {
    self.limits = limits;
    self.policy = policy;
    self
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is bounded by theme_index() and the modulo in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    let mut config = Config::load();
    config.theme_name = Some(self.theme().name.to_string());
    config.save();
  }

  pub fn text(&self, message: Message) -> &'static str {
    message.text(self.locale)
  }

  /// Start a search for the current input. Blank input is ignored and leaves
  /// all state untouched. Returns whether a search was started.
  pub fn submit_search(&mut self) -> bool {
    let Some(query) = normalize_query(&self.input).map(str::to_string) else {
      return false;
    };

    let generation = self.state.generation + 1;
    self.state = SearchState { query: query.clone(), loading: true, generation, ..SearchState::default() };
    self.last_error = None;
    info!(generation, query = %query, "search triggered");

    let provider = Arc::clone(&self.provider);
    let api_key = self.api_key.clone();
    let (limits, policy) = (self.limits, self.policy);
    let tx = self.events_tx.clone();
    tokio::spawn(async move {
      run_search(provider.as_ref(), api_key.as_deref(), &query, generation, limits, policy, &tx).await;
    });
    true
  }

  /// Apply one workflow event to the state. Events from superseded searches
  /// are discarded.
  pub fn apply_event(&mut self, event: SearchEvent) {
    if event.generation() != self.state.generation {
      debug!(stale = event.generation(), current = self.state.generation, "discarding stale search event");
      return;
    }

    match event {
      SearchEvent::ChannelResolved { outcome, .. } => {
        self.state.channel = Some(outcome);
      }
      SearchEvent::VideosSampled { outcome, ids, .. } => {
        match &outcome {
          VideoOutcome::Sampled { selected, total } => {
            info!(video_id = %selected, total, "video selected");
            self.state.selected = Some(selected.clone());
            self.state.video_ids = ids;
          }
          VideoOutcome::Empty => {
            self.state.selected = None;
            self.state.video_ids.clear();
          }
          VideoOutcome::Failed(e) => {
            warn!(err = %e, "video collection failed");
          }
        }
        self.state.video = Some(outcome);
      }
      SearchEvent::Finished { .. } => {
        self.state.loading = false;
      }
    }
  }

  /// Drain every workflow event that has already arrived.
  pub fn check_pending(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      self.apply_event(event);
    }
  }

  /// Block until the current search has finished.
  pub async fn wait_for_search(&mut self) {
    while self.state.loading {
      match self.events_rx.recv().await {
        Some(event) => self.apply_event(event),
        None => break,
      }
    }
  }

  /// Pick a different video from the ids already collected.
  pub fn reroll(&mut self) {
    if self.state.loading {
      return;
    }
    if let Some(id) = pick_random(&self.state.video_ids, &mut rand::rng()) {
      info!(video_id = %id, "video re-rolled");
      self.state.selected = Some(id.to_string());
    }
  }

  pub fn selected_embed_url(&self) -> Option<String> {
    self.state.selected.as_deref().map(embed_url)
  }

  /// Channel panel text: the channel title, or the message for the outcome.
  pub fn channel_display(&self) -> Option<String> {
    let outcome = self.state.channel.as_ref()?;
    Some(match outcome {
      ChannelOutcome::Resolved(channel) => channel.title.clone(),
      ChannelOutcome::NotFound => self.text(Message::ChannelNotFound).to_string(),
      ChannelOutcome::Failed(e) => self.text(Message::for_error(e)).to_string(),
    })
  }

  /// Video panel text when there is no selection to show.
  pub fn video_notice(&self) -> Option<&'static str> {
    match self.state.video.as_ref()? {
      VideoOutcome::Sampled { .. } => None,
      VideoOutcome::Empty => Some(self.text(Message::NoVideos)),
      VideoOutcome::Failed(e) => Some(self.text(Message::for_error(e))),
    }
  }

  /// Status line while a search is running.
  pub fn progress(&self) -> Option<&'static str> {
    if !self.state.loading {
      return None;
    }
    if self.state.resolved_channel().is_some() {
      Some(self.text(Message::Sampling))
    } else {
      Some(self.text(Message::Searching))
    }
  }

  pub async fn play_selected(&mut self) {
    let Some(video_id) = self.state.selected.clone() else { return };
    if let Err(e) = self.player.play(&video_id, &watch_url(&video_id)).await {
      self.last_error = Some(format!("Playback error: {:#}", e));
    }
  }

  pub async fn stop_playback(&mut self) -> Result<()> {
    self.player.stop().await
  }

  pub fn open_selected(&mut self) {
    let Some(video_id) = self.state.selected.as_deref() else { return };
    if let Err(e) = open_in_browser(&watch_url(video_id)) {
      self.last_error = Some(format!("Failed to open browser: {:#}", e));
    }
  }
}
