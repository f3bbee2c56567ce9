//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so there is no runtime file
//! I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // YouTube Data API
  pub api_base_url: String,
  pub embed_url_prefix: String,
  pub watch_url_prefix: String,
  pub request_timeout_secs: u64,

  // Video sampling
  pub page_size: u32,
  pub max_pages: usize,

  // Quota backoff
  pub retry_base_delay_ms: u64,
  pub retry_max_attempts: u32,
}

impl Constants {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Embeddable player reference for a video id.
pub fn embed_url(video_id: &str) -> String {
  format!("{}{}", constants().embed_url_prefix, video_id)
}

/// Watch-page URL for a video id, used when handing off to mpv or a browser.
pub fn watch_url(video_id: &str) -> String {
  format!("{}{}", constants().watch_url_prefix, video_id)
}
