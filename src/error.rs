use thiserror::Error;

/// Failure of a single search request or of a whole search phase.
#[derive(Debug, Error)]
pub enum SearchError {
  #[error("YouTube API key is not configured (set YOUTUBE_API_KEY or api_key in prefs.toml)")]
  MissingApiKey,

  #[error("YouTube API quota exhausted (HTTP {status}): {message}")]
  QuotaExceeded { status: u16, message: String },

  #[error("YouTube API request forbidden: {message}")]
  Forbidden { message: String },

  #[error("YouTube API request failed with status {status}: {message}")]
  Status { status: u16, message: String },

  #[error("YouTube API request failed: {0}")]
  Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for SearchError {
  /// Drops the request URL, whose query string holds the API key.
  fn from(e: reqwest::Error) -> Self {
    SearchError::Transport(e.without_url())
  }
}

impl SearchError {
  /// Whether backing off and retrying may succeed.
  pub fn is_quota_exhausted(&self) -> bool {
    matches!(self, SearchError::QuotaExceeded { .. })
  }

  /// HTTP status carried by the failure, if any.
  pub fn status(&self) -> Option<u16> {
    match self {
      SearchError::QuotaExceeded { status, .. } | SearchError::Status { status, .. } => Some(*status),
      SearchError::Forbidden { .. } => Some(403),
      SearchError::Transport(e) => e.status().map(|s| s.as_u16()),
      SearchError::MissingApiKey => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_quota_errors_are_transient() {
    assert!(SearchError::QuotaExceeded { status: 403, message: String::new() }.is_quota_exhausted());
    assert!(!SearchError::Forbidden { message: String::new() }.is_quota_exhausted());
    assert!(!SearchError::Status { status: 500, message: String::new() }.is_quota_exhausted());
    assert!(!SearchError::MissingApiKey.is_quota_exhausted());
  }

  #[test]
  fn status_codes() {
    assert_eq!(SearchError::Status { status: 404, message: String::new() }.status(), Some(404));
    assert_eq!(SearchError::Forbidden { message: String::new() }.status(), Some(403));
    assert_eq!(SearchError::MissingApiKey.status(), None);
  }
}
