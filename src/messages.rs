use clap::ValueEnum;

use crate::error::SearchError;

/// Language of user-visible messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Locale {
  #[default]
  En,
  Ko,
}

impl Locale {
  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "ko" | "kr" | "korean" => Locale::Ko,
      _ => Locale::En,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Locale::En => "en",
      Locale::Ko => "ko",
    }
  }
}

/// A user-visible message, rendered per locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
  Searching,
  Sampling,
  MissingApiKey,
  ChannelNotFound,
  QuotaExceeded,
  Forbidden,
  GenericError,
  NoVideos,
  Prompt,
}

impl Message {
  /// The message shown for a search failure.
  pub fn for_error(err: &SearchError) -> Self {
    match err {
      SearchError::MissingApiKey => Message::MissingApiKey,
      SearchError::QuotaExceeded { .. } => Message::QuotaExceeded,
      SearchError::Forbidden { .. } => Message::Forbidden,
      SearchError::Status { .. } | SearchError::Transport(_) => Message::GenericError,
    }
  }

  pub fn text(self, locale: Locale) -> &'static str {
    match (self, locale) {
      (Message::Searching, Locale::En) => "Searching…",
      (Message::Searching, Locale::Ko) => "검색 중...",
      (Message::Sampling, Locale::En) => "Collecting videos…",
      (Message::Sampling, Locale::Ko) => "동영상을 불러오는 중...",
      (Message::MissingApiKey, Locale::En) => "API key is not configured.",
      (Message::MissingApiKey, Locale::Ko) => "API 키가 설정되지 않았습니다.",
      (Message::ChannelNotFound, Locale::En) => "Channel not found.",
      (Message::ChannelNotFound, Locale::Ko) => "채널을 찾을 수 없습니다.",
      (Message::QuotaExceeded, Locale::En) => "API quota exceeded. Please try again later.",
      (Message::QuotaExceeded, Locale::Ko) => "API 요청 한도가 초과되었습니다. 잠시 후 다시 시도해 주세요.",
      (Message::Forbidden, Locale::En) => "The API rejected the request (403). Check the API key.",
      (Message::Forbidden, Locale::Ko) => "API 요청이 거부되었습니다 (403). API 키를 확인해 주세요.",
      (Message::GenericError, Locale::En) => "Something went wrong.",
      (Message::GenericError, Locale::Ko) => "오류가 발생했습니다.",
      (Message::NoVideos, Locale::En) => "No videos found for this channel.",
      (Message::NoVideos, Locale::Ko) => "채널에서 동영상을 찾을 수 없습니다.",
      (Message::Prompt, Locale::En) => "Enter a channel name",
      (Message::Prompt, Locale::Ko) => "채널명을 입력하세요",
    }
  }
}
