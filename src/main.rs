mod app;
mod config;
mod constants;
mod error;
mod input;
mod messages;
mod player;
mod retry;
mod search;
mod theme;
mod ui;
mod youtube;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{APP_NAME, Config};
use constants::watch_url;
use messages::{Locale, Message};
use search::{ChannelOutcome, VideoOutcome};
use youtube::YouTubeClient;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// YouTube Data API key (falls back to `api_key` in prefs.toml)
  #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Search once for this channel, print the result and exit
  #[arg(short, long)]
  query: Option<String>,

  /// With --query: hand the selected video to mpv
  #[arg(long, requires = "query")]
  play: bool,

  /// Message language (default: `language` in prefs.toml, else en)
  #[arg(long, value_enum)]
  lang: Option<Locale>,

  /// Print shell completions and exit
  #[arg(long, value_enum, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a file in the data directory; the terminal belongs to the TUI.
fn init_logging() -> Option<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", APP_NAME)?;
  let log_dir = dirs.data_local_dir();
  std::fs::create_dir_all(log_dir).ok()?;

  let appender = tracing_appender::rolling::never(log_dir, format!("{}.log", APP_NAME));
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<ExitCode> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), APP_NAME, &mut std::io::stdout());
    return Ok(ExitCode::SUCCESS);
  }

  let _guard = init_logging();
  let config = Config::load();
  let locale = args.lang.unwrap_or_else(|| config.language.as_deref().map(Locale::from_config).unwrap_or_default());
  let api_key = config.resolve_api_key(args.api_key.clone());
  if api_key.is_none() {
    tracing::error!("API key is missing; set YOUTUBE_API_KEY or api_key in prefs.toml");
  }

  let client = YouTubeClient::new()?;
  let mut app = App::new(client, api_key, locale, config.theme_name.as_deref());
  info!(version = env!("CARGO_PKG_VERSION"), locale = locale.label(), "starting");

  if let Some(query) = args.query {
    return run_once(app, query, args.play).await;
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.stop_playback().await.context("Failed to stop playback on exit")?;
  result.map(|_| ExitCode::SUCCESS)
}

/// Headless mode: one search, result on stdout, messages on stderr.
async fn run_once(mut app: App, query: String, play: bool) -> Result<ExitCode> {
  app.input = query;
  if !app.submit_search() {
    eprintln!("{}", app.text(Message::Prompt));
    return Ok(ExitCode::FAILURE);
  }
  app.wait_for_search().await;

  match &app.state.channel {
    Some(ChannelOutcome::Resolved(channel)) => println!("channel: {} ({})", channel.title, channel.id),
    _ => {
      eprintln!("{}", app.channel_display().unwrap_or_default());
      return Ok(ExitCode::FAILURE);
    }
  }

  let Some(video_id) = app.state.selected.clone() else {
    eprintln!("{}", app.video_notice().unwrap_or(app.text(Message::NoVideos)));
    return Ok(ExitCode::FAILURE);
  };
  if let Some(VideoOutcome::Sampled { total, .. }) = &app.state.video {
    println!("videos: {}", total);
  }
  println!("video: {}", video_id);
  println!("embed: {}", app.selected_embed_url().unwrap_or_default());
  println!("watch: {}", watch_url(&video_id));

  if play {
    app.play_selected().await;
    if let Some(err) = &app.last_error {
      eprintln!("{}", err);
      return Ok(ExitCode::FAILURE);
    }
  }
  Ok(ExitCode::SUCCESS)
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending();
    app.player.check_mpv_status();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
