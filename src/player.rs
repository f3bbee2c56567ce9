use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// Hands a selected video to mpv. Playback itself happens in mpv's own window.
#[derive(Default)]
pub struct VideoPlayer {
  current_process: Option<Child>,
  pub current_video: Option<String>,
}

impl VideoPlayer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  /// Reap mpv once the user has closed its window.
  pub fn check_mpv_status(&mut self) {
    if let Some(child) = self.current_process.as_mut()
      && !matches!(child.try_wait(), Ok(None))
    {
      info!("player: mpv exited");
      self.current_process = None;
      self.current_video = None;
    }
  }

  pub async fn play(&mut self, video_id: &str, url: &str) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;

    let child = Command::new("mpv")
      .args(["--force-window=yes", "--really-quiet", "--", url])
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
          anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
        } else {
          anyhow!(e).context("Failed to spawn mpv process")
        }
      })?;

    info!(video_id = %video_id, "player: mpv started");
    self.current_process = Some(child);
    self.current_video = Some(video_id.to_string());
    Ok(())
  }

  pub async fn stop(&mut self) -> Result<()> {
    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
      info!("player: mpv stopped");
    }
    self.current_video = None;
    Ok(())
  }
}

/// Open `url` in the platform's default browser.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";

  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {}", cmd))?;

  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    if let Err(e) = child.wait() {
      warn!(err = %e, "browser launcher did not exit cleanly");
    }
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn idle_player_is_not_playing() {
    let mut player = VideoPlayer::new();
    player.check_mpv_status();
    assert!(!player.is_playing());
    player.stop().await.unwrap();
    assert!(player.current_video.is_none());
  }
}
