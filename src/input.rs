use anyhow::{Context, Result};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::youtube::SearchProvider;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event<P: SearchProvider + 'static>(app: &mut App<P>, key: KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('r') => app.reroll(),
      KeyCode::Char('p') => app.play_selected().await,
      KeyCode::Char('s') => app.stop_playback().await.context("Failed to stop playback")?,
      KeyCode::Char('o') => app.open_selected(),
      _ => {}
    }
    return Ok(());
  }

  handle_input_key(app, key);
  Ok(())
}

fn handle_input_key<P: SearchProvider + 'static>(app: &mut App<P>, key: KeyEvent) {
  app.last_error = None;
  match key.code {
    KeyCode::Enter => {
      app.submit_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if app.input.is_empty() {
        app.should_quit = true;
      } else {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      }
    }
    _ => {}
  }
}
