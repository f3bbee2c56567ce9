use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};

use crate::app::App;
use crate::constants::watch_url;
use crate::messages::Message;
use crate::theme::Theme;
use crate::youtube::SearchProvider;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn panel<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1))
}

// --- UI Rendering ---

pub fn ui<P: SearchProvider + 'static>(frame: &mut Frame, app: &mut App<P>) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, input_area, status_area, channel_area, video_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Min(5),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_input(frame, app, input_area);
  render_status(frame, app, status_area);
  render_channel(frame, app, channel_area);
  render_video(frame, app, video_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ⚄ chanroll ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_input<P: SearchProvider + 'static>(frame: &mut Frame, app: &mut App<P>, area: Rect) {
  let theme = app.theme();
  let title = format!(" {} ", app.text(Message::Prompt));
  let input_block = panel(theme, &title);

  let inner_w = area.width.saturating_sub(4) as usize;
  if inner_w == 0 {
    frame.render_widget(input_block, area);
    return;
  }
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
  frame.set_cursor_position((cursor_x, area.y + 1));
}

fn render_status<P: SearchProvider + 'static>(frame: &mut Frame, app: &App<P>, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = app.progress() {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(video_id) = &app.player.current_video {
    (format!(" ▶ mpv: {}", video_id), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_channel<P: SearchProvider + 'static>(frame: &mut Frame, app: &App<P>, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(4) as usize;
  let line = match (app.channel_display(), app.state.resolved_channel()) {
    (Some(title), Some(_)) => {
      Line::from(Span::styled(truncate_str(&title, inner_w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)))
    }
    (Some(message), None) => Line::from(Span::styled(truncate_str(&message, inner_w), Style::default().fg(theme.error))),
    (None, _) => Line::from(""),
  };
  let title =
    if app.state.query.is_empty() { " Channel ".to_string() } else { format!(" Channel · {} ", app.state.query) };
  frame.render_widget(Paragraph::new(line).block(panel(theme, &title)), area);
}

fn render_video<P: SearchProvider + 'static>(frame: &mut Frame, app: &App<P>, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(4) as usize;

  let lines = if let (Some(video_id), Some(embed)) = (&app.state.selected, app.selected_embed_url()) {
    vec![
      Line::from(""),
      Line::from(vec![
        Span::styled("Video   ", Style::default().fg(theme.muted)),
        Span::styled(video_id.as_str(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
      ]),
      Line::from(vec![
        Span::styled("Pool    ", Style::default().fg(theme.muted)),
        Span::styled(format!("{} videos", app.state.video_ids.len()), Style::default().fg(theme.fg)),
      ]),
      Line::from(""),
      Line::from(Span::styled(
        truncate_str(&embed, inner_w),
        Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
      )),
      Line::from(Span::styled(truncate_str(&watch_url(video_id), inner_w), Style::default().fg(theme.muted))),
    ]
  } else if let Some(notice) = app.video_notice() {
    vec![Line::from(""), Line::from(Span::styled(notice, Style::default().fg(theme.error)))]
  } else {
    vec![
      Line::from(""),
      Line::from(Span::styled("Search a channel to roll one of its videos.", Style::default().fg(theme.muted))),
    ]
  };

  let paragraph = Paragraph::new(lines).alignment(Alignment::Left).block(panel(theme, " Random video "));
  frame.render_widget(paragraph, area);
}

fn render_footer<P: SearchProvider + 'static>(frame: &mut Frame, app: &App<P>, area: Rect) {
  let theme = app.theme();
  let mut keys: Vec<(&str, &str)> = vec![("Enter", "Search")];
  if app.state.selected.is_some() {
    keys.push(("^r", "Re-roll"));
    keys.push(("^p", "Play"));
    keys.push(("^o", "Browser"));
  }
  if app.player.is_playing() {
    keys.push(("^s", "Stop"));
  }
  keys.push(("^t", "Theme"));
  keys.push(("Esc", if app.input.is_empty() { "Quit" } else { "Clear" }));

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let label = format!("{} · {} ", theme.name, app.locale.label());
  let right = Line::from(Span::styled(&label, Style::default().fg(theme.muted)));
  let width = label.chars().count() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width, ..area };
  frame.render_widget(right, right_area);
}
