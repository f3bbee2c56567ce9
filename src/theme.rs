use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "sky",
    bg: Color::Rgb(15, 23, 42),
    fg: Color::Rgb(226, 232, 240),
    accent: Color::Rgb(125, 211, 252),
    muted: Color::Rgb(100, 116, 139),
    border: Color::Rgb(51, 65, 85),
    status: Color::Rgb(250, 204, 21),
    error: Color::Rgb(248, 113, 113),
    key_fg: Color::Rgb(15, 23, 42),
    key_bg: Color::Rgb(125, 211, 252),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 250, 249),
    fg: Color::Rgb(41, 37, 36),
    accent: Color::Rgb(37, 99, 235),
    muted: Color::Rgb(120, 113, 108),
    border: Color::Rgb(214, 211, 209),
    status: Color::Rgb(180, 83, 9),
    error: Color::Rgb(185, 28, 28),
    key_fg: Color::Rgb(250, 250, 249),
    key_bg: Color::Rgb(37, 99, 235),
  },
  Theme {
    name: "terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Cyan,
    muted: Color::DarkGray,
    border: Color::Gray,
    status: Color::Yellow,
    error: Color::Red,
    key_fg: Color::Black,
    key_bg: Color::Cyan,
  },
];

/// Index of the theme named `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_by_name() {
    assert_eq!(theme_index(Some("paper")), 1);
    assert_eq!(theme_index(Some("missing")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
