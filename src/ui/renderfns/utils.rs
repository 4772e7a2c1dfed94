use ratatui::prelude::Color;

/// Truncate to `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    return s.to_string();
  }
  let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
  format!("{}...", kept)
}

/// Badge text for a todo's completion
pub fn completed_label(completed: bool) -> &'static str {
  if completed {
    "Complete"
  } else {
    "Incomplete"
  }
}

/// Display color for a todo's completion
pub fn completed_color(completed: bool) -> Color {
  if completed {
    Color::Green
  } else {
    Color::Red
  }
}
