use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events a prompt reports to its view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// Text changed (every keystroke)
  Changed(String),
  /// Enter pressed
  Submitted(String),
  /// Esc pressed, prompt closed
  Cancelled,
}

/// One-line input overlay the owning view opens and closes.
///
/// Used for the search box and the add-todo box.
#[derive(Debug, Clone)]
pub struct Prompt {
  title: &'static str,
  prefix: &'static str,
  input: TextInput,
  active: bool,
  error: Option<String>,
}

impl Prompt {
  pub fn new(title: &'static str, prefix: &'static str) -> Self {
    Self {
      title,
      prefix,
      input: TextInput::new(),
      active: false,
      error: None,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the prompt prefilled with `value`.
  pub fn open(&mut self, value: &str) {
    self.active = true;
    self.error = None;
    self.input.set_value(value);
  }

  pub fn close(&mut self) {
    self.active = false;
    self.error = None;
    self.input.clear();
  }

  /// Show an error under the input; cleared by the next edit.
  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  /// Handle a key while open. A closed prompt handles nothing.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PromptEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => KeyResult::Event(PromptEvent::Submitted(value)),
      InputResult::Cancelled => {
        self.close();
        KeyResult::Event(PromptEvent::Cancelled)
      }
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Event(PromptEvent::Changed(self.input.value().to_string()))
      }
      // An open prompt swallows everything else
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the overlay at the top-left of `area` if open.
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, hint: &str) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = if self.error.is_some() { 4 } else { 3 };
    let overlay_area = Rect::new(
      area.x + 1,
      area.y + 1,
      width,
      height.min(area.height.saturating_sub(1)),
    );

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_bottom(Line::from(format!(" {} ", hint)).right_aligned());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let mut spans = vec![Span::styled(
      format!("{} ", self.prefix),
      Style::default().fg(Color::Yellow),
    )];
    spans.extend(self.input.spans(Style::default()));

    let mut lines = vec![Line::from(spans)];
    if let Some(error) = &self.error {
      lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_closed_prompt_ignores_keys() {
    let mut prompt = Prompt::new("Search", "/");
    assert_eq!(prompt.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
    assert!(!prompt.is_active());
  }

  #[test]
  fn test_typing_reports_changes() {
    let mut prompt = Prompt::new("Search", "/");
    prompt.open("bu");

    assert_eq!(
      prompt.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(PromptEvent::Changed("buy".to_string()))
    );
    assert_eq!(
      prompt.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PromptEvent::Submitted("buy".to_string()))
    );
    // Submitting leaves closing to the view
    assert!(prompt.is_active());
  }

  #[test]
  fn test_escape_closes_and_clears() {
    let mut prompt = Prompt::new("Add Todo", "+");
    prompt.open("draft");
    prompt.set_error("Title is required.");

    assert_eq!(
      prompt.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(PromptEvent::Cancelled)
    );
    assert!(!prompt.is_active());
    assert_eq!(prompt.input.value(), "");
  }

  #[test]
  fn test_unhandled_keys_are_swallowed_while_open() {
    let mut prompt = Prompt::new("Add Todo", "+");
    prompt.open("");
    assert_eq!(prompt.handle_key(key(KeyCode::F(2))), KeyResult::Handled);
  }
}
