use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Most suggestions shown under the command line
const MAX_SUGGESTIONS: usize = 6;

/// What the command line reports to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Enter pressed; the resolved command line
  Submitted(String),
  Cancelled,
}

/// `:` command line with autocomplete over the command table.
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.selected = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected = 0;
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  /// Move the highlighted suggestion by `delta`, wrapping around.
  fn step(&mut self, delta: isize) {
    let count = self.suggestions().len() as isize;
    if count > 0 {
      self.selected = (self.selected as isize + delta).rem_euclid(count) as usize;
    }
  }

  /// `:` opens the line; once open it takes every key until Enter or Esc.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        KeyResult::Event(CommandEvent::Cancelled)
      }
      KeyCode::Enter => {
        let line = self.resolve_command();
        self.close();
        KeyResult::Event(CommandEvent::Submitted(line))
      }
      KeyCode::Tab | KeyCode::Down => {
        self.step(1);
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.step(-1);
        KeyResult::Handled
      }
      _ => {
        if self.input.handle_key(key) == InputResult::Consumed {
          self.selected = 0;
        }
        KeyResult::Handled
      }
    }
  }

  /// The command line to run: the highlighted suggestion's name plus any
  /// arguments typed after the first word.
  fn resolve_command(&self) -> String {
    let value = self.input.value().trim();
    let args = value
      .split_once(char::is_whitespace)
      .map(|(_, args)| args.trim())
      .unwrap_or("");

    match self.suggestions().get(self.selected) {
      Some(cmd) if args.is_empty() => cmd.name.to_string(),
      Some(cmd) => format!("{} {}", cmd.name, args),
      None => value.to_string(),
    }
  }

  /// Draw the line and its suggestions over the top-left of `area`.
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS);
    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = (3 + shown as u16).min(area.height.saturating_sub(1));
    let overlay = Rect::new(area.x + 1, area.y + 1, width, height);

    let mut prompt = vec![Span::styled(":", Style::default().fg(Color::Yellow))];
    prompt.extend(self.input.spans(Style::default()));
    let mut lines = vec![Line::from(prompt)];

    for (i, cmd) in suggestions.iter().take(shown).enumerate() {
      let mut line = Line::from(vec![
        Span::styled(format!(" {:<12}", cmd.name), Style::default().fg(Color::Cyan)),
        Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
      ]);
      if i == self.selected {
        line = line.style(Style::default().bg(Color::DarkGray));
      }
      lines.push(line);
    }

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ")
      .title_bottom(Line::from(" tab: next  enter: run ").right_aligned());

    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn submit(text: &str, tabs: usize) -> KeyResult<CommandEvent> {
    let mut input = CommandInput::new();
    input.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      input.handle_key(key(KeyCode::Char(c)));
    }
    for _ in 0..tabs {
      input.handle_key(key(KeyCode::Tab));
    }
    input.handle_key(key(KeyCode::Enter))
  }

  #[test]
  fn test_colon_activates() {
    let mut input = CommandInput::new();
    assert_eq!(input.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
    assert_eq!(input.handle_key(key(KeyCode::Char(':'))), KeyResult::Handled);
    assert!(input.is_active());
  }

  #[test]
  fn test_prefix_resolves_to_suggestion() {
    assert_eq!(
      submit("ref", 0),
      KeyResult::Event(CommandEvent::Submitted("refresh".to_string()))
    );
  }

  #[test]
  fn test_arguments_are_kept() {
    assert_eq!(
      submit("todo 5", 0),
      KeyResult::Event(CommandEvent::Submitted("todo 5".to_string()))
    );
  }

  #[test]
  fn test_tab_moves_selection() {
    // "todo" matches todo exactly, then todos by prefix
    assert_eq!(
      submit("todo", 1),
      KeyResult::Event(CommandEvent::Submitted("todos".to_string()))
    );
  }

  #[test]
  fn test_paths_pass_through() {
    assert_eq!(
      submit("/todos/9", 0),
      KeyResult::Event(CommandEvent::Submitted("/todos/9".to_string()))
    );
  }

  #[test]
  fn test_escape_cancels_and_typing_is_swallowed() {
    let mut input = CommandInput::new();
    input.handle_key(key(KeyCode::Char(':')));
    assert_eq!(input.handle_key(key(KeyCode::F(5))), KeyResult::Handled);
    assert_eq!(
      input.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(CommandEvent::Cancelled)
    );
    assert!(!input.is_active());
  }

  #[test]
  fn test_backtab_wraps_to_last_suggestion() {
    let mut input = CommandInput::new();
    input.handle_key(key(KeyCode::Char(':')));
    input.handle_key(key(KeyCode::BackTab));
    assert_eq!(input.selected, commands::COMMANDS.len() - 1);
  }
}
