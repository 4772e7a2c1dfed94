use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::todo::cached_client::validate_title;
use crate::todo::{Todo, TodoPatch};
use crate::ui::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events from the edit modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
  Save(TodoPatch),
  Cancelled,
}

/// Modal for changing a todo's title and completion.
#[derive(Debug, Clone)]
pub struct EditModal {
  id: u64,
  title: TextInput,
  completed: bool,
  error: Option<String>,
  saving: bool,
}

impl EditModal {
  pub fn new(todo: &Todo) -> Self {
    Self {
      id: todo.id,
      title: TextInput::with_value(&todo.title),
      completed: todo.completed,
      error: None,
      saving: false,
    }
  }

  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn set_saving(&mut self, saving: bool) {
    self.saving = saving;
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<EditEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(EditEvent::Cancelled),
      // Nothing else until the save settles
      _ if self.saving => return KeyResult::Handled,
      KeyCode::Tab => {
        self.completed = !self.completed;
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.title.handle_key(key) {
      InputResult::Submitted(title) => match validate_title(&title) {
        Ok(title) => {
          self.error = None;
          KeyResult::Event(EditEvent::Save(TodoPatch {
            title: Some(title),
            completed: Some(self.completed),
          }))
        }
        Err(e) => {
          self.error = Some(e.to_string());
          KeyResult::Handled
        }
      },
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      InputResult::Cancelled | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let modal = centered_rect(60, 8, area);
    frame.render_widget(Clear, modal);

    let block = Block::default()
      .title(format!(" Edit Todo #{} ", self.id))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(modal);
    frame.render_widget(block, modal);

    let label = Style::default().fg(Color::DarkGray);
    let mut title_line = vec![Span::styled("Title: ", label)];
    title_line.extend(self.title.spans(Style::default()));

    let checkbox = if self.completed { "[x]" } else { "[ ]" };
    let mut lines = vec![
      Line::from(title_line),
      Line::from(self.error.clone().unwrap_or_default()).style(Style::default().fg(Color::Red)),
      Line::from(vec![
        Span::styled(checkbox, Style::default().fg(Color::Cyan)),
        Span::raw(" Mark as completed "),
        Span::styled("<tab>", label),
      ]),
      Line::default(),
    ];

    lines.push(if self.saving {
      Line::styled("Saving...", Style::default().fg(Color::Yellow))
    } else {
      Line::from(vec![
        Span::styled("<enter>", Style::default().fg(Color::Cyan)),
        Span::styled(" save   ", label),
        Span::styled("<esc>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", label),
      ])
    });

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn todo() -> Todo {
    Todo {
      id: 3,
      title: "fugiat veniam minus".to_string(),
      completed: false,
      user_id: 1,
    }
  }

  #[test]
  fn test_tab_toggles_completed_and_enter_saves() {
    let mut modal = EditModal::new(&todo());
    modal.handle_key(key(KeyCode::Tab));

    assert_eq!(
      modal.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(EditEvent::Save(TodoPatch {
        title: Some("fugiat veniam minus".to_string()),
        completed: Some(true),
      }))
    );
  }

  #[test]
  fn test_empty_title_shows_error() {
    let mut modal = EditModal::new(&todo());
    modal.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));

    assert_eq!(modal.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(modal.error.as_deref(), Some("Title is required."));

    // Typing clears it
    modal.handle_key(key(KeyCode::Char('x')));
    assert!(modal.error.is_none());
  }

  #[test]
  fn test_saving_blocks_edits_but_not_escape() {
    let mut modal = EditModal::new(&todo());
    modal.set_saving(true);

    assert_eq!(modal.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(
      modal.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(EditEvent::Cancelled)
    );
  }
}
