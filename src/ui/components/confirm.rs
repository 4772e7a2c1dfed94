use super::KeyResult;
use crate::ui::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no question about one item.
#[derive(Debug, Clone)]
pub struct Confirm<T> {
  question: String,
  subject: T,
}

impl<T: Clone> Confirm<T> {
  pub fn new(question: impl Into<String>, subject: T) -> Self {
    Self {
      question: question.into(),
      subject,
    }
  }

  /// `y` answers with the subject, `n`/`Esc` with `None`.
  pub fn handle_key(&self, key: KeyEvent) -> KeyResult<Option<T>> {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => KeyResult::Event(Some(self.subject.clone())),
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => KeyResult::Event(None),
      _ => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let modal = centered_rect(50, 5, area);
    frame.render_widget(Clear, modal);

    let block = Block::default()
      .title(" Confirm ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));

    let lines = vec![
      Line::from(self.question.as_str()),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(lines)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, modal);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_answers() {
    let confirm = Confirm::new("Are you sure you want to delete this todo?", 7u64);
    assert_eq!(confirm.handle_key(key(KeyCode::Char('y'))), KeyResult::Event(Some(7)));
    assert_eq!(confirm.handle_key(key(KeyCode::Esc)), KeyResult::Event(None));
    assert_eq!(confirm.handle_key(key(KeyCode::Char('d'))), KeyResult::Handled);
  }
}
