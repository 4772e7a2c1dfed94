use crate::boundary::Route;
use crate::error::RenderFailure;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Shown for any path that matches no screen
pub struct NotFoundView {
  path: String,
}

impl NotFoundView {
  pub fn new(path: impl Into<String>) -> Self {
    Self { path: path.into() }
  }
}

impl View for NotFoundView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('h') | KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<(), RenderFailure> {
    let block = Block::default()
      .title(" 404 ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let lines = vec![
      Line::styled("Page not found", Style::default().fg(Color::Yellow).bold()),
      Line::styled(
        format!("Nothing lives at {}", self.path),
        Style::default().fg(Color::DarkGray),
      ),
      Line::default(),
      Line::from(vec![
        Span::styled("<h>", Style::default().fg(Color::Cyan)),
        Span::raw(" Back to Home"),
      ]),
    ];

    frame.render_widget(
      Paragraph::new(lines).block(block).alignment(Alignment::Center),
      area,
    );
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    "Not Found".to_string()
  }

  fn route(&self) -> Route {
    Route::NotFound(self.path.clone())
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("h", "home").with_priority(20),
    ]
  }
}
