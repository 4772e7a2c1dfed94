use crate::boundary::Route;
use crate::error::RenderFailure;
use crate::query::{Query, QueryState};
use crate::todo::client::TodoApi;
use crate::todo::{CachedTodoClient, Todo};
use crate::ui::renderfns::{completed_color, completed_label};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// A single todo, fetched by id
pub struct TodoDetailView {
  id: u64,
  query: Query<Todo>,
}

impl TodoDetailView {
  pub fn new<A: TodoApi>(id: u64, client: CachedTodoClient<A>) -> Self {
    let mut query = Query::new(move || {
      let client = client.clone();
      async move { client.get_todo(id).await.map_err(|e| e.to_string()) }
    });

    query.fetch();

    Self { id, query }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => " Todo Details (loading...) ".to_string(),
      _ => " Todo Details ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.query.is_loading() {
      let paragraph = Paragraph::new("Loading todo...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.query.error() {
      let paragraph = Paragraph::new(format!("Error fetching todo.\n\n{}\n\nPress 'r' to retry.", error))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let Some(todo) = self.query.data() else {
      return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
      Line::from(vec![Span::styled("ID: ", label), Span::raw(todo.id.to_string())]),
      Line::from(vec![Span::styled("Title: ", label), Span::raw(&todo.title)]),
      Line::from(vec![
        Span::styled("Status: ", label),
        Span::styled(
          completed_label(todo.completed),
          Style::default().fg(completed_color(todo.completed)),
        ),
      ]),
      Line::from(vec![Span::styled("User: ", label), Span::raw(todo.user_id.to_string())]),
      Line::default(),
      Line::from(vec![
        Span::styled("<q>", Style::default().fg(Color::Cyan)),
        Span::styled(" Back to List", label),
      ]),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
  }
}

impl View for TodoDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<(), RenderFailure> {
    self.render_detail(frame, area);
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    format!("#{}", self.id)
  }

  fn route(&self) -> Route {
    Route::TodoDetail(self.id)
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("r", "refresh").with_priority(20),
      Shortcut::new("q", "back to list").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::todo::fake::{sample_todos, FakeTodoApi};
  use chrono::Duration;
  use std::sync::Arc;

  fn client(api: FakeTodoApi) -> CachedTodoClient<FakeTodoApi> {
    CachedTodoClient::with_parts(api, Arc::new(MemoryStore::new()), Duration::minutes(5))
  }

  async fn settle(view: &mut TodoDetailView) {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    view.tick();
  }

  #[tokio::test]
  async fn test_loads_todo_by_id() {
    let mut view = TodoDetailView::new(3, client(FakeTodoApi::with_todos(sample_todos(5))));
    assert!(view.query.is_loading());

    settle(&mut view).await;

    assert_eq!(view.query.data().map(|t| t.id), Some(3));
    assert_eq!(view.route(), Route::TodoDetail(3));
    assert_eq!(view.breadcrumb_label(), "#3");
  }

  #[tokio::test]
  async fn test_missing_todo_is_an_error() {
    let mut view = TodoDetailView::new(99, client(FakeTodoApi::with_todos(sample_todos(5))));
    settle(&mut view).await;
    assert!(view.query.is_error());
  }

  #[tokio::test]
  async fn test_escape_goes_back() {
    let mut view = TodoDetailView::new(1, client(FakeTodoApi::default()));
    let key = KeyEvent::new(KeyCode::Esc, crossterm::event::KeyModifiers::NONE);
    assert!(matches!(view.handle_key(key), ViewAction::Pop));
  }
}
