use std::collections::HashMap;

use crate::boundary::Route;
use crate::cache::MutationStatus;
use crate::error::{RenderFailure, SyncResult};
use crate::projection::{project, Projection, ViewFilter};
use crate::query::{Mutation, Query, QueryState};
use crate::todo::cached_client::{validate_title, CREATE_TARGET};
use crate::todo::client::{TodoApi, TodoClient};
use crate::todo::{CachedTodoClient, Todo, TodoPatch};
use crate::ui::components::{Confirm, EditEvent, EditModal, KeyResult, Prompt, PromptEvent};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{completed_color, completed_label, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::TodoDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::warn;

const DELETE_QUESTION: &str = "Are you sure you want to delete this todo?";

/// The todo list: search, status filter, pages, and the create/edit/delete
/// affordances.
pub struct TodoListView<A: TodoApi = TodoClient> {
  client: CachedTodoClient<A>,
  query: Query<Vec<Todo>>,
  filter: ViewFilter,
  list_state: ListState,
  search: Prompt,
  add: Prompt,
  editor: Option<EditModal>,
  confirm: Option<Confirm<u64>>,
  create: Mutation<Todo>,
  save: Mutation<Todo>,
  deletes: HashMap<u64, Mutation<()>>,
  has_persisted: bool,
  /// Last mutation failure not shown anywhere else
  notice: Option<String>,
}

impl<A: TodoApi> TodoListView<A> {
  pub fn new(client: CachedTodoClient<A>) -> Self {
    let todos = client.clone();
    let mut query = Query::new(move || {
      let todos = todos.clone();
      async move { todos.list_todos().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      has_persisted: client.has_persisted(),
      client,
      query,
      filter: ViewFilter::default(),
      list_state: ListState::default(),
      search: Prompt::new("Search", "/"),
      add: Prompt::new("Add Todo", "+"),
      editor: None,
      confirm: None,
      create: Mutation::new(),
      save: Mutation::new(),
      deletes: HashMap::new(),
      notice: None,
    }
  }

  fn todos(&self) -> &[Todo] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn projection(&self) -> Projection {
    project(self.todos(), &self.filter)
  }

  fn selected_todo(&self) -> Option<Todo> {
    let index = self.list_state.selected()?;
    self.projection().items.get(index).cloned()
  }

  /// Whether a save or delete of todo `id` is still running.
  fn is_busy(&self, id: u64) -> bool {
    self.client.mutation_status(id).is_pending()
      || self.deletes.get(&id).is_some_and(|m| m.is_pending())
  }

  /// Marker shown after a row while its mutation runs or after a failed delete.
  fn row_marker(&self, id: u64) -> Option<(String, Color)> {
    if let Some(delete) = self.deletes.get(&id) {
      match delete.status() {
        MutationStatus::Pending => return Some(("Deleting...".to_string(), Color::Yellow)),
        MutationStatus::Error => {
          let error = delete.error().unwrap_or("unknown error");
          return Some((format!("Delete failed: {}", error), Color::Red));
        }
        MutationStatus::Idle | MutationStatus::Success => {}
      }
    }

    if self.save.is_pending() && self.save.target() == Some(id.to_string().as_str()) {
      return Some(("Saving...".to_string(), Color::Yellow));
    }
    None
  }

  fn handle_search_key(&mut self, key: KeyEvent) -> bool {
    match self.search.handle_key(key) {
      KeyResult::Event(PromptEvent::Changed(text)) => {
        self.filter.set_search(text);
        self.list_state.select(Some(0));
      }
      KeyResult::Event(PromptEvent::Submitted(_)) => self.search.close(),
      KeyResult::Event(PromptEvent::Cancelled) => {
        self.filter.set_search("");
        self.list_state.select(Some(0));
      }
      KeyResult::Handled => {}
      KeyResult::NotHandled => return false,
    }
    true
  }

  fn handle_add_key(&mut self, key: KeyEvent) -> bool {
    match self.add.handle_key(key) {
      KeyResult::Event(PromptEvent::Submitted(title)) => {
        if self.create.is_pending() {
          return true;
        }
        match validate_title(&title) {
          Ok(title) => {
            let client = self.client.clone();
            self.create.mutate(CREATE_TARGET, async move {
              client.create_todo(&title).await
            });
          }
          Err(e) => self.add.set_error(e.to_string()),
        }
      }
      KeyResult::Event(_) | KeyResult::Handled => {}
      KeyResult::NotHandled => return false,
    }
    true
  }

  fn handle_editor_key(&mut self, key: KeyEvent) -> bool {
    let Some(editor) = self.editor.as_mut() else {
      return false;
    };

    let id = editor.id();
    match editor.handle_key(key) {
      KeyResult::Event(EditEvent::Save(patch)) => {
        if self.start_save(id, patch) {
          if let Some(editor) = self.editor.as_mut() {
            editor.set_saving(true);
          }
        }
      }
      KeyResult::Event(EditEvent::Cancelled) => self.editor = None,
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
    true
  }

  fn handle_confirm_key(&mut self, key: KeyEvent) -> bool {
    let Some(confirm) = &self.confirm else {
      return false;
    };

    match confirm.handle_key(key) {
      KeyResult::Event(answer) => {
        self.confirm = None;
        if let Some(id) = answer {
          self.start_delete(id);
        }
      }
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
    true
  }

  fn start_save(&mut self, id: u64, patch: TodoPatch) -> bool {
    let client = self.client.clone();
    self.save.mutate(id.to_string(), async move {
      client.update_todo(id, patch).await
    })
  }

  fn start_delete(&mut self, id: u64) {
    let client = self.client.clone();
    let mut mutation = Mutation::new();
    mutation.mutate(id.to_string(), async move { client.delete_todo(id).await });
    self.deletes.insert(id, mutation);
  }

  /// Clear the persisted snapshot and load the list from the API again.
  fn refresh_from_api(&mut self) {
    match self.client.refresh() {
      Ok(()) => {
        self.has_persisted = false;
        self.query.refetch();
      }
      Err(e) => {
        warn!(error = %e, "Refresh failed");
        self.notice = Some(format!("Refresh failed: {}", e));
      }
    }
  }

  fn poll_mutations(&mut self) {
    match self.create.poll() {
      Some(Ok(_)) => {
        self.add.close();
        // Served from the patched snapshot, no network round trip
        self.query.refetch();
      }
      Some(Err(e)) => {
        if self.add.is_active() {
          self.add.set_error(e.to_string());
        } else {
          self.notice = Some(format!("Failed to add todo: {}", e));
        }
      }
      None => {}
    }

    match self.save.poll() {
      Some(Ok(_)) => {
        self.editor = None;
        self.query.refetch();
      }
      Some(Err(e)) => match self.editor.as_mut() {
        Some(editor) => {
          editor.set_saving(false);
          editor.set_error(e.to_string());
        }
        None => self.notice = Some(format!("Failed to save todo: {}", e)),
      },
      None => {}
    }

    let settled: Vec<(u64, SyncResult<()>)> = self
      .deletes
      .iter_mut()
      .filter_map(|(id, mutation)| mutation.poll().map(|result| (*id, result)))
      .collect();

    // Failed deletes stay in the map so the row shows the error
    for (id, result) in settled {
      if result.is_ok() {
        self.deletes.remove(&id);
        self.query.refetch();
      }
    }
  }

  fn render_heading(&self, frame: &mut Frame, area: Rect) {
    let lines = vec![
      Line::styled("TodoMaster", Style::default().fg(Color::Cyan).bold()),
      Line::styled(
        "Create Todos, Create balance.",
        Style::default().fg(Color::DarkGray),
      ),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
  }

  fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
    let label = Style::default().fg(Color::DarkGray);
    let search = if self.filter.search_text.is_empty() {
      Span::styled("Search todos...", label)
    } else {
      Span::styled(self.filter.search_text.clone(), Style::default().fg(Color::Yellow))
    };

    let mut spans = vec![
      Span::styled(" Search: ", label),
      search,
      Span::styled("   Filter: ", label),
      Span::styled(self.filter.status.label(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(notice) = &self.notice {
      spans.push(Span::raw("   "));
      spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Red)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, projection: &Projection) {
    let title = match self.query.state() {
      QueryState::Loading => " Todo List (loading...) ".to_string(),
      _ => format!(" Todo List ({}) ", self.todos().len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let empty_message = match self.query.state() {
      QueryState::Loading | QueryState::Idle => Some(("Loading todos...", Color::DarkGray)),
      QueryState::Error(_) => Some(("Failed to fetch todos.", Color::Red)),
      _ if projection.items.is_empty() => {
        Some(("No todos found matching your criteria.", Color::DarkGray))
      }
      _ => None,
    };

    if let Some((message, color)) = empty_message {
      let paragraph = Paragraph::new(message)
        .block(block)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color));
      frame.render_widget(paragraph, area);
      return;
    }

    ensure_valid_selection(&mut self.list_state, projection.items.len());
    let title_width = (area.width as usize).saturating_sub(32).max(10);

    let items: Vec<ListItem> = projection
      .items
      .iter()
      .map(|todo| {
        let color = completed_color(todo.completed);
        let mut title_style = Style::default();
        if todo.completed {
          title_style = title_style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
        }

        let mut spans = vec![
          Span::styled(
            if todo.completed { "✓ " } else { "○ " },
            Style::default().fg(color),
          ),
          Span::styled(format!("{:>4} ", todo.id), Style::default().fg(Color::DarkGray)),
          Span::styled(
            format!("{:<width$}", truncate(&todo.title, title_width), width = title_width),
            title_style,
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<10}", completed_label(todo.completed)),
            Style::default().fg(color),
          ),
        ];
        if let Some((marker, color)) = self.row_marker(todo.id) {
          spans.push(Span::styled(marker, Style::default().fg(color)));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_pagination(&self, frame: &mut Frame, area: Rect, projection: &Projection) {
    let enabled = Style::default().fg(Color::Cyan);
    let disabled = Style::default().fg(Color::DarkGray);
    let has_previous = self.filter.page > 1;
    let has_next = self.filter.page < projection.total_pages;

    let line = Line::from(vec![
      Span::styled("<p> Previous", if has_previous { enabled } else { disabled }),
      Span::raw(format!(
        "   Page {} of {}   ",
        self.filter.page, projection.total_pages
      )),
      Span::styled("Next <n>", if has_next { enabled } else { disabled }),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
  }
}

impl<A: TodoApi> View for TodoListView<A> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.handle_confirm_key(key)
      || self.handle_editor_key(key)
      || self.handle_search_key(key)
      || self.handle_add_key(key)
    {
      return ViewAction::None;
    }

    self.notice = None;

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        let total_pages = self.projection().total_pages;
        self.filter.next_page(total_pages);
        self.list_state.select(Some(0));
      }
      KeyCode::Char('p') | KeyCode::Left => {
        self.filter.previous_page();
        self.list_state.select(Some(0));
      }
      KeyCode::Char('f') => {
        self.filter.cycle_status();
        self.list_state.select(Some(0));
      }
      KeyCode::Char('/') => self.search.open(&self.filter.search_text),
      KeyCode::Char('a') => self.add.open(""),
      KeyCode::Char('e') => {
        if let Some(todo) = self.selected_todo() {
          if !self.is_busy(todo.id) && !self.save.is_pending() {
            self.editor = Some(EditModal::new(&todo));
          }
        }
      }
      KeyCode::Char('d') => {
        if let Some(todo) = self.selected_todo() {
          if !self.is_busy(todo.id) {
            self.confirm = Some(Confirm::new(DELETE_QUESTION, todo.id));
          }
        }
      }
      KeyCode::Char('R') if self.has_persisted => self.refresh_from_api(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        if let Some(todo) = self.selected_todo() {
          return ViewAction::Push(Box::new(TodoDetailView::new(
            todo.id,
            self.client.clone(),
          )));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<(), RenderFailure> {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Heading
        Constraint::Length(1), // Search and filter
        Constraint::Min(3),    // List
        Constraint::Length(1), // Pagination
      ])
      .split(area);

    let projection = self.projection();

    self.render_heading(frame, chunks[0]);
    self.render_filter_bar(frame, chunks[1]);
    self.render_list(frame, chunks[2], &projection);
    self.render_pagination(frame, chunks[3], &projection);

    self.search.render_overlay(frame, chunks[2], "enter: keep  esc: clear");
    let add_hint = if self.client.create_status().is_pending() {
      "Adding..."
    } else {
      "enter: Add Todo  esc: cancel"
    };
    self.add.render_overlay(frame, chunks[2], add_hint);

    if let Some(editor) = &self.editor {
      editor.render(frame, area);
    }
    if let Some(confirm) = &self.confirm {
      confirm.render(frame, area);
    }
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    "Todos".to_string()
  }

  fn route(&self) -> Route {
    Route::Home
  }

  fn tick(&mut self) {
    if self.query.poll() {
      self.has_persisted = self.client.has_persisted();
      if let Some(todos) = self.query.data() {
        self
          .deletes
          .retain(|id, m| m.is_pending() || todos.iter().any(|t| t.id == *id));
      }
    }
    self.poll_mutations();
    let len = self.projection().items.len();
    ensure_valid_selection(&mut self.list_state, len);
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.add.is_active() || self.editor.is_some() || self.confirm.is_some()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let mut shortcuts = vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("a", "add").with_priority(20),
      Shortcut::new("/", "search").with_priority(30),
      Shortcut::new("f", "filter").with_priority(40),
      Shortcut::new("e", "edit").with_priority(50),
      Shortcut::new("d", "delete").with_priority(60),
      Shortcut::new("n/p", "page").with_priority(70),
      Shortcut::new("q", "quit").with_priority(90),
    ];
    if self.has_persisted {
      shortcuts.push(Shortcut::new("R", "refresh from API").with_priority(80));
    }
    shortcuts
  }
}
