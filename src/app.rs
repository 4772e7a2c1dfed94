use crate::boundary::{ErrorBoundary, RecoveryAction, Route};
use crate::commands::{self, CommandAction};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::todo::client::{TodoApi, TodoClient};
use crate::todo::CachedTodoClient;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header, draw_recovery_panel};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ErrorTestView, NotFoundView, TodoDetailView, TodoListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

/// Builds the cached client; called at start and again on reload.
type Connect<A> = Box<dyn Fn() -> Result<CachedTodoClient<A>>>;

/// Main application state
pub struct App<A: TodoApi = TodoClient> {
  /// Shown in the header
  api_url: String,

  connect: Connect<A>,

  client: CachedTodoClient<A>,

  /// Navigation stack - the todo list is always at index 0
  views: Vec<Box<dyn View>>,

  /// Contains render failures of the current view
  boundary: ErrorBoundary,

  /// Command overlay (after pressing :)
  command: CommandInput,

  /// One-line message from the last command
  status: Option<String>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, route: Route) -> Result<Self> {
    let api_url = config.api_url.clone();
    Self::with_connector(api_url, route, Box::new(move || CachedTodoClient::new(&config)))
  }
}

impl<A: TodoApi> App<A> {
  pub fn with_connector(api_url: String, route: Route, connect: Connect<A>) -> Result<Self> {
    let client = connect()?;
    let mut app = Self {
      api_url,
      views: vec![Box::new(TodoListView::new(client.clone()))],
      client,
      connect,
      boundary: ErrorBoundary::new(route.clone()),
      command: CommandInput::new(),
      status: None,
      should_quit: false,
    };
    app.navigate(route);
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    while !self.should_quit {
      let was_failed = self.boundary.is_failed();
      terminal.draw(|frame| self.draw(frame))?;

      // A panicking view may have written over the screen
      if !was_failed && self.boundary.is_failed() {
        terminal.clear()?;
      }

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn route(&self) -> Route {
    self.views.last().map(|v| v.route()).unwrap_or(Route::Home)
  }

  fn view_for(&self, route: &Route) -> Option<Box<dyn View>> {
    match route {
      Route::Home => None,
      Route::TodoDetail(id) => Some(Box::new(TodoDetailView::new(*id, self.client.clone()))),
      Route::ErrorTest => Some(Box::new(ErrorTestView)),
      Route::NotFound(path) => Some(Box::new(NotFoundView::new(path.clone()))),
    }
  }

  /// Show `route` on top of the list.
  fn navigate(&mut self, route: Route) {
    info!(route = %route, "Navigating");
    self.views.truncate(1);
    if let Some(view) = self.view_for(&route) {
      self.views.push(view);
    }
  }

  /// Throw away every view and cache and start over on the current route.
  ///
  /// The persisted store is reopened, so its snapshot survives.
  fn reload(&mut self) {
    let route = self.route();
    info!(route = %route, "Reloading");

    match (self.connect)() {
      Ok(client) => self.client = client,
      Err(e) => {
        warn!(error = %e, "Reload failed, keeping the current client");
        self.status = Some(format!("Reload failed: {}", e));
        return;
      }
    }

    self.views = vec![Box::new(TodoListView::new(self.client.clone()))];
    self.navigate(route.clone());
    self.boundary = ErrorBoundary::new(route);
  }

  fn recover(&mut self, action: RecoveryAction) {
    match action {
      RecoveryAction::GoHome => self.navigate(Route::Home),
      RecoveryAction::Reload => self.reload(),
    }
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {}
      Event::Tick => {}
    }

    // Typing can starve the tick timer, so poll after every event
    for view in &mut self.views {
      view.tick();
    }
    self.boundary.observe_route(&self.route());
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // A view prompt owns `:` too
    let view_captures = !self.boundary.is_failed()
      && self.views.last().is_some_and(|v| v.captures_input());

    if self.command.is_active() || !view_captures {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(input)) => {
          self.execute_command(&input);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    if self.boundary.is_failed() {
      match key.code {
        KeyCode::Char('h') => self.recover(RecoveryAction::GoHome),
        KeyCode::Char('R') => self.recover(RecoveryAction::Reload),
        KeyCode::Char('q') => self.should_quit = true,
        _ => {}
      }
      return;
    }

    let Some(view) = self.views.last_mut() else {
      return;
    };

    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, input: &str) {
    self.status = None;

    match commands::parse(input) {
      Some(CommandAction::Navigate(route)) => self.navigate(route),
      Some(CommandAction::Refresh) => match self.client.refresh() {
        Ok(()) => {
          // A fresh list view refetches from the API
          self.views[0] = Box::new(TodoListView::new(self.client.clone()));
          self.status = Some("Cleared persisted todos, fetching from the API".to_string());
        }
        Err(e) => self.status = Some(format!("Refresh failed: {}", e)),
      },
      Some(CommandAction::Quit) => self.should_quit = true,
      None if input.trim().is_empty() => {}
      None => self.status = Some(format!("Unknown command: {}", input.trim())),
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let status_height = if self.status.is_some() { 1 } else { 0 };
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),             // Header
        Constraint::Min(1),                // Content
        Constraint::Length(status_height), // Status
        Constraint::Length(1),             // Footer
      ])
      .split(frame.area());

    let shortcuts = match (self.boundary.is_failed(), self.views.last()) {
      (false, Some(view)) => view.shortcuts(),
      _ => Vec::new(),
    };
    draw_header(frame, chunks[0], &self.api_url, &shortcuts);

    let content = chunks[1];
    if let Some(view) = self.views.last_mut() {
      self.boundary.guard(|| view.render(frame, content));
    }
    if let Some(failure) = self.boundary.failure() {
      draw_recovery_panel(frame, content, failure);
    }

    if let Some(status) = &self.status {
      let line = Line::styled(format!(" {}", status), Style::default().fg(Color::Yellow));
      frame.render_widget(Paragraph::new(line), chunks[2]);
    }

    let breadcrumb: Vec<String> = self.views.iter().map(|v| v.breadcrumb_label()).collect();
    draw_footer(frame, chunks[3], &breadcrumb, &self.route().path());

    self.command.render_overlay(frame, content);
  }
}
