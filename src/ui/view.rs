use crate::boundary::Route;
use crate::error::RenderFailure;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// A screen in the view stack.
///
/// Views own their input modes (prompts, modals) and return actions for the
/// App to execute. Async data lives in `Query`/`Mutation` handles that the
/// view polls from `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view. A failure is shown in place of the view by the
  /// error boundary until the route changes.
  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<(), RenderFailure>;

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Route this view is shown for
  fn route(&self) -> Route;

  /// Called on each tick to allow views to poll async handles
  fn tick(&mut self) {}

  /// True while a prompt or modal owns the keyboard, so global keys like
  /// `:` and `q` go to the view instead
  fn captures_input(&self) -> bool {
    false
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}
