use crate::boundary::Route;
use crate::error::RenderFailure;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

/// Route whose render always fails; exercises the error boundary.
#[derive(Debug, Default)]
pub struct ErrorTestView;

impl View for ErrorTestView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, _frame: &mut Frame, _area: Rect) -> Result<(), RenderFailure> {
    Err(RenderFailure::new("This is a test error."))
  }

  fn breadcrumb_label(&self) -> String {
    "Test Error".to_string()
  }

  fn route(&self) -> Route {
    Route::ErrorTest
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::boundary::ErrorBoundary;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;

  #[test]
  fn test_render_trips_the_boundary() {
    let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
    let mut boundary = ErrorBoundary::new(Route::ErrorTest);
    let mut view = ErrorTestView;

    terminal
      .draw(|frame| {
        let area = frame.area();
        boundary.guard(|| view.render(frame, area));
      })
      .unwrap();

    assert_eq!(
      boundary.failure().map(|f| f.message.as_str()),
      Some("This is a test error.")
    );
  }
}
