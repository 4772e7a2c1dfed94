//! Error containment around view rendering.
//!
//! The boundary is a two-state machine. Any failure while a view is produced
//! (a returned [`RenderFailure`] or a panic) moves it to `Failed`, and the
//! only automatic way back to `Normal` is a change of route.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info};

use crate::error::RenderFailure;

/// Identity of the screen being shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  /// `/`, the todo list
  Home,
  /// `/todos/:id`
  TodoDetail(u64),
  /// `/test-error`, a view that always fails
  ErrorTest,
  /// Anything else
  NotFound(String),
}

impl Route {
  pub fn parse(path: &str) -> Self {
    let path = path.trim();
    let trimmed = path.trim_end_matches('/');

    if trimmed.is_empty() {
      return Route::Home;
    }
    if trimmed == "/test-error" {
      return Route::ErrorTest;
    }
    if let Some(id) = trimmed.strip_prefix("/todos/") {
      if let Ok(id) = id.parse() {
        return Route::TodoDetail(id);
      }
    }
    Route::NotFound(path.to_string())
  }

  pub fn path(&self) -> String {
    match self {
      Route::Home => "/".to_string(),
      Route::TodoDetail(id) => format!("/todos/{}", id),
      Route::ErrorTest => "/test-error".to_string(),
      Route::NotFound(path) => path.clone(),
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoundaryState {
  #[default]
  Normal,
  Failed(RenderFailure),
}

/// What the user picked on the recovery panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
  /// Navigate to `/`, which resets the boundary
  GoHome,
  /// Rebuild all in-memory state; the persisted store is kept
  Reload,
}

#[derive(Debug)]
pub struct ErrorBoundary {
  state: BoundaryState,
  route: Route,
}

impl ErrorBoundary {
  pub fn new(route: Route) -> Self {
    Self {
      state: BoundaryState::Normal,
      route,
    }
  }

  #[cfg(test)]
  pub fn state(&self) -> &BoundaryState {
    &self.state
  }

  pub fn failure(&self) -> Option<&RenderFailure> {
    match &self.state {
      BoundaryState::Failed(failure) => Some(failure),
      BoundaryState::Normal => None,
    }
  }

  pub fn is_failed(&self) -> bool {
    self.failure().is_some()
  }

  #[cfg(test)]
  pub fn route(&self) -> &Route {
    &self.route
  }

  /// Record the active route. A different route clears a failure.
  ///
  /// Returns true when the boundary was reset.
  pub fn observe_route(&mut self, route: &Route) -> bool {
    if *route == self.route {
      return false;
    }
    self.route = route.clone();

    if self.is_failed() {
      info!(route = %route, "Route changed, clearing render failure");
      self.state = BoundaryState::Normal;
      return true;
    }
    false
  }

  /// Run a view-producing computation.
  ///
  /// A returned failure or a panic is captured instead of propagated. While
  /// the boundary is `Failed` nothing runs and `None` is returned.
  pub fn guard<T, F>(&mut self, produce: F) -> Option<T>
  where
    F: FnOnce() -> Result<T, RenderFailure>,
  {
    if self.is_failed() {
      return None;
    }

    let failure = match panic::catch_unwind(AssertUnwindSafe(produce)) {
      Ok(Ok(value)) => return Some(value),
      Ok(Err(failure)) => failure,
      Err(payload) => RenderFailure::new(panic_message(payload.as_ref())),
    };

    self.fail(failure);
    None
  }

  /// Move to `Failed` with `failure`.
  pub fn fail(&mut self, failure: RenderFailure) {
    error!(route = %self.route, error = %failure, "View failed to render");
    self.state = BoundaryState::Failed(failure);
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
