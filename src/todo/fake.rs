//! In-memory stand-in for the remote todo collection.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::error::TransportError;

use super::client::TodoApi;
use super::types::{NewTodo, Todo, TodoPatch};

#[derive(Default)]
struct FakeState {
  todos: Vec<Todo>,
  calls: HashMap<&'static str, usize>,
  failing: HashSet<&'static str>,
}

/// Records calls per operation and can be told to fail any of them.
#[derive(Clone, Default)]
pub struct FakeTodoApi {
  state: Arc<Mutex<FakeState>>,
}

impl FakeTodoApi {
  pub fn with_todos(todos: Vec<Todo>) -> Self {
    let api = Self::default();
    api.state.lock().unwrap().todos = todos;
    api
  }

  /// Make every later call to `operation` fail with a 500.
  pub fn fail(&self, operation: &'static str) {
    self.state.lock().unwrap().failing.insert(operation);
  }

  pub fn calls(&self, operation: &'static str) -> usize {
    self
      .state
      .lock()
      .unwrap()
      .calls
      .get(operation)
      .copied()
      .unwrap_or(0)
  }

  fn record(&self, operation: &'static str) -> Result<(), TransportError> {
    let mut state = self.state.lock().unwrap();
    *state.calls.entry(operation).or_default() += 1;
    if state.failing.contains(operation) {
      return Err(TransportError::Status {
        status: 500,
        url: format!("fake://todos/{}", operation),
      });
    }
    Ok(())
  }

  fn not_found(id: u64) -> TransportError {
    TransportError::Status {
      status: 404,
      url: format!("fake://todos/{}", id),
    }
  }
}

impl TodoApi for FakeTodoApi {
  async fn list(&self) -> Result<Vec<Todo>, TransportError> {
    self.record("list")?;
    Ok(self.state.lock().unwrap().todos.clone())
  }

  async fn get(&self, id: u64) -> Result<Todo, TransportError> {
    self.record("get")?;
    let state = self.state.lock().unwrap();
    state
      .todos
      .iter()
      .find(|t| t.id == id)
      .cloned()
      .ok_or_else(|| Self::not_found(id))
  }

  async fn create(&self, todo: &NewTodo) -> Result<Todo, TransportError> {
    self.record("create")?;
    // Like the demo API, answer with the next id but keep the collection as is
    let state = self.state.lock().unwrap();
    let id = state.todos.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    Ok(Todo {
      id,
      title: todo.title.clone(),
      completed: todo.completed,
      user_id: todo.user_id,
    })
  }

  async fn update(&self, id: u64, patch: &TodoPatch) -> Result<Todo, TransportError> {
    self.record("update")?;
    let mut state = self.state.lock().unwrap();
    let todo = state
      .todos
      .iter_mut()
      .find(|t| t.id == id)
      .ok_or_else(|| Self::not_found(id))?;
    if let Some(title) = &patch.title {
      todo.title = title.clone();
    }
    if let Some(completed) = patch.completed {
      todo.completed = completed;
    }
    Ok(todo.clone())
  }

  async fn delete(&self, id: u64) -> Result<(), TransportError> {
    self.record("delete")?;
    let mut state = self.state.lock().unwrap();
    state.todos.retain(|t| t.id != id);
    Ok(())
  }
}

/// `count` todos with ids starting at 1, every third one completed.
pub fn sample_todos(count: u64) -> Vec<Todo> {
  (1..=count)
    .map(|id| Todo {
      id,
      title: format!("todo number {}", id),
      completed: id % 3 == 0,
      user_id: 1 + (id - 1) / 20,
    })
    .collect()
}
