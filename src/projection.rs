//! Filtering, search and pagination over the cached todo list.
//!
//! Everything here is a pure function of `(todos, filter)`: the same inputs
//! always give the same page and nothing is modified.

use crate::todo::Todo;

/// Number of todos per page.
pub const PAGE_SIZE: usize = 10;

/// Completion filter for the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
  #[default]
  All,
  Complete,
  Incomplete,
}

impl StatusFilter {
  fn matches(self, todo: &Todo) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Complete => todo.completed,
      StatusFilter::Incomplete => !todo.completed,
    }
  }

  /// Next filter in the all → complete → incomplete cycle.
  pub fn cycle(self) -> Self {
    match self {
      StatusFilter::All => StatusFilter::Complete,
      StatusFilter::Complete => StatusFilter::Incomplete,
      StatusFilter::Incomplete => StatusFilter::All,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      StatusFilter::All => "All",
      StatusFilter::Complete => "Completed",
      StatusFilter::Incomplete => "Incomplete",
    }
  }
}

/// Filter state owned by the list view. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilter {
  pub search_text: String,
  pub status: StatusFilter,
  /// 1-based page number
  pub page: usize,
}

impl Default for ViewFilter {
  fn default() -> Self {
    Self {
      search_text: String::new(),
      status: StatusFilter::All,
      page: 1,
    }
  }
}

impl ViewFilter {
  /// Replace the search text and go back to the first page.
  pub fn set_search(&mut self, text: impl Into<String>) {
    self.search_text = text.into();
    self.page = 1;
  }

  /// Move to the next status filter and go back to the first page.
  pub fn cycle_status(&mut self) {
    self.status = self.status.cycle();
    self.page = 1;
  }

  /// Advance a page unless already on the last one.
  pub fn next_page(&mut self, total_pages: usize) {
    if self.page < total_pages {
      self.page += 1;
    }
  }

  /// Go back a page unless already on the first one.
  pub fn previous_page(&mut self) {
    if self.page > 1 {
      self.page -= 1;
    }
  }
}

/// The visible slice of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
  pub items: Vec<Todo>,
  pub total_pages: usize,
}

/// Filter by title and status, then cut out the requested page.
///
/// Titles match when they contain the search text, ignoring case. A page
/// number below 1 is read as 1; a page past the end is empty.
pub fn project(todos: &[Todo], filter: &ViewFilter) -> Projection {
  let needle = filter.search_text.to_lowercase();

  let matching: Vec<&Todo> = todos
    .iter()
    .filter(|todo| filter.status.matches(todo))
    .filter(|todo| todo.title.to_lowercase().contains(&needle))
    .collect();

  let total_pages = matching.len().div_ceil(PAGE_SIZE);
  let start = (filter.page.max(1) - 1).saturating_mul(PAGE_SIZE);

  let items = matching
    .into_iter()
    .skip(start)
    .take(PAGE_SIZE)
    .cloned()
    .collect();

  Projection { items, total_pages }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::todo::fake::sample_todos;

  fn todo(id: u64, title: &str, completed: bool) -> Todo {
    Todo {
      id,
      title: title.to_string(),
      completed,
      user_id: 1,
    }
  }

  fn filter(search: &str, status: StatusFilter, page: usize) -> ViewFilter {
    ViewFilter {
      search_text: search.to_string(),
      status,
      page,
    }
  }

  #[test]
  fn test_case_insensitive_search() {
    let todos = vec![todo(1, "Buy milk", false)];

    let result = project(&todos, &filter("buy", StatusFilter::All, 1));

    assert_eq!(result.items, todos);
    assert_eq!(result.total_pages, 1);
  }

  #[test]
  fn test_absent_search_text_yields_no_pages() {
    let todos = sample_todos(25);

    let result = project(&todos, &filter("zzz-not-there", StatusFilter::All, 1));

    assert!(result.items.is_empty());
    assert_eq!(result.total_pages, 0);
  }

  #[test]
  fn test_status_filters() {
    let todos = vec![
      todo(1, "a", true),
      todo(2, "b", false),
      todo(3, "c", true),
    ];

    let complete = project(&todos, &filter("", StatusFilter::Complete, 1));
    let incomplete = project(&todos, &filter("", StatusFilter::Incomplete, 1));

    assert_eq!(complete.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(incomplete.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
  }

  #[test]
  fn test_pagination_slices_pages_of_ten() {
    let todos = sample_todos(25);

    let first = project(&todos, &filter("", StatusFilter::All, 1));
    let last = project(&todos, &filter("", StatusFilter::All, 3));
    let beyond = project(&todos, &filter("", StatusFilter::All, 4));

    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.items[0].id, 1);
    assert_eq!(last.items.iter().map(|t| t.id).collect::<Vec<_>>(), (21..=25).collect::<Vec<_>>());
    assert!(beyond.items.is_empty());
  }

  #[test]
  fn test_page_zero_reads_as_first_page() {
    let todos = sample_todos(12);
    assert_eq!(
      project(&todos, &filter("", StatusFilter::All, 0)),
      project(&todos, &filter("", StatusFilter::All, 1))
    );
  }

  #[test]
  fn test_projection_is_pure() {
    let todos = sample_todos(40);
    let view = filter("NUMBER 1", StatusFilter::Incomplete, 1);
    let before = todos.clone();

    let first = project(&todos, &view);
    let second = project(&todos, &view);

    assert_eq!(first, second);
    assert_eq!(todos, before);
  }

  #[test]
  fn test_filter_changes_reset_page() {
    let mut view = filter("", StatusFilter::All, 3);
    view.set_search("milk");
    assert_eq!(view.page, 1);

    view.page = 2;
    view.cycle_status();
    assert_eq!(view.status, StatusFilter::Complete);
    assert_eq!(view.page, 1);
  }

  #[test]
  fn test_page_navigation_is_clamped() {
    let mut view = ViewFilter::default();
    view.previous_page();
    assert_eq!(view.page, 1);

    view.next_page(2);
    view.next_page(2);
    assert_eq!(view.page, 2);

    view.next_page(0);
    assert_eq!(view.page, 2);
  }

  #[test]
  fn test_huge_page_number_is_empty() {
    let todos = sample_todos(25);
    let result = project(&todos, &filter("", StatusFilter::All, usize::MAX));
    assert!(result.items.is_empty());
    assert_eq!(result.total_pages, 3);
  }
}
