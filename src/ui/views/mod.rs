mod error_test;
mod not_found;
mod todo_detail;
mod todo_list;

pub use error_test::ErrorTestView;
pub use not_found::NotFoundView;
pub use todo_detail::TodoDetailView;
pub use todo_list::TodoListView;
