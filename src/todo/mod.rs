//! Todo resource: wire types, HTTP client and the cached client the UI uses.

mod cache;
pub mod cached_client;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use cached_client::CachedTodoClient;
pub use types::{Todo, TodoPatch};
