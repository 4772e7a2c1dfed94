use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::TransportError;

use super::types::{NewTodo, Todo, TodoPatch};

/// Typed accessors for the remote todo collection.
///
/// Every call is a single round trip. Nothing is retried: the resource makes
/// no idempotency promises, so a retried create could insert twice.
pub trait TodoApi: Clone + Send + Sync + 'static {
  fn list(&self) -> impl Future<Output = Result<Vec<Todo>, TransportError>> + Send;

  fn get(&self, id: u64) -> impl Future<Output = Result<Todo, TransportError>> + Send;

  fn create(&self, todo: &NewTodo) -> impl Future<Output = Result<Todo, TransportError>> + Send;

  fn update(
    &self,
    id: u64,
    patch: &TodoPatch,
  ) -> impl Future<Output = Result<Todo, TransportError>> + Send;

  fn delete(&self, id: u64) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// HTTP client for a JSON `todos` collection.
#[derive(Clone)]
pub struct TodoClient {
  http: reqwest::Client,
  base: Url,
}

impl TodoClient {
  pub fn new(config: &Config) -> Result<Self, TransportError> {
    let mut base =
      Url::parse(&config.api_url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    // Url::join replaces the last segment unless the base ends in a slash
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("todomaster/", env!("CARGO_PKG_VERSION")))
      .connect_timeout(Duration::from_secs(10))
      .build()
      .map_err(|e| TransportError::Network(e.to_string()))?;

    Ok(Self { http, base })
  }

  fn endpoint(&self, id: Option<u64>) -> Result<Url, TransportError> {
    let path = match id {
      Some(id) => format!("todos/{}", id),
      None => "todos".to_string(),
    };
    self
      .base
      .join(&path)
      .map_err(|e| TransportError::InvalidUrl(e.to_string()))
  }

  async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, TransportError> {
    let response = request.send().await?.error_for_status()?;
    Ok(response.json::<T>().await?)
  }
}

impl TodoApi for TodoClient {
  async fn list(&self) -> Result<Vec<Todo>, TransportError> {
    let url = self.endpoint(None)?;
    debug!(%url, "GET todos");
    Self::send_json(self.http.get(url)).await
  }

  async fn get(&self, id: u64) -> Result<Todo, TransportError> {
    let url = self.endpoint(Some(id))?;
    debug!(%url, "GET todo");
    Self::send_json(self.http.get(url)).await
  }

  async fn create(&self, todo: &NewTodo) -> Result<Todo, TransportError> {
    let url = self.endpoint(None)?;
    debug!(%url, title = %todo.title, "POST todo");
    Self::send_json(self.http.post(url).json(todo)).await
  }

  async fn update(&self, id: u64, patch: &TodoPatch) -> Result<Todo, TransportError> {
    let url = self.endpoint(Some(id))?;
    debug!(%url, ?patch, "PATCH todo");
    Self::send_json(self.http.patch(url).json(patch)).await
  }

  async fn delete(&self, id: u64) -> Result<(), TransportError> {
    let url = self.endpoint(Some(id))?;
    debug!(%url, "DELETE todo");
    self.http.delete(url).send().await?.error_for_status()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client_for(api_url: &str) -> TodoClient {
    let config = Config {
      api_url: api_url.to_string(),
      ..Config::default()
    };
    TodoClient::new(&config).unwrap()
  }

  #[test]
  fn test_endpoints_from_bare_host() {
    let client = client_for("https://jsonplaceholder.typicode.com");
    assert_eq!(
      client.endpoint(None).unwrap().as_str(),
      "https://jsonplaceholder.typicode.com/todos"
    );
    assert_eq!(
      client.endpoint(Some(5)).unwrap().as_str(),
      "https://jsonplaceholder.typicode.com/todos/5"
    );
  }

  #[test]
  fn test_endpoints_keep_base_path() {
    let client = client_for("http://localhost:8080/api/v1");
    assert_eq!(
      client.endpoint(Some(12)).unwrap().as_str(),
      "http://localhost:8080/api/v1/todos/12"
    );
  }

  #[test]
  fn test_invalid_base_url_is_rejected() {
    let config = Config {
      api_url: "not a url".to_string(),
      ..Config::default()
    };
    assert!(matches!(
      TodoClient::new(&config),
      Err(TransportError::InvalidUrl(_))
    ));
  }
}
