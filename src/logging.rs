use color_eyre::{eyre::eyre, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global subscriber, writing to a daily log file.
///
/// The terminal belongs to the UI, so nothing is logged to stdout or stderr.
/// `RUST_LOG` takes precedence over the configured level. Keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init(config: &Config) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "todomaster.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(&config.log.level));

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

/// Configured level for this crate, warnings only for dependencies.
fn default_filter(level: &str) -> EnvFilter {
  EnvFilter::try_new(format!("warn,todomaster={}", level))
    .unwrap_or_else(|_| EnvFilter::new("warn,todomaster=info"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use tracing_subscriber::filter::LevelFilter;

  #[test]
  fn test_configured_level_applies_to_crate() {
    assert_eq!(
      default_filter("debug").max_level_hint(),
      Some(LevelFilter::DEBUG)
    );
  }

  #[test]
  fn test_bad_level_falls_back_to_info() {
    assert_eq!(
      default_filter("not a level").max_level_hint(),
      Some(LevelFilter::INFO)
    );
  }
}
