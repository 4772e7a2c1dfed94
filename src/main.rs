mod app;
mod boundary;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod logging;
mod projection;
mod query;
mod todo;
mod ui;

use boundary::Route;
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "todomaster")]
#[command(about = "Create Todos, Create balance. A terminal todo list with a local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/todomaster/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the todo API
  #[arg(long)]
  api_url: Option<String>,

  /// Keep nothing on disk between runs
  #[arg(long)]
  no_persist: bool,

  /// Path to open at start, e.g. /todos/3
  #[arg(default_value = "/")]
  route: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line wins over the config file
  if let Some(api_url) = args.api_url {
    config.api_url = api_url;
  }
  if args.no_persist {
    config.cache.persist = false;
  }

  let _log_guard = logging::init(&config)?;
  info!(api_url = %config.api_url, persist = config.cache.persist, "Starting todomaster");

  let mut app = app::App::new(config, Route::parse(&args.route))?;
  app.run().await?;

  Ok(())
}
