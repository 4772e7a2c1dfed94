//! Command-line overlay commands and autocomplete.

use crate::boundary::Route;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "todos",
    aliases: &["t", "list", "home"],
    description: "Browse all todos",
  },
  Command {
    name: "todo",
    aliases: &["show", "open"],
    description: "Open a todo by id: todo <id>",
  },
  Command {
    name: "test-error",
    aliases: &["crash"],
    description: "Show a view that fails to render",
  },
  Command {
    name: "refresh",
    aliases: &["r"],
    description: "Drop persisted todos and fetch from the API",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit todomaster",
  },
];

/// What a submitted command line asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
  Navigate(Route),
  Refresh,
  Quit,
}

fn find(name: &str) -> Option<&'static Command> {
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Interpret a submitted command line.
///
/// A line starting with `/` is taken as a route path.
pub fn parse(input: &str) -> Option<CommandAction> {
  let input = input.trim();
  if input.starts_with('/') {
    return Some(CommandAction::Navigate(Route::parse(input)));
  }

  let (word, arg) = match input.split_once(char::is_whitespace) {
    Some((word, arg)) => (word, arg.trim()),
    None => (input, ""),
  };

  let cmd = find(&word.to_lowercase())?;
  match cmd.name {
    "todos" => Some(CommandAction::Navigate(Route::Home)),
    "todo" if arg.is_empty() => None,
    "todo" => Some(CommandAction::Navigate(Route::parse(&format!(
      "/todos/{}",
      arg
    )))),
    "test-error" => Some(CommandAction::Navigate(Route::ErrorTest)),
    "refresh" => Some(CommandAction::Refresh),
    "quit" => Some(CommandAction::Quit),
    _ => None,
  }
}

/// Get autocomplete suggestions for a given input.
///
/// Only the first word is matched; arguments are left to the caller.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input
    .split_whitespace()
    .next()
    .unwrap_or("")
    .to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
