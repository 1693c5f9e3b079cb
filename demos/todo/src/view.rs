//! Terminal view: parses typed commands into actions and renders state.
//!
//! The view owns no todo data. It turns a line of input into a
//! [`Command`], hands any resulting action to the store, and redraws from
//! whatever state the store publishes.

use crate::reducer::next_theme;
use crate::types::{ActionError, Theme, TodoAction, TodoId, TodoState};
use std::fmt::Write as _;
use thiserror::Error;

/// Help text listing every command
pub const HELP: &str = "\
commands:
  add <text>          add a todo
  edit <id> <text>    change a todo's text
  toggle <id>         mark done / not done
  delete <id>         remove a todo
  clear               remove every todo
  theme               switch light/dark
  json <action>       dispatch a raw {\"type\": ..., \"payload\": ...} action
  list                redraw
  help                show this help
  quit                exit";

/// A parsed line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send this action to the store
    Dispatch(TodoAction),
    /// Redraw the current state
    List,
    /// Print [`HELP`]
    Help,
    /// Leave the loop
    Quit,
}

/// Why a line could not be turned into a [`Command`]
#[derive(Error, Debug)]
pub enum ViewError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    /// A required argument was missing
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// What was expected
        argument: &'static str,
    },

    /// Argument was not a todo id
    #[error("`{0}` is not a todo id")]
    InvalidId(String),

    /// The action itself was rejected
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl Command {
    /// Parse one line of input
    ///
    /// # Errors
    ///
    /// Returns a [`ViewError`] describing what is wrong with the line.
    pub fn parse(line: &str) -> Result<Self, ViewError> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ViewError::Empty),
            "add" => Ok(Self::Dispatch(TodoAction::add(rest)?)),
            "edit" => {
                let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let id = parse_id("edit", id)?;
                Ok(Self::Dispatch(TodoAction::edit(id, text)?))
            },
            "toggle" | "done" => Ok(Self::Dispatch(TodoAction::toggle(parse_id("toggle", rest)?))),
            "delete" | "rm" => Ok(Self::Dispatch(TodoAction::delete(parse_id("delete", rest)?))),
            "clear" => Ok(Self::Dispatch(TodoAction::clear_all())),
            "theme" => Ok(Self::Dispatch(TodoAction::toggle_theme())),
            "json" => {
                if rest.is_empty() {
                    return Err(ViewError::MissingArgument {
                        command: "json",
                        argument: "an action object",
                    });
                }
                Ok(Self::Dispatch(TodoAction::from_json(rest)?))
            },
            "list" | "ls" => Ok(Self::List),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ViewError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_id(command: &'static str, raw: &str) -> Result<TodoId, ViewError> {
    if raw.is_empty() {
        return Err(ViewError::MissingArgument {
            command,
            argument: "a todo id",
        });
    }
    raw.parse().map_err(|_| ViewError::InvalidId(raw.to_string()))
}

/// Render the whole list
///
/// Completed todos carry a ✅ marker and their completion time. The theme
/// switch is labelled with the mode it switches to. The clear-all hint only
/// appears when there is something to clear.
#[must_use]
pub fn render(state: &TodoState) -> String {
    let mut out = String::new();

    let switch_to = match next_theme(state) {
        Theme::Light => "Light",
        Theme::Dark => "Dark",
    };
    let _ = writeln!(out, "── Todo App [{}] ── (theme: Mode {switch_to})", state.theme);

    if state.is_empty() {
        out.push_str("  nothing to do\n");
        return out;
    }

    for todo in &state.todos {
        let mark = if todo.completed { "✅ " } else { "" };
        let _ = write!(out, "  {:>15}  {mark}{}", todo.id, todo.text);
        if let Some(at) = todo.completed_at {
            let _ = write!(out, "  (done {})", at.format("%Y-%m-%d %H:%M"));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "  {} pending, {} completed",
        state.pending_count(),
        state.completed_count()
    );
    out.push_str("  (clear: Clear All Todos)\n");
    out
}
