//! Domain types for the todo list.
//!
//! The state is an ordered list of todo records plus a two-valued display
//! theme. Actions are plain values; the reducer in [`crate::reducer`] gives
//! them meaning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statekit_macros::Action;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a todo item
///
/// Assigned by the environment's id generator when a todo is added; with the
/// production generator this is its creation time in Unix milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    /// Wraps a raw id
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// What needs doing
    pub text: String,
    /// Whether the todo is done
    pub completed: bool,
    /// When the todo was last marked done; `None` while pending
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Creates a new pending todo
    #[must_use]
    pub const fn new(id: TodoId, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
            completed_at: None,
        }
    }

    /// Flips completion, stamping `now` on the way to done and clearing
    /// the stamp on the way back
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then_some(now);
    }
}

/// Display theme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background (default)
    #[default]
    Light,
    /// Dark background
    Dark,
}

impl Theme {
    /// The other theme
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Returns true for [`Theme::Dark`]
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Lowercase name, as used in configuration and JSON
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Theme`] from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown theme {0:?} (expected \"light\" or \"dark\")")]
pub struct ParseThemeError(String);

impl FromStr for Theme {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_string())),
        }
    }
}

/// State of the todo list
///
/// `todos` keeps insertion order; removals are the only thing that changes
/// relative order. Pending/completed views are derived on demand and never
/// stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// All todos, oldest first
    pub todos: Vec<Todo>,
    /// Current display theme
    pub theme: Theme,
}

impl TodoState {
    /// Creates an empty list with the light theme
    #[must_use]
    pub const fn new() -> Self {
        Self::with_theme(Theme::Light)
    }

    /// Creates an empty list with the given theme
    #[must_use]
    pub const fn with_theme(theme: Theme) -> Self {
        Self {
            todos: Vec::new(),
            theme,
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Returns true when there are no todos
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: TodoId) -> bool {
        self.get(id).is_some()
    }

    /// Todos not yet done, in list order
    pub fn pending(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|todo| !todo.completed)
    }

    /// Todos already done, in list order
    pub fn completed(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|todo| todo.completed)
    }

    /// Returns the number of pending todos
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }
}

/// Errors building or decoding an action
#[derive(Error, Debug)]
pub enum ActionError {
    /// Todo text was empty after trimming
    #[error("todo text cannot be empty")]
    EmptyText,

    /// A wire-format action could not be decoded
    #[error("malformed action: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Intents the todo store understands
///
/// On the wire an action is `{"type": "<KIND>", "payload": ...}`; see
/// [`TodoAction::from_json`].
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodoAction {
    /// Append a new pending todo
    AddTodo {
        /// Todo text
        text: String,
    },

    /// Remove a todo; the payload is the bare id
    DeleteTodo(TodoId),

    /// Flip a todo between pending and done; the payload is the bare id
    ToggleTodo(TodoId),

    /// Replace a todo's text
    EditTodo {
        /// Todo to edit
        id: TodoId,
        /// Replacement text
        #[serde(rename = "newText")]
        new_text: String,
    },

    /// Remove every todo
    ClearTodos,

    /// Switch between light and dark
    ToggleTheme,

    /// Any kind this build does not recognise; applying it changes nothing
    #[serde(other)]
    Unknown,
}

impl TodoAction {
    /// Add a todo, trimming `text` and rejecting it if nothing remains
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::EmptyText`] for empty or whitespace-only text.
    pub fn add(text: impl AsRef<str>) -> Result<Self, ActionError> {
        Ok(Self::AddTodo {
            text: non_empty(text.as_ref())?,
        })
    }

    /// Edit a todo, trimming `new_text` and rejecting it if nothing remains
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::EmptyText`] for empty or whitespace-only text.
    pub fn edit(id: TodoId, new_text: impl AsRef<str>) -> Result<Self, ActionError> {
        Ok(Self::EditTodo {
            id,
            new_text: non_empty(new_text.as_ref())?,
        })
    }

    /// Delete a todo
    #[must_use]
    pub const fn delete(id: TodoId) -> Self {
        Self::DeleteTodo(id)
    }

    /// Toggle a todo's completion
    #[must_use]
    pub const fn toggle(id: TodoId) -> Self {
        Self::ToggleTodo(id)
    }

    /// Remove every todo
    #[must_use]
    pub const fn clear_all() -> Self {
        Self::ClearTodos
    }

    /// Switch theme
    #[must_use]
    pub const fn toggle_theme() -> Self {
        Self::ToggleTheme
    }

    /// Decode a wire-format action
    ///
    /// A `type` this build does not know decodes to [`TodoAction::Unknown`]
    /// whatever its payload. A known `type` with a malformed payload is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Decode`] if `json` is not an object with a
    /// string `type`, or if a known kind carries an invalid payload.
    pub fn from_json(json: &str) -> Result<Self, ActionError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "type")]
            kind: String,
        }

        let value: serde_json::Value = serde_json::from_str(json)?;
        let envelope: Envelope = serde_json::from_value(value.clone())?;

        let known = envelope.kind != Self::Unknown.kind()
            && Self::KINDS.contains(&envelope.kind.as_str());
        if !known {
            return Ok(Self::Unknown);
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Encode as a wire-format action
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Decode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ActionError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn non_empty(text: &str) -> Result<String, ActionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ActionError::EmptyText);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_id_display_and_parse() {
        let id = TodoId::new(1_735_689_600_000);
        assert_eq!(id.to_string(), "1735689600000");
        assert_eq!(" 1735689600000 ".parse::<TodoId>().ok(), Some(id));
        assert!("abc".parse::<TodoId>().is_err());
    }

    #[test]
    fn todo_new_is_pending() {
        let todo = Todo::new(TodoId::new(1), "Test todo".to_string());
        assert_eq!(todo.text, "Test todo");
        assert!(!todo.completed);
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn todo_toggle_stamps_and_clears() {
        let mut todo = Todo::new(TodoId::new(1), "Test".to_string());
        let now = Utc::now();

        todo.toggle(now);
        assert!(todo.completed);
        assert_eq!(todo.completed_at, Some(now));

        todo.toggle(now);
        assert!(!todo.completed);
        assert_eq!(todo.completed_at, None);
    }

    #[test]
    fn theme_toggles_between_two_values() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert!(Theme::Dark.is_dark());
    }

    #[test]
    fn theme_parse() {
        assert_eq!("Dark".parse::<Theme>().ok(), Some(Theme::Dark));
        assert_eq!(" light ".parse::<Theme>().ok(), Some(Theme::Light));
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn state_views_preserve_order() {
        let mut state = TodoState::new();
        for (raw, done) in [(1, false), (2, true), (3, false), (4, true)] {
            let mut todo = Todo::new(TodoId::new(raw), format!("todo {raw}"));
            if done {
                todo.toggle(Utc::now());
            }
            state.todos.push(todo);
        }

        let pending: Vec<u64> = state.pending().map(|t| t.id.get()).collect();
        let completed: Vec<u64> = state.completed().map(|t| t.id.get()).collect();
        assert_eq!(pending, vec![1, 3]);
        assert_eq!(completed, vec![2, 4]);
        assert_eq!(state.pending_count(), 2);
        assert_eq!(state.completed_count(), 2);
        assert!(state.contains(TodoId::new(3)));
        assert!(!state.contains(TodoId::new(9)));
    }

    #[test]
    fn state_serializes_in_view_shape() {
        let mut state = TodoState::with_theme(Theme::Dark);
        state.todos.push(Todo::new(TodoId::new(7), "buy milk".to_string()));

        let json = serde_json::to_value(&state).unwrap_or_default();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["todos"][0]["id"], 7);
        assert_eq!(json["todos"][0]["text"], "buy milk");
        assert_eq!(json["todos"][0]["completed"], false);
        assert!(json["todos"][0]["completedAt"].is_null());
    }

    #[test]
    fn checked_constructors_trim_and_reject_empty() {
        assert_eq!(
            TodoAction::add("  buy milk ").ok(),
            Some(TodoAction::AddTodo {
                text: "buy milk".to_string()
            })
        );
        assert!(matches!(TodoAction::add("   "), Err(ActionError::EmptyText)));
        assert!(matches!(
            TodoAction::edit(TodoId::new(1), ""),
            Err(ActionError::EmptyText)
        ));
    }

    #[test]
    fn action_kinds() {
        assert_eq!(TodoAction::add("x").map(|a| a.kind()).ok(), Some("ADD_TODO"));
        assert_eq!(TodoAction::delete(TodoId::new(1)).kind(), "DELETE_TODO");
        assert_eq!(TodoAction::toggle(TodoId::new(1)).kind(), "TOGGLE_TODO");
        assert_eq!(TodoAction::clear_all().kind(), "CLEAR_TODOS");
        assert_eq!(TodoAction::toggle_theme().kind(), "TOGGLE_THEME");
        assert_eq!(TodoAction::Unknown.kind(), "UNKNOWN");
    }

    #[test]
    fn wire_format_matches_kind() {
        let action = TodoAction::EditTodo {
            id: TodoId::new(5),
            new_text: "buy oat milk".to_string(),
        };
        let json = action.to_json().unwrap_or_default();
        assert_eq!(
            json,
            r#"{"type":"EDIT_TODO","payload":{"id":5,"newText":"buy oat milk"}}"#
        );
        assert_eq!(TodoAction::from_json(&json).ok(), Some(action));
    }

    #[test]
    fn from_json_unit_kinds() {
        assert_eq!(
            TodoAction::from_json(r#"{"type":"CLEAR_TODOS"}"#).ok(),
            Some(TodoAction::ClearTodos)
        );
        assert_eq!(
            TodoAction::from_json(r#"{"type":"TOGGLE_THEME"}"#).ok(),
            Some(TodoAction::ToggleTheme)
        );
    }

    #[test]
    fn from_json_unknown_kind_is_unknown() {
        assert_eq!(
            TodoAction::from_json(r#"{"type":"ARCHIVE_TODO","payload":{"id":1}}"#).ok(),
            Some(TodoAction::Unknown)
        );
        assert_eq!(
            TodoAction::from_json(r#"{"type":"UNKNOWN"}"#).ok(),
            Some(TodoAction::Unknown)
        );
    }

    #[test]
    fn from_json_rejects_malformed() {
        assert!(TodoAction::from_json("not json").is_err());
        assert!(TodoAction::from_json(r#"{"payload":1}"#).is_err());
        assert!(TodoAction::from_json(r#"{"type":"DELETE_TODO","payload":"x"}"#).is_err());
        assert!(TodoAction::from_json(r#"{"type":"TOGGLE_TODO","payload":{"id":1}}"#).is_err());
    }

    #[test]
    fn id_actions_carry_bare_id_payload() {
        let id = TodoId::new(1_735_689_600_000);
        assert_eq!(
            TodoAction::from_json(r#"{"type":"DELETE_TODO","payload":1735689600000}"#).ok(),
            Some(TodoAction::delete(id))
        );
        assert_eq!(
            TodoAction::from_json(r#"{"type":"TOGGLE_TODO","payload":1735689600000}"#).ok(),
            Some(TodoAction::toggle(id))
        );
        assert_eq!(
            TodoAction::delete(TodoId::new(5)).to_json().unwrap_or_default(),
            r#"{"type":"DELETE_TODO","payload":5}"#
        );
        assert_eq!(
            TodoAction::toggle(TodoId::new(5)).to_json().unwrap_or_default(),
            r#"{"type":"TOGGLE_TODO","payload":5}"#
        );
    }

    #[test]
    fn add_accepts_full_record_payload() {
        let json = r#"{"type":"ADD_TODO","payload":{"id":1735689600000,"text":"buy milk","completed":false,"completedAt":null}}"#;
        assert_eq!(
            TodoAction::from_json(json).ok(),
            Some(TodoAction::AddTodo {
                text: "buy milk".to_string()
            })
        );
    }
}
