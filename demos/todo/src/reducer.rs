//! Reducer logic for the todo list.
//!
//! Every transition is total: unknown ids and unrecognised kinds leave the
//! state as it was. Text is stored exactly as given; the checked
//! constructors on [`TodoAction`] are where empty input gets rejected.

use crate::types::{Theme, Todo, TodoAction, TodoId, TodoState};
use serde::{Deserialize, Serialize};
use statekit_core::{
    SmallVec,
    effect::Effect,
    environment::{Clock, IdGenerator, SystemClock, TimestampIds},
    reducer::Reducer,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for completion timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of todo ids
    pub ids: Arc<dyn IdGenerator>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// System time, with ids derived from creation time
    #[must_use]
    pub fn live() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids = Arc::new(TimestampIds::new(Arc::clone(&clock)));
        Self::new(clock, ids)
    }
}

impl fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TodoEnvironment").finish_non_exhaustive()
    }
}

/// Which set of transitions the reducer implements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerMode {
    /// Every action, with completion timestamps
    #[default]
    Full,
    /// Add, delete, toggle and clear only. Toggle does not record
    /// `completed_at`; edit and theme actions are unrecognised.
    Legacy,
}

impl ReducerMode {
    /// Returns true if this mode gives `action` any meaning
    #[must_use]
    pub const fn recognises(self, action: &TodoAction) -> bool {
        match action {
            TodoAction::Unknown => false,
            TodoAction::EditTodo { .. } | TodoAction::ToggleTheme => matches!(self, Self::Full),
            TodoAction::AddTodo { .. }
            | TodoAction::DeleteTodo(_)
            | TodoAction::ToggleTodo(_)
            | TodoAction::ClearTodos => true,
        }
    }

    /// Returns true if toggling to done records a timestamp
    #[must_use]
    pub const fn tracks_completion_time(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for ReducerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

/// Error parsing a [`ReducerMode`] from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown reducer mode {0:?} (expected \"full\" or \"legacy\")")]
pub struct ParseModeError(String);

impl FromStr for ReducerMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "legacy" => Ok(Self::Legacy),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Reducer for the todo list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer {
    mode: ReducerMode,
}

impl TodoReducer {
    /// Creates a reducer with every transition enabled
    #[must_use]
    pub const fn new() -> Self {
        Self::with_mode(ReducerMode::Full)
    }

    /// Creates a reducer restricted to the legacy transitions
    #[must_use]
    pub const fn legacy() -> Self {
        Self::with_mode(ReducerMode::Legacy)
    }

    /// Creates a reducer in the given mode
    #[must_use]
    pub const fn with_mode(mode: ReducerMode) -> Self {
        Self { mode }
    }

    /// The mode this reducer runs in
    #[must_use]
    pub const fn mode(&self) -> ReducerMode {
        self.mode
    }

    /// Draws ids until one is free; seeded state may already hold ids the
    /// generator has not produced yet.
    fn fresh_id(state: &TodoState, env: &TodoEnvironment) -> TodoId {
        loop {
            let id = TodoId::new(env.ids.next_id());
            if !state.contains(id) {
                return id;
            }
        }
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if !self.mode.recognises(&action) {
            tracing::debug!(kind = action.kind(), mode = %self.mode, "Ignoring unrecognised action");
            return SmallVec::new();
        }

        match action {
            TodoAction::AddTodo { text } => {
                let id = Self::fresh_id(state, env);
                tracing::debug!(%id, "Adding todo");
                state.todos.push(Todo::new(id, text));
            },

            TodoAction::DeleteTodo(id) => {
                let before = state.todos.len();
                state.todos.retain(|todo| todo.id != id);
                if state.todos.len() == before {
                    tracing::debug!(%id, "Delete of unknown todo ignored");
                }
            },

            TodoAction::ToggleTodo(id) => match state.get_mut(id) {
                Some(todo) if self.mode.tracks_completion_time() => todo.toggle(env.clock.now()),
                Some(todo) => {
                    todo.completed = !todo.completed;
                    if !todo.completed {
                        todo.completed_at = None;
                    }
                },
                None => tracing::debug!(%id, "Toggle of unknown todo ignored"),
            },

            TodoAction::EditTodo { id, new_text } => match state.get_mut(id) {
                Some(todo) => todo.text = new_text,
                None => tracing::debug!(%id, "Edit of unknown todo ignored"),
            },

            TodoAction::ClearTodos => state.todos.clear(),

            TodoAction::ToggleTheme => state.theme = state.theme.toggled(),

            // Filtered by `recognises` above.
            TodoAction::Unknown => {},
        }

        SmallVec::new()
    }
}

/// Apply `action` to a copy of `state` with the full reducer
///
/// `state` is left untouched; the successor is returned.
#[must_use]
pub fn transition(state: &TodoState, action: TodoAction, env: &TodoEnvironment) -> TodoState {
    TodoReducer::new().step(state, action, env).0
}

/// Theme the view should offer to switch to
#[must_use]
pub const fn next_theme(state: &TodoState) -> Theme {
    state.theme.toggled()
}
