//! A todo list built on a reducer-driven store.
//!
//! Users add, edit, complete, delete and clear short text items, and switch
//! between a light and a dark theme. All of it is one [`TodoState`] value
//! changed only by [`TodoAction`]s applied through [`TodoReducer`].
//!
//! # Quick Start
//!
//! ```no_run
//! use todo::{TodoAction, TodoConfig, TodoEnvironment, build_store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = build_store(&TodoConfig::from_env()?, TodoEnvironment::live());
//! let mut updates = store.subscribe();
//!
//! store.send(TodoAction::add("buy milk")?).await?;
//! updates.changed().await?;
//!
//! let state = store.snapshot().await;
//! let id = state.todos[0].id;
//! store.send(TodoAction::toggle(id)).await?;
//!
//! println!("Completed: {}", store.state(|s| s.completed_count()).await);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reducer;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use config::{ConfigError, TodoConfig};
pub use reducer::{ReducerMode, TodoEnvironment, TodoReducer, transition};
pub use types::{ActionError, Theme, Todo, TodoAction, TodoId, TodoState};

use statekit_runtime::Store;

/// The store type the view talks to
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// Build a store from configuration
///
/// Starts from an empty list in the configured theme, with the configured
/// reducer mode and broadcast capacity.
#[must_use]
pub fn build_store(config: &TodoConfig, env: TodoEnvironment) -> TodoStore {
    Store::with_config(
        config.initial_state(),
        TodoReducer::with_mode(config.mode),
        env,
        config.store_config(),
    )
}
