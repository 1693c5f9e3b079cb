//! # Statekit Core
//!
//! Core traits and types for building reducer-driven state containers.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature
//! - **Action**: All possible inputs to a reducer
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (clock, id generation)
//!
//! ## Example
//!
//! ```
//! use statekit_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! enum CounterAction {
//!     Increment,
//!     Reset,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!             CounterAction::Reset => state.count = 0,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let before = CounterState::default();
//! let (after, _effects) = CounterReducer.step(&before, CounterAction::Increment, &());
//! assert_eq!(before.count, 0);
//! assert_eq!(after.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Effects returned by a single reduction.
    ///
    /// Most reducers return zero or one effect, so four inline slots avoid
    /// a heap allocation on the hot path.
    pub type Effects<Action> = SmallVec<[Effect<Action>; 4]>;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns effect descriptions for the
        /// runtime to execute. Must not perform I/O itself.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action>;

        /// Apply an action to a copy of `state`, leaving the input untouched
        ///
        /// This is the value-in, value-out form of [`Reducer::reduce`]: the
        /// caller keeps its snapshot and receives the successor state along
        /// with any effects.
        fn step(
            &self,
            state: &Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> (Self::State, Effects<Self::Action>)
        where
            Self::State: Clone,
        {
            let mut next = state.clone();
            let effects = self.reduce(&mut next, action, env);
            (next, effects)
        }
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution).
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Wrap a future whose output (if any) is fed back as an action
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Returns true if this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) => effects.iter().all(Effect::is_none),
                Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All sources of non-determinism a reducer needs (time, identifiers) are
/// abstracted behind traits and injected via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of unique numeric identifiers
    pub trait IdGenerator: Send + Sync {
        /// Produce the next identifier
        ///
        /// Implementations must never return the same value twice.
        fn next_id(&self) -> u64;
    }

    /// Identifiers derived from creation time
    ///
    /// Each id is the clock's Unix time in milliseconds. When two ids are
    /// requested within the same millisecond (or the clock goes backwards)
    /// the previous id plus one is returned instead, so the sequence is
    /// strictly increasing.
    ///
    /// ```
    /// use statekit_core::environment::{IdGenerator, SystemClock, TimestampIds};
    /// use std::sync::Arc;
    ///
    /// let ids = TimestampIds::new(Arc::new(SystemClock));
    /// let a = ids.next_id();
    /// let b = ids.next_id();
    /// assert!(b > a);
    /// ```
    pub struct TimestampIds {
        clock: Arc<dyn Clock>,
        last: AtomicU64,
    }

    impl TimestampIds {
        /// Creates a generator reading time from `clock`
        #[must_use]
        pub fn new(clock: Arc<dyn Clock>) -> Self {
            Self {
                clock,
                last: AtomicU64::new(0),
            }
        }
    }

    impl std::fmt::Debug for TimestampIds {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("TimestampIds")
                .field("last", &self.last.load(Ordering::Relaxed))
                .finish_non_exhaustive()
        }
    }

    impl IdGenerator for TimestampIds {
        fn next_id(&self) -> u64 {
            // Pre-epoch clocks clamp to zero and fall through to `last + 1`.
            let now = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
            let mut prev = self.last.load(Ordering::Acquire);
            loop {
                let next = now.max(prev.saturating_add(1));
                match self
                    .last
                    .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => return next,
                    Err(actual) => prev = actual,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, IdGenerator, TimestampIds};
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    struct StuckClock(DateTime<Utc>);

    impl Clock for StuckClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn timestamp_ids_start_at_clock_millis() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap_or_default();
        let ids = TimestampIds::new(Arc::new(StuckClock(at)));
        assert_eq!(ids.next_id(), 1_700_000_000_123);
    }

    #[test]
    fn timestamp_ids_bump_within_same_millisecond() {
        let at = DateTime::from_timestamp_millis(42).unwrap_or_default();
        let ids = TimestampIds::new(Arc::new(StuckClock(at)));
        let got: Vec<u64> = (0..4).map(|_| ids.next_id()).collect();
        assert_eq!(got, vec![42, 43, 44, 45]);
    }

    #[test]
    fn timestamp_ids_unique_across_threads() {
        let at = DateTime::from_timestamp_millis(7).unwrap_or_default();
        let ids = Arc::new(TimestampIds::new(Arc::new(StuckClock(at))));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_default())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn effect_is_none() {
        assert!(Effect::<()>::None.is_none());
        assert!(Effect::<()>::merge(vec![Effect::None, Effect::None]).is_none());
        assert!(!Effect::<()>::future(async { None }).is_none());
    }
}
