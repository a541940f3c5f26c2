//! # Todos Testing
//!
//! Testing utilities and helpers for the reducer architecture.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - [`ReducerTest`], a Given-When-Then builder for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use todos_testing::{IncrementingUuidGenerator, ReducerTest};
//!
//! ReducerTest::new(TodosReducer::new())
//!     .with_env(test_environment())
//!     .given_state(AppState::new())
//!     .when_action(TodosAction::AddItem)
//!     .then_state(|state| assert_eq!(state.len(), 1))
//!     .run();
//! ```

use todos_core::environment::UuidGenerator;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::UuidGenerator;
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    /// UUID generator that counts up from zero
    ///
    /// The first id is `00000000-0000-0000-0000-000000000000`, the second
    /// ends in `...0001`, and so on. Tests can name the ids a reducer will
    /// assign with [`IncrementingUuidGenerator::nth`].
    ///
    /// # Example
    ///
    /// ```
    /// use todos_testing::mocks::IncrementingUuidGenerator;
    /// use todos_core::environment::UuidGenerator;
    ///
    /// let generator = IncrementingUuidGenerator::new();
    /// assert_eq!(generator.generate(), IncrementingUuidGenerator::nth(0));
    /// assert_eq!(generator.generate(), IncrementingUuidGenerator::nth(1));
    /// ```
    #[derive(Debug, Default)]
    pub struct IncrementingUuidGenerator {
        next: AtomicU64,
    }

    impl IncrementingUuidGenerator {
        /// Create a generator starting at zero
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }

        /// The id produced by the `n`th call (zero-based)
        #[must_use]
        pub const fn nth(n: u64) -> Uuid {
            Uuid::from_u128(n as u128)
        }
    }

    impl UuidGenerator for IncrementingUuidGenerator {
        fn generate(&self) -> Uuid {
            Self::nth(self.next.fetch_add(1, Ordering::SeqCst))
        }
    }

    /// UUID generator that always returns the same id
    #[derive(Debug, Clone, Copy)]
    pub struct ConstantUuidGenerator(pub Uuid);

    impl UuidGenerator for ConstantUuidGenerator {
        fn generate(&self) -> Uuid {
            self.0
        }
    }
}

// Re-export commonly used items
pub use mocks::{ConstantUuidGenerator, IncrementingUuidGenerator};
pub use reducer_test::{assertions, ReducerTest};
