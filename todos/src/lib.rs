//! Todo list built on the reducer architecture.
//!
//! The whole screen is one [`AppState`] value changed only by
//! [`TodosReducer`]. Persistence goes through a [`TodoGateway`] held in the
//! [`TodosEnvironment`], so the reducer stays pure and testable:
//!
//! - Adding, editing, deleting and reordering todos
//! - Completed todos sink to the bottom once toggling pauses for a second
//! - Edit mode with multi-select and confirmed bulk deletes
//! - Order indices kept dense and persisted after every structural change
//!
//! # Quick Start
//!
//! ```no_run
//! use todos::gateway::InMemoryGateway;
//! use todos::{AppState, TodosAction, TodosEnvironment, TodosReducer};
//! use todos_core::environment::RandomUuidGenerator;
//! use todos_runtime::Store;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodosEnvironment::new(
//!     Arc::new(InMemoryGateway::new()),
//!     Arc::new(RandomUuidGenerator),
//! );
//! let store = Store::new(AppState::new(), TodosReducer::new(), env);
//!
//! // Load the seeded todos
//! store
//!     .send_and_wait_for(
//!         TodosAction::Activate,
//!         |action| matches!(action, TodosAction::LoadSucceeded(_)),
//!         Duration::from_secs(1),
//!     )
//!     .await?;
//!
//! store.send(TodosAction::AddItem).await?;
//!
//! let state = store.state(Clone::clone).await;
//! println!("Total todos: {}", state.len());
//! println!("Completed: {}", state.completed_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod ordering;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use gateway::{GatewayError, TodoGateway};
pub use reducer::{TodosEnvironment, TodosReducer, DEFAULT_RESORT_DELAY, SORT_DEBOUNCE};
pub use types::{AppState, LoadStatus, Prompt, TodoId, TodoItem, TodosAction};
