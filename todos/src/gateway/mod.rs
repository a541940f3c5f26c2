//! Persistence gateway for todo items.
//!
//! The reducer only sees [`TodoGateway`] through the environment, so the
//! storage backend can be swapped without touching business logic:
//!
//! - [`InMemoryGateway`]: `HashMap` storage for tests and throwaway runs
//! - [`SqliteGateway`]: a local `SQLite` file through `sqlx`
//! - [`PreviewGateway`]: wraps another gateway and seeds it before every call
//!
//! Every gateway runs one operation at a time. [`GatewayWriter`] sits in
//! front of a gateway and applies writes in the order they were issued.

use crate::types::{TodoId, TodoItem};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

mod memory;
mod preview;
mod sqlite;
mod writer;

pub use memory::InMemoryGateway;
pub use preview::PreviewGateway;
pub use sqlite::SqliteGateway;
pub use writer::{GatewayWriter, Write};

/// Maximum number of todos returned by `list_all` unless configured otherwise
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Boxed future returned by gateway operations
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Errors that can occur during gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The backing store could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed
    #[error("Query error: {0}")]
    Query(String),

    /// A stored row cannot be turned back into a todo
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Storage for todo items
///
/// `update` and `delete` of an unknown id succeed without doing anything.
pub trait TodoGateway: Send + Sync {
    /// Seeds the store with its default items if it is empty
    ///
    /// Only the first call on a gateway instance does anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    fn initialize(&self) -> GatewayFuture<'_, ()>;

    /// Returns stored todos ordered by `order_index`, up to the list limit
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or a record is corrupt.
    fn list_all(&self) -> GatewayFuture<'_, Vec<TodoItem>>;

    /// Inserts a new todo
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the id is already stored.
    fn create(&self, item: TodoItem) -> GatewayFuture<'_, ()>;

    /// Fetches one todo by id
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the record is corrupt.
    fn read(&self, id: TodoId) -> GatewayFuture<'_, Option<TodoItem>>;

    /// Overwrites the stored copy of `item`
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update(&self, item: TodoItem) -> GatewayFuture<'_, ()>;

    /// Removes a todo
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn delete(&self, id: TodoId) -> GatewayFuture<'_, ()>;
}

/// Items a fresh store is seeded with, each with a new random id
#[must_use]
pub fn default_seed() -> Vec<TodoItem> {
    [
        ("Wakeup", true),
        ("Homework", false),
        ("Play Videogames", true),
        ("Do Keto", true),
        ("Go to Bed", false),
    ]
    .into_iter()
    .enumerate()
    .map(|(order_index, (description, is_complete))| {
        TodoItem::new(TodoId::new())
            .with_description(description)
            .with_complete(is_complete)
            .with_order_index(order_index)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::has_dense_order;

    #[test]
    fn default_seed_contents() {
        let seed = default_seed();

        let rows: Vec<(&str, bool)> = seed
            .iter()
            .map(|item| (item.description.as_str(), item.is_complete))
            .collect();
        assert_eq!(
            rows,
            [
                ("Wakeup", true),
                ("Homework", false),
                ("Play Videogames", true),
                ("Do Keto", true),
                ("Go to Bed", false),
            ]
        );
        assert!(has_dense_order(&seed));
    }

    #[test]
    fn default_seed_uses_fresh_ids() {
        let first = default_seed();
        let second = default_seed();

        assert_ne!(first[0].id, second[0].id);
    }
}
