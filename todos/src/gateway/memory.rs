//! `HashMap`-backed gateway.

use super::{default_seed, GatewayError, GatewayFuture, TodoGateway, DEFAULT_LIST_LIMIT};
use crate::types::{TodoId, TodoItem};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Records {
    /// Items keyed by id, each with its insertion sequence number
    items: HashMap<TodoId, (u64, TodoItem)>,
    next_sequence: u64,
    initialized: bool,
}

impl Records {
    fn insert(&mut self, item: TodoItem) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.items.insert(item.id, (sequence, item));
    }

    /// Items by order index, ties broken by insertion order
    fn ordered(&self) -> Vec<TodoItem> {
        let mut rows: Vec<&(u64, TodoItem)> = self.items.values().collect();
        rows.sort_by_key(|(sequence, item)| (item.order_index, *sequence));
        rows.into_iter().map(|(_, item)| item.clone()).collect()
    }
}

/// In-memory gateway for tests and ephemeral runs
///
/// # Example
///
/// ```
/// use todos::gateway::{InMemoryGateway, TodoGateway};
///
/// # async fn example() -> Result<(), todos::gateway::GatewayError> {
/// let gateway = InMemoryGateway::new();
/// gateway.initialize().await?;
///
/// let items = gateway.list_all().await?;
/// assert_eq!(items.len(), 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryGateway {
    records: Mutex<Records>,
    seed: Vec<TodoItem>,
    list_limit: usize,
}

impl InMemoryGateway {
    /// Create an empty gateway that seeds [`default_seed`] on `initialize`
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(default_seed())
    }

    /// Create an empty gateway that seeds nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::with_seed(Vec::new())
    }

    /// Create an empty gateway that seeds `seed` on `initialize`
    #[must_use]
    pub fn with_seed(seed: Vec<TodoItem>) -> Self {
        Self {
            records: Mutex::new(Records::default()),
            seed,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Create a gateway already holding `items`
    ///
    /// `initialize` will not seed because the store is not empty.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = TodoItem>) -> Self {
        let mut records = Records::default();
        for item in items {
            records.insert(item);
        }
        Self {
            records: Mutex::new(records),
            seed: Vec::new(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// Cap the number of items `list_all` returns
    #[must_use]
    pub const fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    /// Every stored item in `list_all` order, ignoring the limit
    ///
    /// Useful for assertions in tests.
    pub async fn snapshot(&self) -> Vec<TodoItem> {
        self.records.lock().await.ordered()
    }

    /// Number of stored items
    pub async fn len(&self) -> usize {
        self.records.lock().await.items.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.items.is_empty()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoGateway for InMemoryGateway {
    fn initialize(&self) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut records = self.records.lock().await;
            if records.initialized {
                return Ok(());
            }
            records.initialized = true;

            if records.items.is_empty() {
                tracing::debug!(count = self.seed.len(), "Seeding in-memory todos");
                for item in &self.seed {
                    records.insert(item.clone());
                }
            }
            Ok(())
        })
    }

    fn list_all(&self) -> GatewayFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            let records = self.records.lock().await;
            let mut items = records.ordered();
            items.truncate(self.list_limit);
            Ok(items)
        })
    }

    fn create(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut records = self.records.lock().await;
            if records.items.contains_key(&item.id) {
                return Err(GatewayError::Query(format!("todo {} already exists", item.id)));
            }
            records.insert(item);
            Ok(())
        })
    }

    fn read(&self, id: TodoId) -> GatewayFuture<'_, Option<TodoItem>> {
        Box::pin(async move {
            let records = self.records.lock().await;
            Ok(records.items.get(&id).map(|(_, item)| item.clone()))
        })
    }

    fn update(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let mut records = self.records.lock().await;
            if let Some((_, stored)) = records.items.get_mut(&item.id) {
                *stored = item;
            }
            Ok(())
        })
    }

    fn delete(&self, id: TodoId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.records.lock().await.items.remove(&id);
            Ok(())
        })
    }
}
