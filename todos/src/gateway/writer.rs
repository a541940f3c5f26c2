//! Ordered write queue in front of a gateway.
//!
//! Writes are queued the moment the reducer issues them, while the store
//! still holds its state lock, and a single task applies them in that order.
//! Effects from different actions may run on different tasks in any order,
//! but the gateway always sees writes in the order the reducer produced them.

use super::{GatewayError, TodoGateway};
use crate::types::{TodoId, TodoItem};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// A single persistence call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Write {
    /// Insert a new todo
    Create(TodoItem),
    /// Overwrite a stored todo
    Update(TodoItem),
    /// Remove a stored todo
    Delete(TodoId),
}

impl Write {
    const fn operation(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }

    const fn id(&self) -> TodoId {
        match self {
            Self::Create(item) | Self::Update(item) => item.id,
            Self::Delete(id) => *id,
        }
    }
}

struct Job {
    write: Write,
    done: oneshot::Sender<()>,
}

type Idle = (mpsc::UnboundedReceiver<Job>, Arc<dyn TodoGateway>);

/// Serializes writes to a [`TodoGateway`] in submission order
///
/// The draining task is spawned by the first [`submit`](Self::submit) made
/// inside a Tokio runtime. Until then writes wait in the queue, so reducers
/// can be exercised without a runtime.
#[derive(Clone)]
pub struct GatewayWriter {
    sender: mpsc::UnboundedSender<Job>,
    idle: Arc<Mutex<Option<Idle>>>,
}

impl GatewayWriter {
    /// Creates a writer for `gateway`
    #[must_use]
    pub fn new(gateway: Arc<dyn TodoGateway>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            idle: Arc::new(Mutex::new(Some((receiver, gateway)))),
        }
    }

    /// Queues `write` behind every earlier one
    ///
    /// The returned receiver resolves once the write has been applied, or
    /// errors if the draining task is gone. Failures are logged by the writer
    /// and never reported back.
    pub fn submit(&self, write: Write) -> oneshot::Receiver<()> {
        let (done, applied) = oneshot::channel();
        if let Err(mpsc::error::SendError(job)) = self.sender.send(Job { write, done }) {
            tracing::warn!(
                operation = job.write.operation(),
                id = %job.write.id(),
                "Todo writer stopped, dropping write"
            );
        }
        self.start();
        applied
    }

    fn start(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((receiver, gateway)) = idle.take() {
            tracing::debug!("Starting todo writer");
            runtime.spawn(drain(receiver, gateway));
        }
    }
}

impl std::fmt::Debug for GatewayWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayWriter")
            .field("closed", &self.sender.is_closed())
            .finish_non_exhaustive()
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<Job>, gateway: Arc<dyn TodoGateway>) {
    while let Some(Job { write, done }) = receiver.recv().await {
        let operation = write.operation();
        let id = write.id();
        let result: Result<(), GatewayError> = match write {
            Write::Create(item) => gateway.create(item).await,
            Write::Update(item) => gateway.update(item).await,
            Write::Delete(id) => gateway.delete(id).await,
        };
        if let Err(error) = result {
            tracing::warn!(operation, %id, %error, "Persisting todo failed");
        }
        // Nobody waiting is fine
        let _ = done.send(());
    }
    tracing::debug!("Todo writer stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;

    #[tokio::test]
    async fn writes_land_in_submission_order() {
        let gateway = Arc::new(InMemoryGateway::empty());
        let writer = GatewayWriter::new(Arc::clone(&gateway) as Arc<dyn TodoGateway>);
        let kept = TodoItem::new(TodoId::new());
        let dropped = TodoItem::new(TodoId::new());

        // Only the last write is awaited
        let _created = writer.submit(Write::Create(kept.clone()));
        let _edited = writer.submit(Write::Update(kept.clone().with_description("typed")));
        let _extra = writer.submit(Write::Create(dropped.clone()));
        writer.submit(Write::Delete(dropped.id)).await.unwrap();

        assert_eq!(
            gateway.snapshot().await,
            vec![kept.with_description("typed")]
        );
    }

    #[test]
    fn queues_without_a_runtime() {
        let writer = GatewayWriter::new(Arc::new(InMemoryGateway::empty()));
        let mut applied = writer.submit(Write::Delete(TodoId::new()));

        assert!(matches!(
            applied.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn failed_writes_still_complete() {
        let gateway = Arc::new(InMemoryGateway::empty());
        let writer = GatewayWriter::new(Arc::clone(&gateway) as Arc<dyn TodoGateway>);
        let item = TodoItem::new(TodoId::new());

        writer.submit(Write::Create(item.clone())).await.unwrap();
        // Duplicate create is rejected by the gateway
        writer.submit(Write::Create(item)).await.unwrap();

        assert_eq!(gateway.len().await, 1);
    }
}
