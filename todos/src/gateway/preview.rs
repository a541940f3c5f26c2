//! Gateway wrapper that seeds before every operation.

use super::{GatewayFuture, TodoGateway};
use crate::types::{TodoId, TodoItem};

/// Runs `initialize` on the wrapped gateway before each call
///
/// Demos and previews read seeded data without sending an activation first.
/// `initialize` only seeds once per instance, so the extra calls are cheap.
#[derive(Debug, Default)]
pub struct PreviewGateway<G> {
    inner: G,
}

impl<G: TodoGateway> PreviewGateway<G> {
    /// Wraps `inner`
    #[must_use]
    pub const fn new(inner: G) -> Self {
        Self { inner }
    }

    /// The wrapped gateway
    #[must_use]
    pub const fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: TodoGateway> TodoGateway for PreviewGateway<G> {
    fn initialize(&self) -> GatewayFuture<'_, ()> {
        self.inner.initialize()
    }

    fn list_all(&self) -> GatewayFuture<'_, Vec<TodoItem>> {
        Box::pin(async move {
            self.inner.initialize().await?;
            self.inner.list_all().await
        })
    }

    fn create(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.inner.initialize().await?;
            self.inner.create(item).await
        })
    }

    fn read(&self, id: TodoId) -> GatewayFuture<'_, Option<TodoItem>> {
        Box::pin(async move {
            self.inner.initialize().await?;
            self.inner.read(id).await
        })
    }

    fn update(&self, item: TodoItem) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.inner.initialize().await?;
            self.inner.update(item).await
        })
    }

    fn delete(&self, id: TodoId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.inner.initialize().await?;
            self.inner.delete(id).await
        })
    }
}
