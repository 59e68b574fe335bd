//! Buffer for normalized inbound messages.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::message::NormalizedMessage;

/// Contract implemented by message buffers.
///
/// Records are kept in insertion order. No deduplication is performed: adding
/// the same id twice stores two records.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn add(&self, message: NormalizedMessage) -> Result<()>;

    /// Appends every message from one delivery. Implementations should make
    /// the batch visible as a unit when they can.
    async fn extend(&self, messages: Vec<NormalizedMessage>) -> Result<()> {
        for message in messages {
            self.add(message).await?;
        }
        Ok(())
    }

    /// Returns all records, oldest first.
    async fn get_all(&self) -> Result<Vec<NormalizedMessage>>;

    async fn clear(&self) -> Result<()>;

    async fn len(&self) -> Result<usize>;
}

/// Shared trait object wrapper.
pub type SharedMessageStore = Arc<dyn MessageStore>;

/// Process-local store; contents are lost on restart and grow without bound.
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    inner: Arc<RwLock<Vec<NormalizedMessage>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn add(&self, message: NormalizedMessage) -> Result<()> {
        self.inner.write().await.push(message);
        Ok(())
    }

    async fn extend(&self, messages: Vec<NormalizedMessage>) -> Result<()> {
        self.inner.write().await.extend(messages);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<NormalizedMessage>> {
        Ok(self.inner.read().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().await.len())
    }
}
