pub mod elastic;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Entity;
use crate::pagination::{Page, Pageable};

pub use elastic::{ElasticsearchConfig, ElasticsearchIndex};
pub use memory::InMemoryIndex;

/// Full-text mirror of the record store.
///
/// Kept in step by the services: every save re-indexes, every delete removes.
#[async_trait]
pub trait SearchIndex<E: Entity>: Send + Sync {
    async fn index(&self, entity: &E) -> Result<()>;

    /// Removing an absent document is a no-op.
    async fn remove(&self, id: i64) -> Result<()>;

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>>;

    async fn ping(&self) -> Result<()>;
}
