use async_trait::async_trait;

use crate::domain::{errors::Result, models::Record};

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Raw bytes of the declarative tool configuration.
pub trait ConfigSourcePort: Send + Sync {
    fn describe(&self) -> String;

    fn read(&self) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait RecordRepositoryPort<T: Record>: Send + Sync {
    async fn insert(&self, record: T) -> Result<()>;
    async fn list(&self) -> Result<Vec<T>>;
    async fn get(&self, id: &str) -> Result<Option<T>>;
    /// Replaces the record with the same id; `false` when none exists.
    async fn replace(&self, record: T) -> Result<bool>;
    async fn delete(&self, id: &str) -> Result<bool>;
}
