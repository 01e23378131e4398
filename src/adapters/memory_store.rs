use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    app::ports::RecordRepositoryPort,
    domain::{
        errors::{DomainError, Result},
        models::Record,
    },
};

/// Process-local record list. Contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryRecordStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T> InMemoryRecordStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T> Default for InMemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordRepositoryPort<T> for InMemoryRecordStore<T> {
    async fn insert(&self, record: T) -> Result<()> {
        let id = record
            .record_id()
            .ok_or_else(|| DomainError::InvalidData(format!("{} id is required", T::KIND)))?
            .to_string();
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.record_id() == Some(id.as_str())) {
            return Err(DomainError::InvalidData(format!(
                "{} '{}' already exists",
                T::KIND,
                id
            )));
        }
        records.push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.record_id() == Some(id))
            .cloned())
    }

    async fn replace(&self, record: T) -> Result<bool> {
        let mut records = self.records.write().await;
        let Some(slot) = records
            .iter_mut()
            .find(|r| r.record_id().is_some() && r.record_id() == record.record_id())
        else {
            return Ok(false);
        };
        *slot = record;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.record_id() != Some(id));
        Ok(records.len() != before)
    }
}
