use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::types::{CalculationId, NewCalculation, OwnerKey, SavedCalculation};

/// Append-only storage for saved calculations.
///
/// Implementations never update or delete rows and only ever read one
/// owner's partition per call.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Short backend name for status reporting.
    fn backend(&self) -> &'static str;

    /// Create tables and indexes if they are missing. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Append one record, assigning its id and creation time.
    async fn insert(&self, record: NewCalculation) -> Result<SavedCalculation, StoreError>;

    /// Records owned by `owner`, newest first, at most `limit` of them.
    async fn recent(
        &self,
        owner: &OwnerKey,
        limit: u32,
    ) -> Result<Vec<SavedCalculation>, StoreError>;
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    rows: RwLock<Vec<SavedCalculation>>,
    next_id: AtomicI64,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, record: NewCalculation) -> Result<SavedCalculation, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let saved = SavedCalculation {
            id: CalculationId::new(id),
            owner_key: Some(record.owner_key),
            params: record.params,
            final_point: record.final_point,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn recent(
        &self,
        owner: &OwnerKey,
        limit: u32,
    ) -> Result<Vec<SavedCalculation>, StoreError> {
        let rows = self.rows.read().await;
        let mut owned = rows
            .iter()
            .filter(|row| row.owner_key.as_ref() == Some(owner))
            .cloned()
            .collect::<Vec<_>>();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        owned.truncate(limit as usize);
        Ok(owned)
    }
}
