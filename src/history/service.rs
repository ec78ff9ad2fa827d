use std::sync::Arc;

use super::error::HistoryError;
use super::store::HistoryStore;
use super::types::{Caller, CalculationParams, NewCalculation, OwnerKey, SavedCalculation};
use crate::core::ProjectionPoint;

/// Largest page `list` will return.
pub const MAX_LIST_LIMIT: u32 = 50;

/// Owner-scoped access to saved calculations.
///
/// Every operation takes the [`Caller`] explicitly; anonymous callers are
/// rejected before the store is touched.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn ensure_schema(&self) -> Result<(), HistoryError> {
        self.store.ensure_schema().await?;
        Ok(())
    }

    /// Newest-first records owned by `caller`. `limit` defaults to and is
    /// capped at [`MAX_LIST_LIMIT`].
    pub async fn list(
        &self,
        caller: &Caller,
        limit: Option<u32>,
    ) -> Result<Vec<SavedCalculation>, HistoryError> {
        let owner = require_owner(caller, "list")?;
        let limit = limit.unwrap_or(MAX_LIST_LIMIT).min(MAX_LIST_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = self.store.recent(owner, limit).await.map_err(|e| {
            tracing::error!(error = %e, backend = self.backend(), "failed to list calculations");
            HistoryError::from(e)
        })?;
        tracing::debug!(count = rows.len(), limit, "listed calculations");
        Ok(rows)
    }

    /// Appends a new record. Not idempotent: two calls create two records.
    pub async fn save(
        &self,
        caller: &Caller,
        params: CalculationParams,
        final_point: ProjectionPoint,
    ) -> Result<SavedCalculation, HistoryError> {
        let owner = require_owner(caller, "save")?;
        if !final_point.is_finite() {
            return Err(HistoryError::Validation(
                "finalPoint values must be finite".to_string(),
            ));
        }

        let record = NewCalculation {
            owner_key: owner.clone(),
            params,
            final_point,
        };
        let saved = self.store.insert(record).await.map_err(|e| {
            tracing::error!(error = %e, backend = self.backend(), "failed to save calculation");
            HistoryError::from(e)
        })?;

        tracing::info!(
            id = %saved.id,
            kind = saved.kind().as_str(),
            final_balance = saved.final_point.balance,
            "saved calculation"
        );
        Ok(saved)
    }
}

fn require_owner<'a>(caller: &'a Caller, operation: &str) -> Result<&'a OwnerKey, HistoryError> {
    caller.owner().ok_or_else(|| {
        tracing::warn!(operation, "history access without an owner key");
        HistoryError::Unauthorized
    })
}
