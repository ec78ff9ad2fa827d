//! Saved calculation history.
//!
//! [`HistoryService`] enforces owner scoping and list limits on top of a
//! [`HistoryStore`] backend. Two backends ship with the crate:
//!
//! - [`MemoryHistoryStore`] -- process-local, used in tests and when no
//!   database is configured
//! - [`PostgresHistoryStore`] -- append-only `calculations` table

mod error;
mod postgres;
mod service;
mod store;
mod types;

pub use error::{HistoryError, StoreError};
pub use postgres::{PostgresConfig, PostgresHistoryStore};
pub use service::{HistoryService, MAX_LIST_LIMIT};
pub use store::{HistoryStore, MemoryHistoryStore};
pub use types::{
    CalculationId, CalculationKind, CalculationParams, Caller, NewCalculation, OwnerKey,
    SavedCalculation,
};
