use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::manager::DatabaseError;
use super::memory::MemoryStore;
use super::models::fob::FobData;
use super::postgres::PgStore;
use crate::config::DatabaseConfig;
use crate::records::{AttendanceRecord, RecordKind};

/// Persistence seam for survey records and fob data.
///
/// Handlers fetch full, materialized collections and pass them to the
/// aggregator, so implementations never hand out live cursors.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Every record of one kind, oldest first
    async fn fetch_records(&self, kind: RecordKind) -> Result<Vec<AttendanceRecord>, DatabaseError>;

    /// Insert or fully replace the record with the same id
    async fn upsert_record(&self, kind: RecordKind, record: &AttendanceRecord) -> Result<(), DatabaseError>;

    async fn fetch_fob_data(&self, week: &str) -> Result<Option<FobData>, DatabaseError>;

    /// Insert or fully replace the fob data for `fob.week`
    async fn upsert_fob_data(&self, fob: &FobData) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Postgres when `DATABASE_URL` is set, otherwise a process-local store
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn DashboardStore>, DatabaseError> {
    if config.url.is_none() {
        warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    Ok(Arc::new(PgStore::connect(config).await?))
}
