use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::fob::FobData;
use super::store::DashboardStore;
use crate::records::{AttendanceRecord, RecordKind};

/// Process-local store used when no database is configured, and by tests
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordKind, BTreeMap<String, AttendanceRecord>>>,
    fob: RwLock<BTreeMap<String, FobData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection, replacing records that share an id
    pub async fn insert_all(&self, kind: RecordKind, records: impl IntoIterator<Item = AttendanceRecord>) {
        let mut all = self.records.write().await;
        let collection = all.entry(kind).or_default();
        for record in records {
            collection.insert(record.id.clone(), record);
        }
    }
}

#[async_trait]
impl DashboardStore for MemoryStore {
    async fn fetch_records(&self, kind: RecordKind) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let all = self.records.read().await;
        let mut records: Vec<AttendanceRecord> = all
            .get(&kind)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn upsert_record(&self, kind: RecordKind, record: &AttendanceRecord) -> Result<(), DatabaseError> {
        let mut all = self.records.write().await;
        all.entry(kind).or_default().insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn fetch_fob_data(&self, week: &str) -> Result<Option<FobData>, DatabaseError> {
        Ok(self.fob.read().await.get(week).cloned())
    }

    async fn upsert_fob_data(&self, fob: &FobData) -> Result<(), DatabaseError> {
        self.fob.write().await.insert(fob.week.clone(), fob.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
