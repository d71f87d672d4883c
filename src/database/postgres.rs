use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use std::collections::BTreeMap;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::fob::FobData;
use super::models::record::RecordRow;
use super::store::DashboardStore;
use crate::config::DatabaseConfig;
use crate::records::{AttendanceRecord, RecordKind};

#[derive(Debug, FromRow)]
struct FobRow {
    week: String,
    data: Json<BTreeMap<String, String>>,
}

/// Postgres-backed store; one table per record kind plus `fob_data`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::connect(config).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DashboardStore for PgStore {
    async fn fetch_records(&self, kind: RecordKind) -> Result<Vec<AttendanceRecord>, DatabaseError> {
        let query = format!(
            "SELECT id, first_name, last_name, recorded_at, areas, comments FROM {} ORDER BY recorded_at, id",
            kind.table_name()
        );

        let rows = sqlx::query_as::<_, RecordRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn upsert_record(&self, kind: RecordKind, record: &AttendanceRecord) -> Result<(), DatabaseError> {
        let query = format!(
            r#"
            INSERT INTO {} (id, first_name, last_name, recorded_at, areas, comments)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                recorded_at = EXCLUDED.recorded_at,
                areas = EXCLUDED.areas,
                comments = EXCLUDED.comments,
                updated_at = now()
            "#,
            kind.table_name()
        );

        sqlx::query(&query)
            .bind(&record.id)
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(record.recorded_at)
            .bind(&record.areas)
            .bind(&record.comments)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_fob_data(&self, week: &str) -> Result<Option<FobData>, DatabaseError> {
        let row = sqlx::query_as::<_, FobRow>("SELECT week, data FROM fob_data WHERE week = $1")
            .bind(week)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| FobData {
            week: row.week,
            data: row.data.0,
        }))
    }

    async fn upsert_fob_data(&self, fob: &FobData) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO fob_data (week, data)
            VALUES ($1, $2)
            ON CONFLICT (week) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = now()
            "#,
        )
        .bind(&fob.week)
        .bind(Json(&fob.data))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
