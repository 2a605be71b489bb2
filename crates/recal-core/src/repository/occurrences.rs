use crate::error::CoreError;
use crate::models::{Occurrence, OccurrenceKind};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

/// Persisted shape of an occurrence. Only materialized occurrences have
/// rows, so the conversion into [`Occurrence`] always yields the
/// materialized variant.
#[derive(Debug, FromRow)]
pub(crate) struct OccurrenceRow {
    pub id: Uuid,
    pub template_id: Uuid,
    pub start_date: NaiveDate,
    pub payload: Json<Map<String, Value>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<OccurrenceRow> for Occurrence {
    fn from(row: OccurrenceRow) -> Self {
        Occurrence {
            template_id: row.template_id,
            start_date: row.start_date,
            payload: row.payload.0,
            kind: OccurrenceKind::Materialized {
                id: row.id,
                deleted_at: row.deleted_at,
            },
        }
    }
}

impl SqliteRepository {
    pub(crate) async fn insert_occurrence_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        template_id: Uuid,
        start_date: NaiveDate,
        payload: &Map<String, Value>,
    ) -> Result<Occurrence, CoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            r#"INSERT INTO occurrences (id, template_id, start_date, payload, deleted_at, created_at)
            VALUES ($1, $2, $3, $4, NULL, $5)"#,
        )
        .bind(id)
        .bind(template_id)
        .bind(start_date)
        .bind(Json(payload))
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(Occurrence {
            template_id,
            start_date,
            payload: payload.clone(),
            kind: OccurrenceKind::Materialized {
                id,
                deleted_at: None,
            },
        })
    }

    pub(crate) async fn soft_retire_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        retired_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let result =
            sqlx::query("UPDATE occurrences SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(retired_at)
                .bind(id)
                .execute(&mut **tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Occurrence with id {} not found",
                id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl super::OccurrenceRepository for SqliteRepository {
    async fn insert_occurrence(
        &self,
        template_id: Uuid,
        start_date: NaiveDate,
        payload: Map<String, Value>,
    ) -> Result<Occurrence, CoreError> {
        let mut tx = self.pool().begin().await?;
        let occurrence =
            Self::insert_occurrence_in_tx(&mut tx, template_id, start_date, &payload).await?;
        tx.commit().await?;
        Ok(occurrence)
    }

    async fn find_occurrence_by_id(&self, id: Uuid) -> Result<Option<Occurrence>, CoreError> {
        let row: Option<OccurrenceRow> = sqlx::query_as("SELECT * FROM occurrences WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Occurrence::from))
    }

    async fn find_materialized_in_month(
        &self,
        template_id: Uuid,
        month: u32,
    ) -> Result<Vec<Occurrence>, CoreError> {
        let rows: Vec<OccurrenceRow> = sqlx::query_as(
            r#"SELECT * FROM occurrences
            WHERE template_id = $1 AND deleted_at IS NULL
              AND CAST(strftime('%m', start_date) AS INTEGER) = $2
            ORDER BY start_date"#,
        )
        .bind(template_id)
        .bind(month)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Occurrence::from).collect())
    }

    async fn find_latest_materialized(
        &self,
        template_id: Uuid,
    ) -> Result<Option<Occurrence>, CoreError> {
        let row: Option<OccurrenceRow> = sqlx::query_as(
            r#"SELECT * FROM occurrences
            WHERE template_id = $1 AND deleted_at IS NULL
            ORDER BY start_date DESC LIMIT 1"#,
        )
        .bind(template_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(Occurrence::from))
    }

    async fn soft_retire_occurrence(
        &self,
        id: Uuid,
        retired_at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::soft_retire_in_tx(&mut tx, id, retired_at).await?;
        tx.commit().await?;
        Ok(())
    }
}
