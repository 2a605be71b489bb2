use crate::error::CoreError;
use crate::models::RecurrenceTemplate;
use crate::recurrence;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

impl SqliteRepository {
    pub(crate) async fn insert_template_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        template: &RecurrenceTemplate,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO recurrence_templates (id, start_date, is_recurring, cadence, end_of_recurring, parent_id, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(template.id)
        .bind(template.start_date)
        .bind(template.is_recurring)
        .bind(&template.cadence)
        .bind(template.end_of_recurring)
        .bind(template.parent_id)
        .bind(Json(&template.payload))
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub(crate) async fn update_end_of_recurring_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        id: Uuid,
        end_of_recurring: Option<NaiveDate>,
    ) -> Result<(), CoreError> {
        let result = sqlx::query(
            "UPDATE recurrence_templates SET end_of_recurring = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(end_of_recurring)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Template with id {} not found",
                id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl super::TemplateRepository for SqliteRepository {
    async fn insert_template(
        &self,
        template: RecurrenceTemplate,
    ) -> Result<RecurrenceTemplate, CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::insert_template_in_tx(&mut tx, &template).await?;
        tx.commit().await?;
        Ok(template)
    }

    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<RecurrenceTemplate>, CoreError> {
        let template = sqlx::query_as("SELECT * FROM recurrence_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(template)
    }

    async fn find_templates_in_month(
        &self,
        month: u32,
        anchor_year: i32,
    ) -> Result<Vec<RecurrenceTemplate>, CoreError> {
        let boundary = recurrence::last_day_of_month(anchor_year, month)
            .ok_or(CoreError::InvalidMonth(month))?;

        // Three-way candidate filter: single-shot events in the month,
        // unbounded series started by the boundary, and bounded series whose
        // end month has not passed the target month. Month-of-year checks
        // are year-agnostic.
        let templates = sqlx::query_as(
            r#"SELECT * FROM recurrence_templates
            WHERE (is_recurring = FALSE AND CAST(strftime('%m', start_date) AS INTEGER) = $1)
               OR (is_recurring = TRUE AND end_of_recurring IS NULL AND start_date <= $2)
               OR (is_recurring = TRUE AND end_of_recurring IS NOT NULL AND start_date <= $2
                   AND CAST(strftime('%m', end_of_recurring) AS INTEGER) <= $1)
            ORDER BY start_date"#,
        )
        .bind(month)
        .bind(boundary)
        .fetch_all(self.pool())
        .await?;
        Ok(templates)
    }

    async fn update_end_of_recurring(
        &self,
        id: Uuid,
        end_of_recurring: Option<NaiveDate>,
    ) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::update_end_of_recurring_in_tx(&mut tx, id, end_of_recurring).await?;
        tx.commit().await?;
        Ok(())
    }
}
