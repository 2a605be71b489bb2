use crate::edit;
use crate::error::CoreError;
use crate::models::{EditAttributes, NewEventData, Occurrence, RecurrenceTemplate};
use crate::recurrence;
use crate::repository::occurrences::OccurrenceRow;
use crate::repository::{OccurrenceRepository, SqliteRepository, TemplateRepository};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use uuid::Uuid;

#[async_trait]
impl super::EventRepository for SqliteRepository {
    async fn create_event(&self, data: NewEventData) -> Result<Occurrence, CoreError> {
        if let Some(end) = data.end_of_recurring {
            if end < data.start_date {
                return Err(CoreError::InvalidInput(
                    "end_of_recurring must not precede start_date".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let template = RecurrenceTemplate {
            id: Uuid::now_v7(),
            start_date: data.start_date,
            is_recurring: data.is_recurring,
            cadence: data.cadence,
            end_of_recurring: data.end_of_recurring,
            parent_id: None,
            payload: data.payload,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool().begin().await?;
        Self::insert_template_in_tx(&mut tx, &template).await?;
        let occurrence = Self::insert_occurrence_in_tx(
            &mut tx,
            template.id,
            template.start_date,
            &template.payload,
        )
        .await?;
        tx.commit().await?;

        Ok(occurrence)
    }

    async fn edit_occurrence(
        &self,
        id: Uuid,
        attrs: EditAttributes,
    ) -> Result<Option<Occurrence>, CoreError> {
        let mut tx = self.pool().begin().await?;

        let row: OccurrenceRow = sqlx::query_as("SELECT * FROM occurrences WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Occurrence with id {} not found", id)))?;

        if row.deleted_at.is_some() {
            return Err(CoreError::StaleOccurrence(id));
        }
        let occurrence = Occurrence::from(row);

        let template: RecurrenceTemplate =
            sqlx::query_as("SELECT * FROM recurrence_templates WHERE id = $1")
                .bind(occurrence.template_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    CoreError::NotFound(format!(
                        "Template with id {} not found",
                        occurrence.template_id
                    ))
                })?;

        if !edit::data_is_different(&occurrence, &template, &attrs) {
            return Ok(None);
        }

        let seed = edit::merge_for_branch(&template, &occurrence, &attrs);
        let now = Utc::now();
        let branch = RecurrenceTemplate {
            id: Uuid::now_v7(),
            start_date: seed.start_date,
            is_recurring: seed.is_recurring,
            cadence: seed.cadence,
            end_of_recurring: seed.end_of_recurring,
            parent_id: Some(template.id),
            payload: seed.payload.clone(),
            created_at: now,
            updated_at: now,
        };

        Self::insert_template_in_tx(&mut tx, &branch).await?;
        let branched =
            Self::insert_occurrence_in_tx(&mut tx, branch.id, branch.start_date, &branch.payload)
                .await?;

        if edit::caps_old_series(&template, &seed) {
            // The parent series now ends at the superseded date; the edited
            // instance and everything after it lives on the branch.
            Self::update_end_of_recurring_in_tx(&mut tx, template.id, Some(occurrence.start_date))
                .await?;
        } else {
            Self::update_end_of_recurring_in_tx(&mut tx, branch.id, None).await?;
        }

        Self::soft_retire_in_tx(&mut tx, id, now).await?;
        tx.commit().await?;

        Ok(Some(branched))
    }

    async fn expand_month(&self, month: u32) -> Result<Vec<Occurrence>, CoreError> {
        self.expand_month_in_year(month, Utc::now().year()).await
    }

    async fn expand_month_in_year(
        &self,
        month: u32,
        anchor_year: i32,
    ) -> Result<Vec<Occurrence>, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidMonth(month));
        }

        let templates = self.find_templates_in_month(month, anchor_year).await?;
        let mut occurrences = Vec::new();

        for template in templates {
            occurrences.extend(self.find_materialized_in_month(template.id, month).await?);

            // Virtual fill starts from the newest persisted occurrence; a
            // template with no materialized history produces none.
            if let Some(latest) = self.find_latest_materialized(template.id).await? {
                occurrences.extend(recurrence::virtual_occurrences_in_month(
                    &template,
                    latest.start_date,
                    month,
                ));
            }
        }

        Ok(occurrences)
    }
}
