use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{EditAttributes, NewEventData, Occurrence, RecurrenceTemplate};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

// Re-export domain modules
pub mod events;
pub mod occurrences;
pub mod templates;

// Traits are defined in this module and implemented in respective domain modules

/// Domain-specific trait for recurrence template storage
#[async_trait]
pub trait TemplateRepository {
    async fn insert_template(
        &self,
        template: RecurrenceTemplate,
    ) -> Result<RecurrenceTemplate, CoreError>;
    async fn find_template_by_id(&self, id: Uuid) -> Result<Option<RecurrenceTemplate>, CoreError>;
    /// Templates whose series can intersect the given month of year. The
    /// anchor year only grounds the start-date check for unbounded series;
    /// the month checks themselves are year-agnostic.
    async fn find_templates_in_month(
        &self,
        month: u32,
        anchor_year: i32,
    ) -> Result<Vec<RecurrenceTemplate>, CoreError>;
    /// The only mutation templates admit after insert.
    async fn update_end_of_recurring(
        &self,
        id: Uuid,
        end_of_recurring: Option<NaiveDate>,
    ) -> Result<(), CoreError>;
}

/// Domain-specific trait for occurrence storage. Only materialized
/// occurrences pass through here; virtual ones exist solely in expansion
/// output.
#[async_trait]
pub trait OccurrenceRepository {
    async fn insert_occurrence(
        &self,
        template_id: Uuid,
        start_date: NaiveDate,
        payload: Map<String, Value>,
    ) -> Result<Occurrence, CoreError>;
    async fn find_occurrence_by_id(&self, id: Uuid) -> Result<Option<Occurrence>, CoreError>;
    /// Non-retired materialized occurrences of a template whose start date
    /// falls in the given month of year (any year).
    async fn find_materialized_in_month(
        &self,
        template_id: Uuid,
        month: u32,
    ) -> Result<Vec<Occurrence>, CoreError>;
    async fn find_latest_materialized(
        &self,
        template_id: Uuid,
    ) -> Result<Option<Occurrence>, CoreError>;
    async fn soft_retire_occurrence(
        &self,
        id: Uuid,
        retired_at: DateTime<Utc>,
    ) -> Result<(), CoreError>;
}

/// The calendar operations built on top of the storage traits: series
/// creation, copy-on-write edits and month expansion.
#[async_trait]
pub trait EventRepository {
    async fn create_event(&self, data: NewEventData) -> Result<Occurrence, CoreError>;
    /// Splits the series when the attributes diverge from the occurrence's
    /// effective values; Ok(None) means nothing needed to change.
    async fn edit_occurrence(
        &self,
        id: Uuid,
        attrs: EditAttributes,
    ) -> Result<Option<Occurrence>, CoreError>;
    /// Month view anchored at the current year.
    async fn expand_month(&self, month: u32) -> Result<Vec<Occurrence>, CoreError>;
    async fn expand_month_in_year(
        &self,
        month: u32,
        anchor_year: i32,
    ) -> Result<Vec<Occurrence>, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository: TemplateRepository + OccurrenceRepository + EventRepository {
    // This trait automatically composes all domain-specific repositories
    // Individual domain operations are defined in their respective traits
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

// The main Repository trait implementation will automatically be available
// when all domain trait implementations are defined
impl Repository for SqliteRepository {}
