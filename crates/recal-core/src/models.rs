use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Fixed recurrence step of a series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cadence::Daily => write!(f, "daily"),
            Cadence::Weekly => write!(f, "weekly"),
            Cadence::Monthly => write!(f, "monthly"),
            Cadence::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid cadence: {0}")]
pub struct ParseCadenceError(String);

impl FromStr for Cadence {
    type Err = ParseCadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "monthly" => Ok(Cadence::Monthly),
            "yearly" => Ok(Cadence::Yearly),
            _ => Err(ParseCadenceError(s.to_string())),
        }
    }
}

/// Describes one recurrence series: first date, cadence, lifetime boundary,
/// lineage parent and the payload every occurrence starts from.
///
/// Templates are never deleted. Apart from `end_of_recurring`, which the edit
/// protocol caps when a series is split, a persisted template is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurrenceTemplate {
    /// Primary key, UUIDv7 for time-ordered performance
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    /// Date of the first occurrence in the series
    pub start_date: NaiveDate,
    /// False means single-shot: exactly one occurrence, no cursor advancement
    pub is_recurring: bool,
    pub cadence: Cadence,
    /// Inclusive last date of the series; None means unbounded
    pub end_of_recurring: Option<NaiveDate>,
    /// Template this one was split from, if any (non-owning lineage pointer)
    pub parent_id: Option<Uuid>,
    /// Arbitrary non-date domain fields shared by the series
    #[sqlx(json)]
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One concrete calendar entry belonging to a template.
///
/// Materialized occurrences are persisted rows; virtual ones are projections
/// computed during month expansion and are never stored. The distinction is
/// carried in [`OccurrenceKind`] so persistence code cannot be handed a
/// virtual instance by accident.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub template_id: Uuid,
    pub start_date: NaiveDate,
    /// Domain fields; equal to the template's payload unless the occurrence
    /// was created from an edit that overrode them
    pub payload: Map<String, Value>,
    pub kind: OccurrenceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OccurrenceKind {
    Materialized {
        id: Uuid,
        /// Soft-retirement marker set when the occurrence is superseded
        deleted_at: Option<DateTime<Utc>>,
    },
    Virtual,
}

impl Occurrence {
    /// Projects the next conforming entry of a series without persisting it.
    pub fn virtual_for(template: &RecurrenceTemplate, start_date: NaiveDate) -> Self {
        Self {
            template_id: template.id,
            start_date,
            payload: template.payload.clone(),
            kind: OccurrenceKind::Virtual,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.kind, OccurrenceKind::Materialized { .. })
    }

    /// Row id for materialized occurrences, None for virtual ones.
    pub fn materialized_id(&self) -> Option<Uuid> {
        match self.kind {
            OccurrenceKind::Materialized { id, .. } => Some(id),
            OccurrenceKind::Virtual => None,
        }
    }

    pub fn is_retired(&self) -> bool {
        matches!(
            self.kind,
            OccurrenceKind::Materialized {
                deleted_at: Some(_),
                ..
            }
        )
    }
}

/// Data required to create a new event series (template plus its first
/// materialized occurrence).
#[derive(Debug, Clone)]
pub struct NewEventData {
    pub start_date: NaiveDate,
    pub is_recurring: bool,
    pub cadence: Cadence,
    pub end_of_recurring: Option<NaiveDate>,
    pub payload: Map<String, Value>,
}

/// Sparse attribute set for editing one occurrence; absent fields mean
/// "unchanged".
#[derive(Debug, Clone, Default)]
pub struct EditAttributes {
    pub start_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub cadence: Option<Cadence>,
    /// Payload keys to override; compared against the owning template
    pub payload: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_title(title: &str) -> RecurrenceTemplate {
        let mut payload = Map::new();
        payload.insert("title".to_string(), Value::from(title));
        RecurrenceTemplate {
            id: Uuid::now_v7(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            is_recurring: true,
            cadence: Cadence::Monthly,
            end_of_recurring: None,
            parent_id: None,
            payload,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cadence_parses_from_str() {
        assert_eq!("daily".parse::<Cadence>().unwrap(), Cadence::Daily);
        assert_eq!("Weekly".parse::<Cadence>().unwrap(), Cadence::Weekly);
        assert_eq!("MONTHLY".parse::<Cadence>().unwrap(), Cadence::Monthly);
        assert_eq!("yearly".parse::<Cadence>().unwrap(), Cadence::Yearly);
        assert!("fortnightly".parse::<Cadence>().is_err());
    }

    #[test]
    fn cadence_display_round_trips() {
        for cadence in [
            Cadence::Daily,
            Cadence::Weekly,
            Cadence::Monthly,
            Cadence::Yearly,
        ] {
            assert_eq!(cadence.to_string().parse::<Cadence>().unwrap(), cadence);
        }
    }

    #[test]
    fn virtual_occurrence_borrows_template_payload() {
        let template = template_with_title("Standup");
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();

        let occurrence = Occurrence::virtual_for(&template, date);
        assert_eq!(occurrence.template_id, template.id);
        assert_eq!(occurrence.start_date, date);
        assert_eq!(occurrence.payload, template.payload);
        assert!(!occurrence.is_materialized());
        assert_eq!(occurrence.materialized_id(), None);
        assert!(!occurrence.is_retired());
    }

    #[test]
    fn materialized_occurrence_exposes_row_id() {
        let template = template_with_title("Standup");
        let id = Uuid::now_v7();
        let occurrence = Occurrence {
            template_id: template.id,
            start_date: template.start_date,
            payload: template.payload.clone(),
            kind: OccurrenceKind::Materialized {
                id,
                deleted_at: None,
            },
        };

        assert!(occurrence.is_materialized());
        assert_eq!(occurrence.materialized_id(), Some(id));
        assert!(!occurrence.is_retired());
    }
}
