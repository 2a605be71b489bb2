//! Divergence detection and attribute merging for the copy-on-write edit of
//! a single occurrence. The transactional orchestration lives in the
//! repository; everything here is pure.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::models::{Cadence, EditAttributes, Occurrence, RecurrenceTemplate};

/// Everything needed to seed the branch template and its first occurrence.
///
/// Field precedence: proposed attributes win over the occurrence's current
/// state, which wins over the old template's defaults.
#[derive(Debug, Clone)]
pub struct BranchSeed {
    pub start_date: NaiveDate,
    pub is_recurring: bool,
    pub cadence: Cadence,
    /// Inherited from the old template; the boundary rule may clear it
    pub end_of_recurring: Option<NaiveDate>,
    pub payload: Map<String, Value>,
}

/// Returns true when `attrs` diverges from the occurrence's effective state.
///
/// The proposed start date compares against the occurrence itself; every
/// other field compares against the owning template, because an occurrence
/// without an explicit override reads through to its template.
pub fn data_is_different(
    occurrence: &Occurrence,
    template: &RecurrenceTemplate,
    attrs: &EditAttributes,
) -> bool {
    if attrs.start_date.is_some_and(|d| d != occurrence.start_date) {
        return true;
    }
    if attrs.is_recurring.is_some_and(|r| r != template.is_recurring) {
        return true;
    }
    if attrs.cadence.is_some_and(|c| c != template.cadence) {
        return true;
    }
    attrs
        .payload
        .iter()
        .any(|(key, value)| template.payload.get(key) != Some(value))
}

/// Merges the old template, the occurrence's current start date and the
/// proposed attributes into the seed for the branch series.
pub fn merge_for_branch(
    template: &RecurrenceTemplate,
    occurrence: &Occurrence,
    attrs: &EditAttributes,
) -> BranchSeed {
    let mut payload = template.payload.clone();
    for (key, value) in &attrs.payload {
        payload.insert(key.clone(), value.clone());
    }

    BranchSeed {
        start_date: attrs.start_date.unwrap_or(occurrence.start_date),
        is_recurring: attrs.is_recurring.unwrap_or(template.is_recurring),
        cadence: attrs.cadence.unwrap_or(template.cadence),
        end_of_recurring: template.end_of_recurring,
        payload,
    }
}

/// Boundary adjustment after a split: when both sides keep recurring the old
/// series is capped at the superseded date. Any mixed pairing instead leaves
/// the branch unbounded.
pub fn caps_old_series(old: &RecurrenceTemplate, seed: &BranchSeed) -> bool {
    old.is_recurring && seed.is_recurring
}
