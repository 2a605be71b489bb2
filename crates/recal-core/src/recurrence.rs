//! Pure recurrence calculations: cadence stepping, series boundaries and the
//! virtual fill used by month expansion. Nothing in this module touches
//! storage.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::models::{Cadence, Occurrence, RecurrenceTemplate};

/// Upper bound on cursor advances per template during one expansion. An
/// unbounded series matched against December would otherwise never leave the
/// fill loop, since every wrapped-around month still compares <= 12.
const MAX_CURSOR_STEPS: usize = 1000;

impl Cadence {
    /// The date one cadence step after `date`, or None when the step is not
    /// representable. Month and year steps clamp to the last day of the
    /// target month (Jan 31 + one month is Feb 29 in a leap year).
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::Daily => date.checked_add_signed(Duration::days(1)),
            Cadence::Weekly => date.checked_add_signed(Duration::weeks(1)),
            Cadence::Monthly => date.checked_add_months(Months::new(1)),
            Cadence::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

/// Computes the next occurrence date of `template` strictly after `after`.
///
/// Returns None for single-shot templates, and once the computed date would
/// pass the series boundary.
pub fn next_occurrence_after(template: &RecurrenceTemplate, after: NaiveDate) -> Option<NaiveDate> {
    if !template.is_recurring {
        return None;
    }
    let next = template.cadence.advance(after)?;
    match template.end_of_recurring {
        Some(end) if next > end => None,
        _ => Some(next),
    }
}

/// Last calendar day of `month` in `year`; None for an out-of-range month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))
        .and_then(|first_of_next| first_of_next.pred_opt())
}

/// Walks a series forward from its most recent materialized date and collects
/// virtual occurrences whose month of year equals `month`.
///
/// Dates in earlier months are stepped through without being collected, so a
/// series whose last materialized entry lies months behind still reaches the
/// target month within one call. The walk ends at the first date past the
/// target month, at the series boundary, or at the step cap. The month
/// comparison is year-agnostic, matching the candidate filter used by the
/// storage layer.
pub fn virtual_occurrences_in_month(
    template: &RecurrenceTemplate,
    last_materialized: NaiveDate,
    month: u32,
) -> Vec<Occurrence> {
    let mut found = Vec::new();
    let mut cursor = next_occurrence_after(template, last_materialized);
    let mut steps = 0;

    while let Some(date) = cursor {
        if date.month() > month || steps >= MAX_CURSOR_STEPS {
            break;
        }
        if date.month() == month {
            found.push(Occurrence::virtual_for(template, date));
        }
        cursor = next_occurrence_after(template, date);
        steps += 1;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::Map;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recurring_template(
        start: NaiveDate,
        cadence: Cadence,
        end: Option<NaiveDate>,
    ) -> RecurrenceTemplate {
        RecurrenceTemplate {
            id: Uuid::now_v7(),
            start_date: start,
            is_recurring: true,
            cadence,
            end_of_recurring: end,
            parent_id: None,
            payload: Map::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(Cadence::Daily, date(2024, 3, 14), date(2024, 3, 15))]
    #[case(Cadence::Weekly, date(2024, 2, 26), date(2024, 3, 4))]
    #[case(Cadence::Monthly, date(2024, 1, 15), date(2024, 2, 15))]
    #[case(Cadence::Monthly, date(2024, 12, 15), date(2025, 1, 15))]
    #[case(Cadence::Yearly, date(2024, 6, 1), date(2025, 6, 1))]
    fn advance_steps_one_cadence(
        #[case] cadence: Cadence,
        #[case] from: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(cadence.advance(from), Some(expected));
    }

    #[test]
    fn monthly_advance_clamps_to_month_end() {
        assert_eq!(
            Cadence::Monthly.advance(date(2024, 1, 31)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            Cadence::Monthly.advance(date(2023, 1, 31)),
            Some(date(2023, 2, 28))
        );
    }

    #[test]
    fn cursor_is_none_for_single_shot_template() {
        let mut template = recurring_template(date(2024, 5, 1), Cadence::Monthly, None);
        template.is_recurring = false;

        assert_eq!(next_occurrence_after(&template, date(2024, 5, 1)), None);
    }

    #[test]
    fn cursor_stops_at_series_boundary() {
        let template = recurring_template(
            date(2024, 1, 15),
            Cadence::Monthly,
            Some(date(2024, 3, 15)),
        );

        assert_eq!(
            next_occurrence_after(&template, date(2024, 2, 15)),
            Some(date(2024, 3, 15))
        );
        assert_eq!(next_occurrence_after(&template, date(2024, 3, 15)), None);
    }

    #[test]
    fn cursor_treats_boundary_as_inclusive() {
        let template = recurring_template(
            date(2024, 1, 1),
            Cadence::Weekly,
            Some(date(2024, 1, 8)),
        );

        assert_eq!(
            next_occurrence_after(&template, date(2024, 1, 1)),
            Some(date(2024, 1, 8))
        );
        assert_eq!(next_occurrence_after(&template, date(2024, 1, 8)), None);
    }

    #[rstest]
    #[case(2024, 2, date(2024, 2, 29))]
    #[case(2023, 2, date(2023, 2, 28))]
    #[case(2024, 12, date(2024, 12, 31))]
    #[case(2024, 4, date(2024, 4, 30))]
    fn last_day_of_month_handles_lengths(
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(last_day_of_month(year, month), Some(expected));
    }

    #[test]
    fn last_day_of_month_rejects_invalid_month() {
        assert_eq!(last_day_of_month(2024, 0), None);
        assert_eq!(last_day_of_month(2024, 13), None);
    }

    #[test]
    fn fill_walks_through_non_matching_months() {
        // Monthly series with one materialized entry on Jan 15: asking for
        // March steps through February silently and yields March 15 only.
        let template = recurring_template(date(2024, 1, 15), Cadence::Monthly, None);

        let found = virtual_occurrences_in_month(&template, date(2024, 1, 15), 3);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_date, date(2024, 3, 15));
        assert!(!found[0].is_materialized());
    }

    #[test]
    fn fill_collects_every_matching_date_in_month() {
        let template = recurring_template(date(2024, 1, 1), Cadence::Weekly, None);

        let found = virtual_occurrences_in_month(&template, date(2024, 1, 29), 2);
        let dates: Vec<NaiveDate> = found.iter().map(|o| o.start_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 2, 5),
                date(2024, 2, 12),
                date(2024, 2, 19),
                date(2024, 2, 26),
            ]
        );
    }

    #[test]
    fn fill_stops_at_series_boundary() {
        let template = recurring_template(
            date(2024, 1, 15),
            Cadence::Monthly,
            Some(date(2024, 2, 15)),
        );

        let found = virtual_occurrences_in_month(&template, date(2024, 1, 15), 3);
        assert!(found.is_empty());
    }

    #[test]
    fn fill_is_bounded_for_unbounded_december_series() {
        // Every wrapped-around month compares <= 12, so only the step cap
        // ends this walk. It must terminate and return the first cap-worth
        // of Decembers.
        let template = recurring_template(date(2024, 12, 1), Cadence::Monthly, None);

        let found = virtual_occurrences_in_month(&template, date(2024, 12, 1), 12);
        assert!(!found.is_empty());
        assert!(found.len() <= MAX_CURSOR_STEPS);
        assert!(found.iter().all(|o| o.start_date.month() == 12));
    }
}
