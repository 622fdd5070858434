use chrono::NaiveDate;

use super::error::FilterError;
use super::model::{Record, UnifiedTable};

// ---------------------------------------------------------------------------
// Filter criteria: one contaminant, inclusive date and value ranges
// ---------------------------------------------------------------------------

/// The user's current selection. All four predicates are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub contaminant: String,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub value_min: f64,
    pub value_max: f64,
}

impl FilterCriteria {
    /// Reject criteria no control could have produced.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.date_min > self.date_max {
            return Err(FilterError::InvertedDateRange {
                min: self.date_min,
                max: self.date_max,
            });
        }
        if self.value_min.is_nan() || self.value_max.is_nan() {
            return Err(FilterError::NanBound);
        }
        if self.value_min > self.value_max {
            return Err(FilterError::InvertedValueRange {
                min: self.value_min,
                max: self.value_max,
            });
        }
        Ok(())
    }

    /// Whether a record passes every predicate.
    ///
    /// Dates are already day-granular on both sides. A missing (NaN) value
    /// never falls inside a range.
    pub fn matches(&self, record: &Record) -> bool {
        record.contaminant == self.contaminant
            && (self.date_min..=self.date_max).contains(&record.date)
            && (self.value_min..=self.value_max).contains(&record.value)
    }
}

/// Criteria that select everything for the first contaminant: full date and
/// value ranges of the table. `None` for an empty table.
///
/// A table with a single distinct value yields a degenerate `[v, v]` range.
pub fn init_criteria(table: &UnifiedTable) -> Option<FilterCriteria> {
    let contaminant = table.contaminants.first()?.clone();
    let (date_min, date_max) = table.date_bounds?;
    let (value_min, value_max) = table.value_bounds.unwrap_or((0.0, 0.0));
    Some(FilterCriteria {
        contaminant,
        date_min,
        date_max,
        value_min,
        value_max,
    })
}

// ---------------------------------------------------------------------------
// Stable filtering
// ---------------------------------------------------------------------------

/// Return indices of records that pass the criteria, in table order.
///
/// An empty result is valid; only inconsistent criteria are an error.
pub fn filtered_indices(records: &[Record], criteria: &FilterCriteria) -> Result<Vec<usize>, FilterError> {
    criteria.validate()?;
    Ok(records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect())
}

/// Same as [`filtered_indices`] but yields the records themselves.
pub fn filter_records<'a>(
    records: &'a [Record],
    criteria: &FilterCriteria,
) -> Result<Vec<&'a Record>, FilterError> {
    Ok(filtered_indices(records, criteria)?
        .into_iter()
        .map(|i| &records[i])
        .collect())
}
