use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Record – one contaminant measurement
// ---------------------------------------------------------------------------

/// A single measurement (one row of either source table).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub station_name: String,
    /// Degrees, WGS84.
    pub latitude: f64,
    /// Degrees, WGS84.
    pub longitude: f64,
    pub contaminant: String,
    /// Measured value. NaN when the source cell was empty.
    pub value: f64,
    pub date: NaiveDate,
}

impl Record {
    /// Multi-line label shown for this record's marker.
    pub fn label(&self) -> String {
        format!(
            "Station: {}\nContaminant: {}\nValue: {}\nDate: {}",
            self.station_name, self.contaminant, self.value, self.date
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.4}, {:.4}) {} = {} on {}",
            self.station_name, self.latitude, self.longitude, self.contaminant, self.value, self.date
        )
    }
}

// ---------------------------------------------------------------------------
// SourceSummary – provenance of a block of rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub path: PathBuf,
    pub rows: usize,
}

// ---------------------------------------------------------------------------
// UnifiedTable – both sources concatenated
// ---------------------------------------------------------------------------

/// The concatenated dataset with pre-computed control bounds.
///
/// Immutable once built; shared behind an `Arc` by the cache.
#[derive(Debug, Clone)]
pub struct UnifiedTable {
    /// All records in append order (first source, then second).
    pub records: Vec<Record>,
    /// Row count per source, in append order.
    pub sources: Vec<SourceSummary>,
    /// Distinct contaminants in order of first appearance.
    pub contaminants: Vec<String>,
    /// Global (min, max) date, `None` for an empty table.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    /// Global (min, max) of the non-missing values.
    pub value_bounds: Option<(f64, f64)>,
}

impl UnifiedTable {
    /// Concatenate per-source record blocks, preserving duplicates.
    pub fn concat(blocks: Vec<(PathBuf, Vec<Record>)>) -> Self {
        let mut sources = Vec::with_capacity(blocks.len());
        let mut records = Vec::new();
        for (path, block) in blocks {
            sources.push(SourceSummary {
                path,
                rows: block.len(),
            });
            records.extend(block);
        }
        let mut table = Self::from_records(records);
        table.sources = sources;
        table
    }

    /// Build bounds and the contaminant list from already-loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut contaminants = Vec::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;
        let mut value_bounds: Option<(f64, f64)> = None;

        for rec in &records {
            if seen.insert(rec.contaminant.as_str()) {
                contaminants.push(rec.contaminant.clone());
            }
            date_bounds = Some(match date_bounds {
                Some((lo, hi)) => (lo.min(rec.date), hi.max(rec.date)),
                None => (rec.date, rec.date),
            });
            if rec.value.is_nan() {
                continue;
            }
            value_bounds = Some(match value_bounds {
                Some((lo, hi)) => (lo.min(rec.value), hi.max(rec.value)),
                None => (rec.value, rec.value),
            });
        }

        UnifiedTable {
            records,
            sources: Vec::new(),
            contaminants,
            date_bounds,
            value_bounds,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
