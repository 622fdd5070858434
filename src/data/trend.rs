use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::Record;

/// One point of the trend line: mean value of all records on a date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mean: f64,
}

/// Group records by date and average their values, chronologically.
///
/// Missing (NaN) values are skipped; a date whose values are all missing
/// produces no point.
pub fn trend_points<'a, I>(records: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for rec in records {
        if rec.value.is_nan() {
            continue;
        }
        let (sum, count) = groups.entry(rec.date).or_insert((0.0, 0));
        *sum += rec.value;
        *count += 1;
    }
    groups
        .into_iter()
        .map(|(date, (sum, count))| TrendPoint {
            date,
            mean: sum / count as f64,
        })
        .collect()
}
