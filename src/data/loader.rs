use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataSourceError;
use super::model::{Record, UnifiedTable};

type Result<T> = std::result::Result<T, DataSourceError>;

/// Columns every source must provide, in the order rows are parsed.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "station_name",
    "latitude",
    "longitude",
    "contaminant",
    "value",
    "date",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every source in order and concatenate them into one table.
pub fn load_sources(paths: &[PathBuf]) -> Result<UnifiedTable> {
    let mut blocks = Vec::with_capacity(paths.len());
    for path in paths {
        let records = load_file(path)?;
        log::info!("Loaded {} records from {}", records.len(), path.display());
        blocks.push((path.clone(), records));
    }
    let table = UnifiedTable::concat(blocks);
    log::info!(
        "Unified table: {} records, {} contaminants",
        table.len(),
        table.contaminants.len()
    );
    Ok(table)
}

/// Load measurement records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; extra columns are ignored
/// * `.json`    – `[{ "station_name": ..., "latitude": ..., ... }, ...]`
/// * `.parquet` – one column per field; dates as text, Date32/64 or Timestamp
pub fn load_file(path: &Path) -> Result<Vec<Record>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        _ => Err(DataSourceError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext,
        }),
    }
}

/// Parse a date cell, discarding any time of day.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

// ---------------------------------------------------------------------------
// Row parsing shared by all formats
// ---------------------------------------------------------------------------

/// Turn the six required cells (in [`REQUIRED_COLUMNS`] order) into a record.
/// `row` is 1-based, counting data rows only.
fn parse_row(path: &Path, row: usize, cells: [&str; 6]) -> Result<Record> {
    let [station, lat, lon, contaminant, value, date] = cells;

    let date = parse_date(date).ok_or_else(|| DataSourceError::InvalidDate {
        path: path.to_path_buf(),
        row,
        value: date.to_string(),
    })?;

    let value = if value.trim().is_empty() {
        f64::NAN
    } else {
        parse_number(path, row, "value", value)?
    };

    Ok(Record {
        station_name: station.to_string(),
        latitude: parse_number(path, row, "latitude", lat)?,
        longitude: parse_number(path, row, "longitude", lon)?,
        contaminant: contaminant.to_string(),
        value,
        date,
    })
}

fn parse_number(path: &Path, row: usize, column: &'static str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() || (column == "value" && v.is_nan()))
        .ok_or_else(|| DataSourceError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column,
            value: raw.to_string(),
        })
}

/// Find each required column among `names`.
fn locate_columns<S: AsRef<str>>(path: &Path, names: &[S]) -> Result<[usize; 6]> {
    let mut idx = [0usize; 6];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = names
            .iter()
            .position(|n| n.as_ref().trim() == column)
            .ok_or_else(|| DataSourceError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })?;
    }
    Ok(idx)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let csv_err = |source| DataSourceError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_reader(open(path)?);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let idx = locate_columns(path, &headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.map_err(csv_err)?;
        let cells = idx.map(|i| row.get(i).unwrap_or(""));
        records.push(parse_row(path, row_no + 1, cells)?);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "station_name": "Mill Creek",
///     "latitude": 40.1,
///     "longitude": -88.2,
///     "contaminant": "Lead",
///     "value": 4.2,
///     "date": "2020-01-01"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let json_err = |source| DataSourceError::Json {
        path: path.to_path_buf(),
        source,
    };

    let text = std::fs::read_to_string(path).map_err(|source| DataSourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(json_err)?;

    let rows = root.as_array().ok_or_else(|| {
        json_err(<serde_json::Error as serde::de::Error>::custom(
            "expected top-level JSON array",
        ))
    })?;

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| {
            json_err(<serde_json::Error as serde::de::Error>::custom(format!(
                "row {} is not a JSON object",
                i + 1
            )))
        })?;

        let mut texts: [String; 6] = Default::default();
        for (text, column) in texts.iter_mut().zip(REQUIRED_COLUMNS) {
            let cell = obj.get(column).ok_or_else(|| DataSourceError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })?;
            *text = json_cell_text(cell);
        }
        let cells = [
            texts[0].as_str(),
            texts[1].as_str(),
            texts[2].as_str(),
            texts[3].as_str(),
            texts[4].as_str(),
            texts[5].as_str(),
        ];
        records.push(parse_row(path, i + 1, cells)?);
    }
    Ok(records)
}

fn json_cell_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per required field.
///
/// Cells are rendered through Arrow's display formatting and then parsed like
/// CSV text, so any string, integer, float, date or timestamp column type
/// works. Files written by both **Pandas** and **Polars** load unchanged.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let pq_err = |e: &dyn std::fmt::Display| DataSourceError::Parquet {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?).map_err(|e| pq_err(&e))?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let idx = locate_columns(path, &names)?;
    let reader = builder.build().map_err(|e| pq_err(&e))?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| pq_err(&e))?;
        let columns = idx.map(|i| batch.column(i).clone());

        for row in 0..batch.num_rows() {
            let mut texts: [String; 6] = Default::default();
            for (text, col) in texts.iter_mut().zip(&columns) {
                if !col.is_null(row) {
                    *text = array_value_to_string(col.as_ref(), row).map_err(|e| pq_err(&e))?;
                }
            }
            let cells = [
                texts[0].as_str(),
                texts[1].as_str(),
                texts[2].as_str(),
                texts[3].as_str(),
                texts[4].as_str(),
                texts[5].as_str(),
            ];
            records.push(parse_row(path, records.len() + 1, cells)?);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;
    use crate::data::model::tests::date;

    fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn csv_ignores_extra_columns_and_drops_time_of_day() {
        let dir = TempDir::new().unwrap();
        let path = fixture(
            &dir,
            "extra.csv",
            "id,date,station_name,latitude,longitude,contaminant,value\n\
             1,2020-01-01 13:45:00,A,40.0,-74.0,Lead,5\n\
             2,01/02/2020,B,41.0,-73.0,Lead,15.5\n",
        );
        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].station_name, "A");
        assert_eq!(records[0].date, date(2020, 1, 1));
        assert_eq!(records[1].date, date(2020, 1, 2));
        assert_eq!(records[1].value, 15.5);
    }

    #[test]
    fn csv_missing_column_is_reported_by_name() {
        let dir = TempDir::new().unwrap();
        let path = fixture(
            &dir,
            "nocol.csv",
            "station_name,latitude,longitude,value,date\nA,1,2,3,2020-01-01\n",
        );
        match load_file(&path) {
            Err(DataSourceError::MissingColumn { column, .. }) => assert_eq!(column, "contaminant"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_number_and_bad_date_fail() {
        let dir = TempDir::new().unwrap();
        let path = fixture(
            &dir,
            "badnum.csv",
            "station_name,latitude,longitude,contaminant,value,date\nA,north,2,Lead,3,2020-01-01\n",
        );
        assert!(matches!(
            load_file(&path),
            Err(DataSourceError::InvalidValue { column: "latitude", row: 1, .. })
        ));

        let path = fixture(
            &dir,
            "baddate.csv",
            "station_name,latitude,longitude,contaminant,value,date\nA,1,2,Lead,3,someday\n",
        );
        assert!(matches!(load_file(&path), Err(DataSourceError::InvalidDate { row: 1, .. })));

        let path = fixture(
            &dir,
            "nanlon.csv",
            "station_name,latitude,longitude,contaminant,value,date\nA,1,NaN,Lead,3,2020-01-01\n",
        );
        assert!(matches!(
            load_file(&path),
            Err(DataSourceError::InvalidValue { column: "longitude", .. })
        ));
    }

    #[test]
    fn csv_empty_value_is_missing() {
        let dir = TempDir::new().unwrap();
        let path = fixture(
            &dir,
            "empty.csv",
            "station_name,latitude,longitude,contaminant,value,date\nA,1,2,Lead,,2020-01-01\n",
        );
        let records = load_file(&path).unwrap();
        assert!(records[0].value.is_nan());
    }

    #[test]
    fn infinite_value_is_rejected_but_nan_is_missing() {
        let dir = TempDir::new().unwrap();
        for (name, raw) in [("inf.csv", "inf"), ("neginf.csv", "-inf"), ("bigexp.csv", "1e400")] {
            let path = fixture(
                &dir,
                name,
                &format!(
                    "station_name,latitude,longitude,contaminant,value,date\n\
                     A,1,2,Lead,{raw},2020-01-01\nB,1,2,Lead,3,2020-01-01\n"
                ),
            );
            assert!(
                matches!(
                    load_file(&path),
                    Err(DataSourceError::InvalidValue { column: "value", row: 1, .. })
                ),
                "{raw}"
            );
        }

        let path = fixture(
            &dir,
            "nan.csv",
            "station_name,latitude,longitude,contaminant,value,date\n\
             A,1,2,Lead,NaN,2020-01-01\nB,1,2,Lead,3,2020-01-01\n",
        );
        let table = UnifiedTable::from_records(load_file(&path).unwrap());
        assert!(table.records[0].value.is_nan());
        assert_eq!(table.value_bounds, Some((3.0, 3.0)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.csv");
        assert!(matches!(load_file(&path), Err(DataSourceError::Io { .. })));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "table.xlsx", "");
        assert!(matches!(
            load_file(&path),
            Err(DataSourceError::UnsupportedFormat { extension, .. }) if extension == "xlsx"
        ));
    }

    #[test]
    fn json_records_load() {
        let dir = TempDir::new().unwrap();
        let path = fixture(
            &dir,
            "rows.json",
            r#"[{"station_name":"A","latitude":40.0,"longitude":-74.0,
                 "contaminant":"Lead","value":5,"date":"2020-01-01T08:00:00"},
                {"station_name":"B","latitude":"41.0","longitude":-73.0,
                 "contaminant":"Lead","value":null,"date":"2020-01-02"}]"#,
        );
        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date(2020, 1, 1));
        assert_eq!(records[1].latitude, 41.0);
        assert!(records[1].value.is_nan());
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "object.json", r#"{"station_name":"A"}"#);
        assert!(matches!(load_file(&path), Err(DataSourceError::Json { .. })));
    }

    #[test]
    fn parquet_with_typed_columns_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("station_name", DataType::Utf8, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("contaminant", DataType::Utf8, false),
            Field::new("value", DataType::Int64, true),
            Field::new("date", DataType::Date32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(Float64Array::from(vec![40.0, 41.0])),
                Arc::new(Float64Array::from(vec![-74.0, -73.0])),
                Arc::new(StringArray::from(vec!["Lead", "Lead"])),
                Arc::new(Int64Array::from(vec![Some(5), None])),
                // Days since 1970-01-01.
                Arc::new(Date32Array::from(vec![18262, 18263])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, 5.0);
        assert!(records[1].value.is_nan());
        assert_eq!(records[1].date, date(2020, 1, 2));
    }

    #[test]
    fn sources_concatenate_in_order() {
        let dir = TempDir::new().unwrap();
        let header = "station_name,latitude,longitude,contaminant,value,date\n";
        let first = fixture(
            &dir,
            "first.csv",
            &format!("{header}A,40.0,-74.0,Lead,5,2020-01-01\nB,41.0,-73.0,Lead,15,2020-01-02\n"),
        );
        let second = fixture(&dir, "second.csv", &format!("{header}C,40.5,-73.5,Arsenic,3,2020-01-01\n"));

        let table = load_sources(&[first, second]).unwrap();
        let stations: Vec<&str> = table.records.iter().map(|r| r.station_name.as_str()).collect();
        assert_eq!(stations, vec!["A", "B", "C"]);
        assert_eq!(table.contaminants, vec!["Lead", "Arsenic"]);
        assert_eq!(table.sources.len(), 2);
    }

    #[test]
    fn one_bad_source_fails_the_whole_load() {
        let dir = TempDir::new().unwrap();
        let good = fixture(
            &dir,
            "good.csv",
            "station_name,latitude,longitude,contaminant,value,date\nA,1,2,Lead,3,2020-01-01\n",
        );
        let missing = dir.path().join("missing-second.csv");
        assert!(load_sources(&[good, missing]).is_err());
    }

    #[test]
    fn date_spellings() {
        let d = date(2021, 7, 4);
        for raw in [
            "2021-07-04",
            " 2021/07/04 ",
            "07/04/2021",
            "2021-07-04 23:59:59",
            "2021-07-04 06:30",
            "2021-07-04T12:00:00.250",
            "2021-07-04T12:00:00+02:00",
        ] {
            assert_eq!(parse_date(raw), Some(d), "{raw}");
        }
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-13-01"), None);
    }
}
