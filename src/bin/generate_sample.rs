//! Writes deterministic demo data: `station.csv`, `narrowresult.csv` and
//! `narrowresult.parquet` in the current directory.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Days, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Row {
    station_name: String,
    latitude: f64,
    longitude: f64,
    contaminant: &'static str,
    value: f64,
    date: NaiveDate,
}

/// SplitMix64: enough randomness for demo data, reproducible by seed.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let r = (-2.0 * self.unit().max(1e-15).ln()).sqrt();
        let theta = std::f64::consts::TAU * self.unit();
        mean + std_dev * r * theta.cos()
    }
}

/// (name, latitude, longitude) along the Illinois River.
const STATIONS: [(&str, f64, f64); 8] = [
    ("Illinois River at Valley City", 39.7031, -90.6454),
    ("Illinois River at Meredosia", 39.8306, -90.5601),
    ("Illinois River at Havana", 40.2983, -90.0690),
    ("Illinois River at Kingston Mines", 40.5565, -89.7776),
    ("Illinois River at Peoria", 40.6936, -89.5890),
    ("Illinois River at Henry", 41.1075, -89.3562),
    ("Illinois River at La Salle", 41.3270, -89.0934),
    ("Illinois River at Morris", 41.3573, -88.4212),
];

/// (contaminant, typical value, spread)
const CONTAMINANTS: [(&str, f64, f64); 5] = [
    ("Lead", 4.0, 1.5),
    ("Arsenic", 2.5, 0.8),
    ("Nitrate", 6.0, 2.5),
    ("Atrazine", 1.2, 0.6),
    ("Mercury", 0.08, 0.03),
];

fn generate(rng: &mut SampleRng, first: NaiveDate, days: u64, count: usize) -> Vec<Row> {
    (0..count)
        .map(|_| {
            let (name, lat, lon) = STATIONS[rng.below(STATIONS.len())];
            let (contaminant, typical, spread) = CONTAMINANTS[rng.below(CONTAMINANTS.len())];
            let date = first + Days::new(rng.below(days as usize) as u64);
            // Seasonal bump in spring runoff.
            let season = if (3..=6).contains(&date.month()) { 1.3 } else { 1.0 };
            let value = rng.normal(typical * season, spread).max(0.0);
            Row {
                station_name: name.to_string(),
                latitude: lat,
                longitude: lon,
                contaminant,
                value: (value * 1000.0).round() / 1000.0,
                date,
            }
        })
        .collect()
}

fn write_csv(path: &str, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).with_context(|| format!("writing {path}"))?;
    }
    writer.flush().with_context(|| format!("flushing {path}"))?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[Row]) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("epoch date")?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("station_name", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new("contaminant", DataType::Utf8, false),
        Field::new("value", DataType::Float64, true),
        Field::new("date", DataType::Date32, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.station_name.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.latitude).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.longitude).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.contaminant).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.value).collect::<Vec<_>>())),
            Arc::new(Date32Array::from(
                rows.iter()
                    .map(|r| (r.date - epoch).num_days() as i32)
                    .collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SampleRng(42);
    let first = NaiveDate::from_ymd_opt(2020, 1, 1).context("start date")?;

    let stations = generate(&mut rng, first, 365, 400);
    let results = generate(&mut rng, first + Days::new(365), 365, 600);

    write_csv("station.csv", &stations)?;
    write_csv("narrowresult.csv", &results)?;
    write_parquet("narrowresult.parquet", &results)?;

    println!(
        "Wrote {} rows to station.csv and {} rows to narrowresult.csv / narrowresult.parquet",
        stations.len(),
        results.len()
    );
    Ok(())
}
