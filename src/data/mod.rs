/// Data layer: core types, loading, caching, filtering and aggregation.
///
/// Architecture:
/// ```text
///  station.csv   narrowresult.csv   (.csv / .json / .parquet)
///        │              │
///        ▼              ▼
///   ┌──────────────────────┐
///   │        loader        │  parse + concatenate → UnifiedTable
///   └──────────────────────┘
///              │
///              ▼
///   ┌──────────────────────┐
///   │        cache         │  session-owned Arc<UnifiedTable>
///   └──────────────────────┘
///              │
///              ▼
///   ┌──────────────────────┐
///   │        filter        │  contaminant ∧ date range ∧ value range
///   └──────────────────────┘
///         │           │
///         ▼           ▼
///   ┌──────────┐ ┌──────────┐
///   │   map    │ │  trend   │  markers + clusters / mean per date
///   └──────────┘ └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod map;
pub mod model;
pub mod trend;
