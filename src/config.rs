use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File, Source};
use serde::Deserialize;

/// Base name of the optional config file (`dashboard.json`, `dashboard.toml`, ...).
pub const DEFAULT_CONFIG_NAME: &str = "dashboard";

/// Prefix of environment overrides, e.g. `WQ_PRIMARY_SOURCE`.
pub const ENV_PREFIX: &str = "WQ";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Settings for one dashboard session. Every field has a default, so an
/// absent or partial config file is fine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// First table (station data).
    pub primary_source: PathBuf,
    /// Second table (narrow results), appended after the first.
    pub secondary_source: PathBuf,
    /// Grid cells across the visible map width used for marker clustering.
    pub cluster_cells: u32,
    /// Marker labels listed in a hover tooltip before "… and N more".
    pub max_tooltip_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            primary_source: PathBuf::from("station.csv"),
            secondary_source: PathBuf::from("narrowresult.csv"),
            cluster_cells: 24,
            max_tooltip_rows: 12,
        }
    }
}

impl DashboardConfig {
    /// Load from an optional `dashboard.*` file in the working directory,
    /// overridden by `WQ_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_sources(
            File::with_name(DEFAULT_CONFIG_NAME).required(false),
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Layer `env` over `file` and deserialize. Empty variables are ignored.
    pub fn from_sources<F>(file: F, env: Environment) -> Result<Self>
    where
        F: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(env.try_parsing(true).ignore_empty(true))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Source paths in concatenation order.
    pub fn sources(&self) -> Vec<PathBuf> {
        vec![self.primary_source.clone(), self.secondary_source.clone()]
    }
}
