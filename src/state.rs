use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::DatasetCache;
use crate::data::error::FilterError;
use crate::data::filter::{FilterCriteria, filtered_indices, init_criteria};
use crate::data::map::MapModel;
use crate::data::model::{Record, UnifiedTable};
use crate::data::trend::{TrendPoint, trend_points};

// ---------------------------------------------------------------------------
// Display state
// ---------------------------------------------------------------------------

/// What the results area shows for the applied criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// Map and trend are drawn.
    HasResults,
    /// Only a "no data" notice is drawn.
    NoResults,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Session cache of the unified table.
    pub cache: DatasetCache,

    /// Table the current results were computed from (None until loaded).
    pub dataset: Option<Arc<UnifiedTable>>,

    /// Criteria the current results were computed with.
    pub criteria: Option<FilterCriteria>,

    /// Criteria being edited by the controls; applied on change.
    pub draft: Option<FilterCriteria>,

    /// Indices of records passing the applied criteria.
    pub visible_indices: Vec<usize>,

    /// Mean value per date of the visible records.
    pub trend: Vec<TrendPoint>,

    /// Map view model of the visible records.
    pub map: Option<MapModel>,

    /// Bumped on every recomputation so views can reset their framing.
    pub results_generation: u64,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = DatasetCache::new(config.sources());
        Self {
            config,
            cache,
            dataset: None,
            criteria: None,
            draft: None,
            visible_indices: Vec::new(),
            trend: Vec::new(),
            map: None,
            results_generation: 0,
            status_message: None,
        }
    }

    /// Load (or fetch from cache) the unified table and show its defaults.
    pub fn load(&mut self) {
        let result = self.cache.get_or_load();
        self.finish_load(result);
    }

    /// Re-read the current sources from disk.
    pub fn reload(&mut self) {
        let result = self.cache.reload();
        self.finish_load(result);
    }

    /// Switch to different source files and load them.
    pub fn set_sources(&mut self, sources: Vec<PathBuf>) {
        self.cache.set_sources(sources);
        self.load();
    }

    fn finish_load(
        &mut self,
        result: Result<Arc<UnifiedTable>, crate::data::error::DataSourceError>,
    ) {
        match result {
            Ok(table) => {
                log::debug!(
                    "Dataset ready from {:?} ({} disk reads this session)",
                    self.cache.sources(),
                    self.cache.load_count()
                );
                self.set_dataset(table);
            }
            Err(e) => {
                log::error!("Failed to load data sources: {e:#}");
                self.status_message = Some(format!("Load failed: {e}"));
                self.dataset = None;
                self.criteria = None;
                self.draft = None;
                self.clear_results();
            }
        }
    }

    /// Ingest a newly loaded table and apply the all-inclusive defaults.
    pub fn set_dataset(&mut self, table: Arc<UnifiedTable>) {
        let defaults = init_criteria(&table);
        self.dataset = Some(table);
        self.status_message = None;
        self.criteria = None;
        self.draft = defaults.clone();
        match defaults {
            Some(criteria) => {
                // Defaults come from the table's own bounds and cannot be inverted.
                let _ = self.apply_criteria(criteria);
            }
            None => {
                self.status_message = Some("The data sources contain no records".to_string());
                self.clear_results();
            }
        }
    }

    /// Handle a criteria change: filter, then rebuild trend and map.
    ///
    /// Inconsistent criteria are rejected and the previous results stay.
    pub fn apply_criteria(&mut self, criteria: FilterCriteria) -> Result<(), FilterError> {
        let Some(table) = self.dataset.clone() else {
            return Ok(());
        };

        let indices = match filtered_indices(&table.records, &criteria) {
            Ok(indices) => indices,
            Err(e) => {
                log::warn!("Rejected filter criteria {criteria:?}: {e}");
                self.status_message = Some(format!("Invalid filter: {e}"));
                return Err(e);
            }
        };

        let visible: Vec<&Record> = indices.iter().map(|&i| &table.records[i]).collect();
        self.trend = trend_points(visible.iter().copied());
        self.map = MapModel::from_records(visible.iter().copied());
        log::debug!("{criteria:?} matched {} records", indices.len());

        self.visible_indices = indices;
        self.draft = Some(criteria.clone());
        self.criteria = Some(criteria);
        self.status_message = None;
        self.results_generation += 1;
        Ok(())
    }

    /// Apply the draft if the controls changed it.
    pub fn apply_draft(&mut self) {
        if self.draft.is_none() || self.draft == self.criteria {
            return;
        }
        if let Some(draft) = self.draft.clone() {
            let _ = self.apply_criteria(draft);
        }
    }

    fn clear_results(&mut self) {
        self.visible_indices.clear();
        self.trend.clear();
        self.map = None;
        self.results_generation += 1;
    }

    pub fn display_state(&self) -> DisplayState {
        if self.visible_indices.is_empty() {
            DisplayState::NoResults
        } else {
            DisplayState::HasResults
        }
    }

    /// The filtered result, in table order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match &self.dataset {
            Some(table) => self.visible_indices.iter().map(|&i| &table.records[i]).collect(),
            None => Vec::new(),
        }
    }

    /// "Showing data for X between D1 and D2"
    pub fn summary_line(&self) -> Option<String> {
        self.criteria.as_ref().map(|c| {
            format!(
                "Showing data for {} between {} and {}",
                c.contaminant, c.date_min, c.date_max
            )
        })
    }

    pub fn count_line(&self) -> String {
        format!("Filtered data count: {}", self.visible_indices.len())
    }

    /// Write the current map as a standalone HTML page.
    pub fn export_map(&self, path: &Path) -> anyhow::Result<()> {
        let (Some(map), Some(criteria)) = (&self.map, &self.criteria) else {
            anyhow::bail!("there are no results to export");
        };
        let title = format!("{} sampling stations", criteria.contaminant);
        crate::export::write_map_html(path, map, &title)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::data::filter::filtered_indices;
    use crate::data::loader::load_file;
    use crate::data::model::tests::date;

    const HEADER: &str = "station_name,latitude,longitude,contaminant,value,date\n";

    fn state(dir: &TempDir) -> AppState {
        let primary = dir.path().join("station.csv");
        let secondary = dir.path().join("narrowresult.csv");
        std::fs::write(
            &primary,
            format!("{HEADER}A,40.0,-74.0,Lead,5,2020-01-01\nB,41.0,-73.0,Lead,15,2020-01-02\n"),
        )
        .unwrap();
        std::fs::write(&secondary, format!("{HEADER}C,40.5,-73.5,Arsenic,3,2020-01-01\n")).unwrap();

        let config = DashboardConfig {
            primary_source: primary,
            secondary_source: secondary,
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load();
        state
    }

    fn lead(value_min: f64, value_max: f64) -> FilterCriteria {
        FilterCriteria {
            contaminant: "Lead".to_string(),
            date_min: date(2020, 1, 1),
            date_max: date(2020, 1, 2),
            value_min,
            value_max,
        }
    }

    #[test]
    fn load_applies_all_inclusive_defaults() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir);
        let criteria = state.criteria.clone().unwrap();
        assert_eq!(criteria, lead(3.0, 15.0));
        assert_eq!(state.display_state(), DisplayState::HasResults);
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(
            state.summary_line().unwrap(),
            "Showing data for Lead between 2020-01-01 and 2020-01-02"
        );
        assert_eq!(state.count_line(), "Filtered data count: 2");
    }

    #[test]
    fn criteria_changes_switch_between_states() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);

        state.apply_criteria(lead(1000.0, 2000.0)).unwrap();
        assert_eq!(state.display_state(), DisplayState::NoResults);
        assert!(state.trend.is_empty());
        assert!(state.map.is_none());

        state.apply_criteria(lead(0.0, 100.0)).unwrap();
        assert_eq!(state.display_state(), DisplayState::HasResults);
        assert_eq!(
            state.trend,
            vec![
                TrendPoint { date: date(2020, 1, 1), mean: 5.0 },
                TrendPoint { date: date(2020, 1, 2), mean: 15.0 },
            ]
        );
        let map = state.map.as_ref().unwrap();
        assert_eq!((map.center_lat, map.center_lon), (40.5, -73.5));
        let stations: Vec<&str> = state
            .visible_records()
            .iter()
            .map(|r| r.station_name.as_str())
            .collect();
        assert_eq!(stations, vec!["A", "B"]);
    }

    #[test]
    fn inverted_criteria_keep_previous_results() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let before = state.visible_indices.clone();
        let generation = state.results_generation;

        assert!(state.apply_criteria(lead(50.0, 10.0)).is_err());
        assert_eq!(state.visible_indices, before);
        assert_eq!(state.results_generation, generation);
        assert!(state.status_message.is_some());
    }

    #[test]
    fn draft_is_applied_only_when_changed() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let generation = state.results_generation;
        state.apply_draft();
        assert_eq!(state.results_generation, generation);

        if let Some(draft) = state.draft.as_mut() {
            draft.contaminant = "Arsenic".to_string();
        }
        state.apply_draft();
        assert_eq!(state.results_generation, generation + 1);
        assert_eq!(state.visible_indices, vec![2]);
    }

    #[test]
    fn load_failure_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.set_sources(vec![PathBuf::from("/nonexistent/station.csv")]);
        assert!(state.dataset.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Load failed"));
        assert_eq!(state.display_state(), DisplayState::NoResults);
    }

    #[test]
    fn export_needs_results() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.apply_criteria(lead(1000.0, 2000.0)).unwrap();
        let path = dir.path().join("none.html");
        assert!(state.export_map(&path).is_err());
    }

    #[test]
    fn timestamped_rows_match_their_calendar_day() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("station.csv");
        let secondary = dir.path().join("narrowresult.csv");
        std::fs::write(
            &primary,
            format!(
                "{HEADER}A,40.0,-74.0,Lead,7,2020-01-02 23:59:59\n\
                 B,41.0,-73.0,Lead,8,2020-01-03T00:00:01\n"
            ),
        )
        .unwrap();
        std::fs::write(&secondary, format!("{HEADER}C,40.5,-73.5,Lead,5,2020-01-01 00:00:00\n"))
            .unwrap();

        // Loader and filter on their own.
        let records = load_file(&primary).unwrap();
        assert_eq!(filtered_indices(&records, &lead(0.0, 100.0)).unwrap(), vec![0]);

        // Through the session state.
        let mut state = AppState::new(DashboardConfig {
            primary_source: primary,
            secondary_source: secondary,
            ..DashboardConfig::default()
        });
        state.load();
        state.apply_criteria(lead(0.0, 100.0)).unwrap();
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert_eq!(
            state.trend,
            vec![
                TrendPoint { date: date(2020, 1, 1), mean: 5.0 },
                TrendPoint { date: date(2020, 1, 2), mean: 7.0 },
            ]
        );
    }
}
