use std::path::PathBuf;

use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::filter::{FilterCriteria, init_criteria};
use crate::state::{AppState, DisplayState};
use crate::ui::{map, plot};

// ---------------------------------------------------------------------------
// Left side panel – filter controls
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some(draft) = state.draft.as_mut() else {
        ui.label("The data sources contain no records.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Contaminant ----
            ui.strong("Select Contaminant");
            egui::ComboBox::from_id_salt("contaminant")
                .selected_text(&draft.contaminant)
                .width(ui.available_width() * 0.9)
                .show_ui(ui, |ui: &mut Ui| {
                    for c in &table.contaminants {
                        ui.selectable_value(&mut draft.contaminant, c.clone(), c);
                    }
                });
            ui.add_space(8.0);

            // ---- Date range ----
            ui.strong("Select Date Range");
            if let Some((lo, hi)) = table.date_bounds {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("From");
                    ui.add(DatePickerButton::new(&mut draft.date_min).id_salt("date_min"));
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("To");
                    ui.add(DatePickerButton::new(&mut draft.date_max).id_salt("date_max"));
                });
                clamp_dates(draft, lo, hi);
            }
            ui.add_space(8.0);

            // ---- Value range ----
            ui.strong("Select Value Range");
            if let Some((lo, hi)) = table.value_bounds {
                let min_changed = ui
                    .add(egui::Slider::new(&mut draft.value_min, lo..=hi).text("min"))
                    .changed();
                let max_changed = ui
                    .add(egui::Slider::new(&mut draft.value_max, lo..=hi).text("max"))
                    .changed();
                order_values(draft, min_changed && !max_changed);
            } else {
                ui.weak("No numeric values in the data.");
            }
            ui.add_space(8.0);

            if ui.button("Reset filters").clicked() {
                if let Some(defaults) = init_criteria(&table) {
                    *draft = defaults;
                }
            }

            ui.separator();
            ui.strong("Sources");
            for source in &table.sources {
                ui.label(format!("{}  ({} rows)", source.path.display(), source.rows));
            }
        });

    // Recompute results if any control changed the draft.
    state.apply_draft();
}

/// Keep the picked dates inside the table's range and ordered.
fn clamp_dates(draft: &mut FilterCriteria, lo: NaiveDate, hi: NaiveDate) {
    draft.date_min = draft.date_min.clamp(lo, hi);
    draft.date_max = draft.date_max.clamp(lo, hi);
    if draft.date_min > draft.date_max {
        draft.date_max = draft.date_min;
    }
}

/// Restore `min <= max`, moving whichever bound the user did not touch.
fn order_values(draft: &mut FilterCriteria, min_moved: bool) {
    if draft.value_min > draft.value_max {
        if min_moved {
            draft.value_max = draft.value_min;
        } else {
            draft.value_min = draft.value_max;
        }
    }
}

// ---------------------------------------------------------------------------
// Central panel – summary, map and trend
// ---------------------------------------------------------------------------

/// Render the results area.
pub fn results_panel(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data loaded  (File → Open sources…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Contaminant Search in Water Quality Data");
            if let Some(summary) = state.summary_line() {
                ui.label(summary);
            }
            ui.label(state.count_line());
            ui.add_space(8.0);

            match state.display_state() {
                DisplayState::HasResults => {
                    ui.heading("Map of Stations with Selected Contaminant");
                    map::station_map(ui, state);
                    ui.add_space(12.0);
                    ui.heading("Trend Over Time");
                    plot::trend_plot(ui, state);
                }
                DisplayState::NoResults => {
                    ui.label("No data available for the selected filters");
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open sources…").clicked() {
                open_sources_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload sources").clicked() {
                state.reload();
                ui.close_menu();
            }
            let can_export = state.display_state() == DisplayState::HasResults;
            if ui
                .add_enabled(can_export, egui::Button::new("Export map…"))
                .clicked()
            {
                export_map_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records loaded, {} matching",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_source(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

/// Ask for the station table, then the results table, and load both.
pub fn open_sources_dialog(state: &mut AppState) {
    let Some(primary) = pick_source("Open station data") else {
        return;
    };
    let Some(secondary) = pick_source("Open result data") else {
        return;
    };
    log::info!(
        "Switching sources to {} + {}",
        primary.display(),
        secondary.display()
    );
    state.set_sources(vec![primary, secondary]);
}

pub fn export_map_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export map")
        .set_file_name("stations_map.html")
        .add_filter("HTML", &["html"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_map(&path) {
            log::error!("Failed to export map: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
