use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{MarkerShape, Plot, PlotPoint, Points, Text};

use crate::color::{MARKER_COLOR, cluster_color};
use crate::data::map::{Cluster, cluster_markers};
use crate::state::AppState;

const MAP_HEIGHT: f32 = 460.0;
const MARKER_RADIUS: f32 = 5.0;
/// Extra pixels around a symbol that still count as hovering it.
const HOVER_SLACK: f32 = 4.0;

// ---------------------------------------------------------------------------
// Station map (central panel)
// ---------------------------------------------------------------------------

fn cluster_radius(size: usize) -> f32 {
    if size <= 1 {
        MARKER_RADIUS
    } else {
        (9.0 + 6.0 * (size as f32).log10()).min(24.0)
    }
}

/// Render the filtered stations on a longitude/latitude plane.
///
/// Markers are clustered on a grid proportional to the visible extent, so
/// zooming in splits clusters apart. Hovering shows the member labels.
pub fn station_map(ui: &mut Ui, state: &AppState) {
    let Some(model) = &state.map else {
        return;
    };

    let ([x0, x1], [y0, y1]) = model.frame();
    let cells = f64::from(state.config.cluster_cells.max(1));

    let response = Plot::new(("station_map", state.results_generation))
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(x0)
        .include_x(x1)
        .include_y(y0)
        .include_y(y1)
        .label_formatter(|_name, value: &PlotPoint| format!("{:.4}°, {:.4}°", value.y, value.x))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let cell = plot_ui.plot_bounds().width() / cells;
            let clusters = cluster_markers(&model.markers, cell);
            let largest = clusters.iter().map(Cluster::len).max().unwrap_or(1);

            for c in &clusters {
                let pos = [c.lon, c.lat];
                if c.is_single() {
                    plot_ui.points(
                        Points::new(vec![pos])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(MARKER_RADIUS)
                            .color(MARKER_COLOR),
                    );
                } else {
                    plot_ui.points(
                        Points::new(vec![pos])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(cluster_radius(c.len()))
                            .color(cluster_color(c.len(), largest)),
                    );
                    plot_ui.text(
                        Text::new(
                            PlotPoint::new(c.lon, c.lat),
                            RichText::new(c.len().to_string()).strong().color(Color32::BLACK),
                        )
                        .anchor(Align2::CENTER_CENTER),
                    );
                }
            }

            // Topmost symbol under the pointer, if any.
            let pointer = plot_ui.pointer_coordinate()?;
            let pointer_px = plot_ui.screen_from_plot(pointer);
            clusters
                .into_iter()
                .rev()
                .find(|c| {
                    let px = plot_ui.screen_from_plot(PlotPoint::new(c.lon, c.lat));
                    px.distance(pointer_px) <= cluster_radius(c.len()) + HOVER_SLACK
                })
        });

    if let Some(cluster) = response.inner {
        let max_rows = state.config.max_tooltip_rows;
        response.response.on_hover_ui_at_pointer(|ui| {
            for (n, &i) in cluster.members.iter().take(max_rows).enumerate() {
                if n > 0 {
                    ui.separator();
                }
                ui.label(&model.markers[i].label);
            }
            if cluster.len() > max_rows {
                ui.separator();
                ui.weak(format!("… and {} more", cluster.len() - max_rows));
            }
        });
    }
}
