use chrono::{Datelike, NaiveDate};
use eframe::egui::{RichText, Ui};
use egui_plot::{GridMark, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::TREND_COLOR;
use crate::state::AppState;

const TREND_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Trend plot (mean value per date)
// ---------------------------------------------------------------------------

/// Plot x coordinate of a date.
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Date at a plot x coordinate, rounded to the nearest day.
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() || x.abs() > f64::from(i32::MAX) {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Render the trend line for the current results.
pub fn trend_plot(ui: &mut Ui, state: &AppState) {
    let Some(criteria) = &state.criteria else {
        return;
    };
    let contaminant = criteria.contaminant.as_str();

    ui.label(RichText::new(format!("Trend of {contaminant} Over Time")).strong());

    let points: Vec<[f64; 2]> = state
        .trend
        .iter()
        .map(|p| [date_to_x(p.date), p.mean])
        .collect();

    // Id includes the generation so every new result is re-framed.
    Plot::new(("trend_plot", state.results_generation))
        .height(TREND_HEIGHT)
        .legend(egui_plot::Legend::default())
        .x_axis_label("Date")
        .y_axis_label(format!("{contaminant} Concentration"))
        .x_axis_formatter(|mark: GridMark, _range| {
            x_to_date(mark.value)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .label_formatter(|_name, value: &PlotPoint| match x_to_date(value.x) {
            Some(d) => format!("{d}\n{:.4}", value.y),
            None => String::new(),
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let name = format!("{contaminant} Trend");
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name(&name)
                    .color(TREND_COLOR)
                    .width(1.5),
            );
            // A single date has no segment to draw; show the vertex.
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(TREND_COLOR)
                    .radius(2.5),
            );
        });
}
