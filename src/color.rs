use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Colour of an unclustered station marker.
pub const MARKER_COLOR: Color32 = Color32::from_rgb(49, 135, 206);

/// Colour of the trend line.
pub const TREND_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

// ---------------------------------------------------------------------------
// Cluster colour ramp
// ---------------------------------------------------------------------------

/// Green for small clusters through yellow to red for the largest one.
///
/// Sizes are compared on a log scale so a few huge clusters do not wash out
/// the rest.
pub fn cluster_color(size: usize, largest: usize) -> Color32 {
    let t = if largest <= 1 {
        0.0
    } else {
        ((size.max(1) as f32).ln() / (largest as f32).ln()).clamp(0.0, 1.0)
    };
    let hue = 120.0 * (1.0 - t);
    let hsl = Hsl::new(hue, 0.75, 0.45);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}
