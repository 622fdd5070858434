use std::collections::HashMap;

use serde::Serialize;

use super::model::Record;

/// Viewport width (pixels) the zoom heuristic frames the data for.
const VIEWPORT_PX: f64 = 600.0;
/// Width of one web-map tile at zoom 0.
const TILE_PX: f64 = 256.0;
/// Fraction of the viewport the data should fill.
const FILL: f64 = 0.8;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 15;
/// Zoom used when every marker sits on the same spot.
pub const SINGLE_POINT_ZOOM: u8 = 12;

// ---------------------------------------------------------------------------
// Markers and the map view model
// ---------------------------------------------------------------------------

/// One marker per filtered record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// Everything needed to draw the station map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapModel {
    /// Arithmetic mean latitude of the markers.
    pub center_lat: f64,
    /// Arithmetic mean longitude of the markers.
    pub center_lon: f64,
    /// Web-map style zoom level, `MIN_ZOOM..=MAX_ZOOM`.
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapModel {
    /// Build the view model for a filtered result. `None` when it is empty.
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let markers: Vec<Marker> = records
            .into_iter()
            .map(|rec| Marker {
                lat: rec.latitude,
                lon: rec.longitude,
                label: rec.label(),
            })
            .collect();
        if markers.is_empty() {
            return None;
        }

        let n = markers.len() as f64;
        let center_lat = markers.iter().map(|m| m.lat).sum::<f64>() / n;
        let center_lon = markers.iter().map(|m| m.lon).sum::<f64>() / n;

        let (lat_lo, lat_hi) = span(markers.iter().map(|m| m.lat));
        let (lon_lo, lon_hi) = span(markers.iter().map(|m| m.lon));
        let zoom = zoom_for_span((lat_hi - lat_lo).max(lon_hi - lon_lo));

        Some(MapModel {
            center_lat,
            center_lon,
            zoom,
            markers,
        })
    }

    /// Initial view: `([lon_min, lon_max], [lat_min, lat_max])` centred on
    /// the mean position, sized by the zoom level.
    pub fn frame(&self) -> ([f64; 2], [f64; 2]) {
        let half = visible_degrees(self.zoom) / 2.0;
        (
            [self.center_lon - half, self.center_lon + half],
            [self.center_lat - half, self.center_lat + half],
        )
    }
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Degrees of longitude visible across the viewport at `zoom`.
pub fn visible_degrees(zoom: u8) -> f64 {
    360.0 * VIEWPORT_PX / (TILE_PX * 2f64.powi(i32::from(zoom)))
}

/// Highest zoom at which a `span_deg` wide extent still fits the viewport.
pub fn zoom_for_span(span_deg: f64) -> u8 {
    if !(span_deg > 1e-9) {
        return SINGLE_POINT_ZOOM;
    }
    let fit = (360.0 * VIEWPORT_PX * FILL / (TILE_PX * span_deg)).log2().floor();
    fit.clamp(f64::from(MIN_ZOOM), f64::from(MAX_ZOOM)) as u8
}

// ---------------------------------------------------------------------------
// Grid clustering
// ---------------------------------------------------------------------------

/// A group of markers drawn as one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Centroid of the members.
    pub lat: f64,
    pub lon: f64,
    /// Indices into the marker slice, ascending.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Bucket markers into square grid cells `cell_deg` wide.
///
/// Clusters come out in order of their first member. A non-positive or
/// non-finite cell size disables clustering.
pub fn cluster_markers(markers: &[Marker], cell_deg: f64) -> Vec<Cluster> {
    let clustering = cell_deg.is_finite() && cell_deg > 0.0;
    let mut slots: HashMap<(i64, i64), usize> = HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();

    for (i, m) in markers.iter().enumerate() {
        let slot = if clustering {
            let key = (
                (m.lon / cell_deg).floor() as i64,
                (m.lat / cell_deg).floor() as i64,
            );
            *slots.entry(key).or_insert_with(|| {
                clusters.push(Cluster {
                    lat: 0.0,
                    lon: 0.0,
                    members: Vec::new(),
                });
                clusters.len() - 1
            })
        } else {
            clusters.push(Cluster {
                lat: 0.0,
                lon: 0.0,
                members: Vec::new(),
            });
            clusters.len() - 1
        };
        clusters[slot].members.push(i);
    }

    for c in &mut clusters {
        let n = c.members.len() as f64;
        c.lat = c.members.iter().map(|&i| markers[i].lat).sum::<f64>() / n;
        c.lon = c.members.iter().map(|&i| markers[i].lon).sum::<f64>() / n;
    }
    clusters
}
