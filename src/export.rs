use std::path::Path;

use anyhow::{Context, Result};

use crate::data::map::MapModel;

/// Standalone Leaflet page; `__TITLE__` and `__MAP_MODEL__` are substituted.
const MAP_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css" />
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <script src="https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js"></script>
  <style>
    html, body { height: 100%; margin: 0; }
    #map { position: absolute; inset: 0; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const model = __MAP_MODEL__;
    const map = L.map('map').setView([model.center_lat, model.center_lon], model.zoom);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 19,
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);

    const cluster = L.markerClusterGroup();
    for (const m of model.markers) {
      const popup = document.createElement('div');
      popup.style.whiteSpace = 'pre-line';
      popup.textContent = m.label;
      cluster.addLayer(L.marker([m.lat, m.lon]).bindPopup(popup));
    }
    map.addLayer(cluster);
  </script>
</body>
</html>
"#;

/// Render the map as a self-contained HTML page with clustered markers.
pub fn render_map_html(model: &MapModel, title: &str) -> Result<String> {
    let json = serde_json::to_string(model)
        .context("serializing map markers")?
        .replace("</", "<\\/");
    Ok(MAP_HTML
        .replace("__TITLE__", &escape_html(title))
        .replace("__MAP_MODEL__", &json))
}

/// Write [`render_map_html`] output to `path`.
pub fn write_map_html(path: &Path, model: &MapModel, title: &str) -> Result<()> {
    let html = render_map_html(model, title)?;
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Exported map with {} markers to {}",
        model.markers.len(),
        path.display()
    );
    Ok(())
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
