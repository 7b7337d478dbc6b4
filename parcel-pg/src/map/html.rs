//! Rendu HTML (Leaflet + VectorGrid) d'une carte

use super::MapView;

const LEAFLET_VERSION: &str = "1.9.4";
const VECTORGRID_VERSION: &str = "1.3.0";

/// Fond NAIP (masqué par défaut)
const NAIP_TILES: &str =
    "https://gis.apfo.usda.gov/arcgis/rest/services/NAIP/USDA_CONUS_PRIME/ImageServer/tile/{z}/{y}/{x}";

/// Échappe un texte pour un contenu ou un attribut HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Littéral de chaîne JavaScript sûr dans un bloc `<script>`
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace("</", "<\\/")
}

pub fn render_map(view: &MapView) -> String {
    let [xmin, ymin, xmax, ymax] = view.bounds;

    let mut overlays = String::new();
    for (year, url) in &view.landcover_tiles {
        overlays.push_str(&format!(
            "      \"{year} land cover\": L.tileLayer({url}, {{maxZoom: 19, opacity: 0.7}}),\n",
            year = year,
            url = js_string(url),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
  <script src="https://unpkg.com/leaflet.vectorgrid@{vectorgrid}/dist/Leaflet.VectorGrid.bundled.js"></script>
  <style>
    html, body {{ height: 100%; margin: 0; }}
    #map {{ height: 100%; }}
    .map-title {{ background: white; padding: 4px 8px; font: 14px sans-serif; }}
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const map = L.map("map");
    map.fitBounds([[{ymin}, {xmin}], [{ymax}, {xmax}]]);

    const basemap = L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
      maxZoom: 19,
      attribution: "&copy; OpenStreetMap contributors"
    }}).addTo(map);
    const naip = L.tileLayer({naip}, {{maxZoom: 19, attribution: "USDA NAIP"}});

    const overlays = {{
{overlays}    }};

    const parcels = L.vectorGrid.protobuf({parcels}, {{
      vectorTileLayerStyles: {{
        default: {{color: "orange", weight: 2, fill: false}}
      }},
      maxZoom: 22
    }}).addTo(map);
    overlays["parcels"] = parcels;

    L.control.layers({{"OpenStreetMap": basemap, "NAIP": naip}}, overlays, {{collapsed: false}}).addTo(map);

    const title = L.control({{position: "topright"}});
    title.onAdd = function () {{
      const div = L.DomUtil.create("div", "map-title");
      div.innerHTML = {title_js};
      return div;
    }};
    title.addTo(map);
  </script>
</body>
</html>
"#,
        title = escape_html(&view.title),
        title_js = js_string(&escape_html(&view.title)),
        leaflet = LEAFLET_VERSION,
        vectorgrid = VECTORGRID_VERSION,
        xmin = xmin,
        ymin = ymin,
        xmax = xmax,
        ymax = ymax,
        naip = js_string(NAIP_TILES),
        overlays = overlays,
        parcels = js_string(&view.parcel_tiles),
    )
}
