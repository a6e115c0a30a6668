//! Static Leaflet map page.

use anyhow::Result;
use htmlize::escape_text;
use serde::Serialize;
use std::fmt::Write;
use survey::{geo::geometry::Coord, Survey};

const LEAFLET_VERSION: &str = "1.9.4";

/// Returns the initial zoom for a survey: closer in when elevations
/// are shown.
pub fn default_zoom(survey: &Survey) -> u8 {
    if survey.elevation_enabled {
        18
    } else {
        17
    }
}

/// Everything the page script draws, in Leaflet's lat/lon order.
#[derive(Serialize)]
struct MapData {
    center: [f64; 2],
    zoom: u8,
    centerline: Vec<[f64; 2]>,
    edges: [Vec<[f64; 2]>; 2],
    contours: Vec<ContourData>,
    markers: Vec<Marker>,
}

#[derive(Serialize)]
struct ContourData {
    tooltip: String,
    points: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct Marker {
    number: usize,
    position: [f64; 2],
    tooltip: String,
}

fn lat_lon(coord: Coord<f64>) -> [f64; 2] {
    [coord.y, coord.x]
}

fn map_data(survey: &Survey, zoom: u8) -> MapData {
    let (left, right) = survey.edges();
    MapData {
        center: lat_lon(survey.center),
        zoom,
        centerline: survey.centerline().coords().copied().map(lat_lon).collect(),
        edges: [
            left.coords().copied().map(lat_lon).collect(),
            right.coords().copied().map(lat_lon).collect(),
        ],
        contours: survey
            .contours
            .iter()
            .map(|contour| ContourData {
                tooltip: format!("Contour ~{} m", contour.elevation),
                points: contour.line.coords().copied().map(lat_lon).collect(),
            })
            .collect(),
        markers: survey
            .stations
            .iter()
            .map(|station| Marker {
                number: station.number,
                position: lat_lon(station.geographic),
                tooltip: station.tooltip(survey.elevation_enabled),
            })
            .collect(),
    }
}

fn sidebar(survey: &Survey) -> Result<String, std::fmt::Error> {
    let mut html = String::new();
    for station in &survey.stations {
        let labels = &station.labels;
        let (lat, lon, e, n) = (
            escape_text(labels.latitude.as_str()),
            escape_text(labels.longitude.as_str()),
            escape_text(labels.easting.as_str()),
            escape_text(labels.northing.as_str()),
        );
        let elev = if survey.elevation_enabled {
            format!("<br>Elevation: {}", escape_text(labels.elevation.as_str()))
        } else {
            String::new()
        };
        write!(
            html,
            r#"
      <div>
        <b>Point {number}</b><br>
        <span class="coord-dms">{lat}<br>{lon}{elev}</span>
        <span class="coord-utm" style="display:none;">E: {e}<br>N: {n}{elev}</span>
        <span class="coord-ne" style="display:none;">N: {n}<br>E: {e}{elev}</span>
      </div>
      <hr style="margin:4px 0;">"#,
            number = station.number,
        )?;
    }
    Ok(html)
}

/// Renders `survey` as a self contained HTML page.
pub fn render(survey: &Survey, zoom: u8) -> Result<String> {
    // Keep the payload from closing its own script element.
    let data = serde_json::to_string(&map_data(survey, zoom))?.replace("</", "<\\/");
    let sidebar = sidebar(survey)?;
    let sidebar_width = if survey.elevation_enabled { 200 } else { 160 };
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Road centerline</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
  <script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
  <style>
    html, body, #map {{ height: 100%; margin: 0; }}
    .station-icon {{
      font-size: 10pt; background: white; border: 1px solid black;
      border-radius: 50%; width: 24px; height: 24px; text-align: center;
      line-height: 24px; font-weight: bold;
    }}
    #toggle-button {{
      margin-top: 10px; background-color: #444; color: white; border: none;
      padding: 8px 14px; font-size: 13px; border-radius: 5px; cursor: pointer;
      box-shadow: 1px 1px 4px rgba(0,0,0,0.4);
    }}
    #print-button {{
      background-color: darkgreen; color: white; border: none;
      padding: 10px 16px; font-size: 13px; border-radius: 5px; cursor: pointer;
      box-shadow: 1px 1px 4px rgba(0,0,0,0.4);
    }}
    @media print {{ #button-container, #toggle-button {{ display: none; }} }}
  </style>
</head>
<body>
  <div id="map"></div>
  <div id="sidebar" style="position: fixed; top: 20px; left: 70px; width: {sidebar_width}px; background: white;
      padding: 10px; border: 1px solid black; border-radius: 5px; font-family: Arial;
      font-size: 12px; z-index: 9999; max-height: 90vh; overflow-y: auto;">
    <label><b>Coordinate View</b></label>
    <select onchange="toggleFormat(this.value)" style="margin-bottom: 10px; width: 100%;">
      <option value="dms">DMS</option>
      <option value="utm">UTM (E/N)</option>
      <option value="ne">N/E</option>
    </select>
    <div id="coord-list">{sidebar}
    </div>
  </div>
  <div id="button-container" style="position: fixed; top: 10px; right: 10px; z-index: 9999;">
    <button id="print-button" onclick="printMap()">Print Map</button><br>
    <button id="toggle-button" onclick="togglePoints()">Hide Points</button>
  </div>
  <script>
    const data = {data};
    const map = L.map('map', {{ center: data.center, zoom: data.zoom }});
    L.control.scale().addTo(map);
    L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
      maxZoom: 19,
      attribution: '&copy; OpenStreetMap contributors'
    }}).addTo(map);

    L.polyline(data.centerline, {{ color: 'blue', weight: 4 }}).addTo(map);
    data.edges.filter(edge => edge.length > 0).forEach(edge =>
      L.polyline(edge, {{ color: 'gray', weight: 2 }}).addTo(map));
    data.contours.forEach(contour =>
      L.polyline(contour.points, {{ color: 'green', weight: 2.5 }})
        .bindTooltip(contour.tooltip).addTo(map));

    const points = L.featureGroup();
    data.markers.forEach(marker => {{
      const icon = L.divIcon({{
        className: '',
        html: '<div class="station-icon">' + marker.number + '</div>',
        iconSize: [24, 24]
      }});
      L.marker(marker.position, {{ icon: icon }})
        .bindTooltip(marker.tooltip)
        .addTo(points);
    }});
    points.addTo(map);

    function toggleFormat(fmt) {{
      document.querySelectorAll('.coord-dms').forEach(el => el.style.display = fmt === 'dms' ? 'block' : 'none');
      document.querySelectorAll('.coord-utm').forEach(el => el.style.display = fmt === 'utm' ? 'block' : 'none');
      document.querySelectorAll('.coord-ne').forEach(el => el.style.display = fmt === 'ne' ? 'block' : 'none');
    }}

    let pointsVisible = true;
    function printMap() {{ window.print(); }}
    function togglePoints() {{
      if (pointsVisible) {{
        map.removeLayer(points);
      }} else {{
        points.addTo(map);
      }}
      pointsVisible = !pointsVisible;
      document.getElementById('toggle-button').innerText = pointsVisible ? 'Hide Points' : 'Show Points';
    }}
  </script>
</body>
</html>
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::{default_zoom, render, sidebar};
    use survey::{geo::geometry::Coord, utm::Crs, Survey};

    fn survey() -> Survey {
        Survey::builder()
            .points(vec![
                Coord {
                    x: 486_261.21,
                    y: 1_087_959.9,
                },
                Coord {
                    x: 485_907.87,
                    y: 1_088_478.4,
                },
            ])
            .source_crs("EPSG:32651".parse::<Crs>().unwrap())
            .build(None)
            .unwrap()
    }

    #[test]
    fn test_escape() {
        let mut survey = survey();
        survey.stations[0].labels.latitude = r#"9°50'31.6"N <b>&"#.to_owned();
        let html = sidebar(&survey).unwrap();
        assert!(html.contains(r#"9°50'31.6"N &lt;b&gt;&amp;<br>"#));
        assert!(!html.contains("<b>&"));
    }

    #[test]
    fn test_render() {
        let survey = survey();
        assert_eq!(default_zoom(&survey), 17);
        let page = render(&survey, default_zoom(&survey)).unwrap();

        assert!(page.contains("<b>Point 1</b>"));
        assert!(page.contains("<b>Point 2</b>"));
        assert!(page.contains(r#"9°50'31.6"N<br>122°52'28.9"E"#));
        assert!(page.contains("E: 486261.21<br>N: 1087959.90"));
        assert!(page.contains("N: 1088478.40<br>E: 485907.87"));
        assert!(!page.contains("Elevation:"));
        assert!(page.contains(r#""zoom":17"#));
        assert!(page.contains(r#""tooltip":"9°50'31.6\"N, 122°52'28.9\"E""#));
        assert!(page.contains("color: 'gray', weight: 2"));
        assert!(page.contains("Hide Points"));
    }

    #[test]
    fn test_payload_cannot_close_script() {
        let mut survey = survey();
        survey.stations[0].labels.latitude = "</script><script>alert(1)".to_owned();
        let page = render(&survey, 17).unwrap();
        assert!(!page.contains("</script><script>alert(1)"));
        assert!(page.contains(r"<\/script><script>alert(1)"));
    }
}
