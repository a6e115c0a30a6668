use anyhow::Result;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::json;
use std::io::Write;
use survey::{
    geo::geometry::{LineString, Point},
    Survey,
};
use textplots::{Chart, Plot, Shape};

pub fn write_json<W: Write>(mut wtr: W, survey: &Survey) -> Result<()> {
    serde_json::to_writer(&mut wtr, survey)?;
    writeln!(wtr)?;
    Ok(())
}

fn line_feature(line: &LineString<f64>, properties: serde_json::Value) -> Feature {
    let mut feature = Feature::from(Geometry::new(Value::from(line)));
    if let serde_json::Value::Object(properties) = properties {
        feature.properties = Some(properties);
    }
    feature
}

/// Builds a feature collection of the centerline, road edges, contours
/// and stations, each tagged with a `kind` property.
pub fn feature_collection(survey: &Survey) -> FeatureCollection {
    let mut features = Vec::new();
    features.push(line_feature(
        &survey.centerline(),
        json!({ "kind": "centerline" }),
    ));
    if !survey.offsets.is_empty() {
        let (left, right) = survey.edges();
        features.push(line_feature(&left, json!({ "kind": "edge", "side": "left" })));
        features.push(line_feature(&right, json!({ "kind": "edge", "side": "right" })));
    }
    for contour in &survey.contours {
        features.push(line_feature(
            &contour.line,
            json!({ "kind": "contour", "elevation": contour.elevation }),
        ));
    }
    for station in &survey.stations {
        let mut feature = Feature::from(Geometry::new(Value::from(&Point::from(
            station.geographic,
        ))));
        feature.set_property("kind", "station");
        feature.set_property("number", station.number);
        feature.set_property("easting", station.projected.x);
        feature.set_property("northing", station.projected.y);
        feature.set_property("elevation", station.elevation);
        feature.set_property("latitude_dms", station.labels.latitude.as_str());
        feature.set_property("longitude_dms", station.labels.longitude.as_str());
        features.push(feature);
    }
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson<W: Write>(mut wtr: W, survey: &Survey) -> Result<()> {
    serde_json::to_writer(&mut wtr, &feature_collection(survey))?;
    writeln!(wtr)?;
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// roadmap --elevation csv | tr ',' ' ' | tail -n +2 > ~/.tmp/plot && gnuplot -p -e "plot '~/.tmp/plot' using 1:6 with linespoints"
/// ```
pub fn write_csv<W: Write>(mut wtr: W, survey: &Survey) -> Result<()> {
    writeln!(wtr, "Point,Longitude,Latitude,Easting,Northing,Elevation")?;
    for station in &survey.stations {
        let number = station.number;
        let longitude = station.geographic.x;
        let latitude = station.geographic.y;
        let easting = &station.labels.easting;
        let northing = &station.labels.northing;
        let elevation = station
            .elevation
            .map(|z| z.to_string())
            .unwrap_or_default();
        writeln!(
            wtr,
            "{number},{longitude},{latitude},{easting},{northing},{elevation}"
        )?;
    }
    Ok(())
}

/// Station number against elevation, for stations that have one.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn plot_data(survey: &Survey) -> Vec<(f32, f32)> {
    survey
        .stations
        .iter()
        .filter_map(|station| {
            station
                .elevation
                .map(|z| (station.number as f32, z as f32))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn plot_ascii(survey: &Survey) {
    let plot_data = plot_data(survey);
    if plot_data.is_empty() {
        eprintln!("no elevations to plot, try --elevation");
        return;
    }
    let last = survey.stations.last().map_or(1, |station| station.number);
    Chart::new(300, 150, 1.0, (last as f32).max(2.0))
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}
