use crate::{
    bands::{ElevationBands, DEFAULT_STEP},
    config::{ErrorPolicy, DEFAULT_OFFSET_DISTANCE},
    elevation::ElevationLookup,
    math::{format_dms, offset_segment, Axis, OffsetPair},
    SurveyError,
};
use geo::geometry::{Coord, LineString};
use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;
use utm::{Crs, Transformer, UtmError};

/// A surveyed centerline with everything needed to draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    /// CRS the input points were given in.
    pub source_crs: Crs,

    /// Projected CRS offsets were computed in.
    pub working_crs: Crs,

    /// Mean longitude/latitude of all stations.
    pub center: Coord<f64>,

    /// Every input point that could be located, in input order.
    pub stations: Vec<Station>,

    /// Road edges, one entry per centerline segment.
    pub offsets: Vec<Offset>,

    pub bands: ElevationBands,

    /// Bands with enough points to draw.
    pub contours: Vec<Contour>,

    /// Inputs left out under [`ErrorPolicy::Skip`].
    pub skipped: Vec<Skipped>,

    /// Whether elevations were looked up at all.
    pub elevation_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    /// 1-based position in the input.
    pub number: usize,

    /// Easting/northing in the working CRS.
    pub projected: Coord<f64>,

    /// Longitude/latitude.
    pub geographic: Coord<f64>,

    pub elevation: Option<f64>,

    pub labels: Labels,
}

/// Preformatted display strings for a [`Station`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub latitude: String,
    pub longitude: String,
    pub easting: String,
    pub northing: String,
    pub elevation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offset {
    /// Station numbers at either end of the segment.
    pub from: usize,
    pub to: usize,

    /// Edges in the working CRS.
    pub projected: OffsetPair,

    /// Edges in longitude/latitude.
    pub geographic: OffsetPair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    pub elevation: f64,
    pub line: LineString<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkippedKind {
    Point,
    Segment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub kind: SkippedKind,

    /// 0-based point or segment index.
    pub index: usize,

    pub reason: String,
}

impl Station {
    fn new(
        number: usize,
        projected: Coord<f64>,
        geographic: Coord<f64>,
        elevation: Option<f64>,
    ) -> Self {
        let labels = Labels {
            latitude: format_dms(geographic.y, Axis::Latitude),
            longitude: format_dms(geographic.x, Axis::Longitude),
            easting: format!("{:.2}", projected.x),
            northing: format!("{:.2}", projected.y),
            elevation: elevation.map_or_else(|| "N/A".to_owned(), |z| format!("{z} m")),
        };
        Self {
            number,
            projected,
            geographic,
            elevation,
            labels,
        }
    }

    /// Hover text for the station's marker.
    pub fn tooltip(&self, with_elevation: bool) -> String {
        let Labels {
            latitude,
            longitude,
            elevation,
            ..
        } = &self.labels;
        if with_elevation {
            format!("{latitude}, {longitude} | Elev: {elevation}")
        } else {
            format!("{latitude}, {longitude}")
        }
    }
}

impl Survey {
    pub fn builder() -> SurveyBuilder {
        SurveyBuilder {
            points: None,
            source_crs: None,
            target_crs: Crs::Wgs84,
            offset_distance: DEFAULT_OFFSET_DISTANCE,
            elevation_step: DEFAULT_STEP,
            invalid_points: ErrorPolicy::Abort,
            degenerate_segments: ErrorPolicy::Abort,
        }
    }

    /// The surveyed line through all stations.
    pub fn centerline(&self) -> LineString<f64> {
        self.stations.iter().map(|s| s.geographic).collect()
    }

    /// Left and right road edges, each as one line through the
    /// endpoints of every segment's offset.
    pub fn edges(&self) -> (LineString<f64>, LineString<f64>) {
        let left = self
            .offsets
            .iter()
            .flat_map(|o| [o.geographic.left.start, o.geographic.left.end])
            .collect();
        let right = self
            .offsets
            .iter()
            .flat_map(|o| [o.geographic.right.start, o.geographic.right.end])
            .collect();
        (left, right)
    }
}

pub struct SurveyBuilder {
    /// Input points in `source_crs` (required).
    points: Option<Vec<Coord<f64>>>,

    /// CRS of `points` (required).
    source_crs: Option<Crs>,

    /// Output CRS (defaults to EPSG:4326, the only one supported).
    target_crs: Crs,

    /// Road half width (meters, defaults to 3).
    offset_distance: f64,

    /// Elevation band size (meters, defaults to 5).
    elevation_step: f64,

    invalid_points: ErrorPolicy,

    degenerate_segments: ErrorPolicy,
}

impl SurveyBuilder {
    /// Input points (required).
    #[must_use]
    pub fn points(mut self, points: Vec<Coord<f64>>) -> Self {
        self.points = Some(points);
        self
    }

    /// CRS of the input points (required).
    #[must_use]
    pub fn source_crs(mut self, crs: Crs) -> Self {
        self.source_crs = Some(crs);
        self
    }

    #[must_use]
    pub fn target_crs(mut self, crs: Crs) -> Self {
        self.target_crs = crs;
        self
    }

    #[must_use]
    pub fn offset_distance(mut self, meters: f64) -> Self {
        self.offset_distance = meters;
        self
    }

    #[must_use]
    pub fn elevation_step(mut self, meters: f64) -> Self {
        self.elevation_step = meters;
        self
    }

    #[must_use]
    pub fn invalid_points(mut self, policy: ErrorPolicy) -> Self {
        self.invalid_points = policy;
        self
    }

    #[must_use]
    pub fn degenerate_segments(mut self, policy: ErrorPolicy) -> Self {
        self.degenerate_segments = policy;
        self
    }

    /// Computes the survey, looking up elevations with `elevation` if
    /// given.
    pub fn build(&self, elevation: Option<&ElevationLookup>) -> Result<Survey, SurveyError> {
        let points = self.points.as_deref().ok_or(SurveyError::Builder("points"))?;
        let source_crs = self.source_crs.ok_or(SurveyError::Builder("source_crs"))?;
        self.validate(points)?;

        let working_crs = working_crs(source_crs, points)?;
        let to_working = Transformer::new(source_crs, working_crs)?;
        let to_target = Transformer::new(working_crs, self.target_crs)?;
        let mut skipped = Vec::new();

        let (located, locate_runtime) = {
            let now = Instant::now();
            let mut located = Vec::with_capacity(points.len());
            for (index, &point) in points.iter().enumerate() {
                match locate(&to_working, &to_target, source_crs, point) {
                    Ok((projected, geographic)) => located.push((index + 1, projected, geographic)),
                    Err(e) => self.skip_point(index, e, &mut skipped)?,
                }
            }
            (located, now.elapsed())
        };
        if located.is_empty() {
            return Err(SurveyError::Config("no valid points".to_owned()));
        }

        let elevations = match elevation {
            Some(lookup) => {
                let coords: Vec<Coord<f64>> = located.iter().map(|(_, _, g)| *g).collect();
                lookup.get_all(&coords)
            }
            None => vec![None; located.len()],
        };
        let stations: Vec<Station> = located
            .into_iter()
            .zip(elevations)
            .map(|((number, projected, geographic), z)| {
                Station::new(number, projected, geographic, z)
            })
            .collect();

        let (offsets, offset_runtime) = {
            let now = Instant::now();
            let offsets = self.offsets(&stations, &to_target, &mut skipped)?;
            (offsets, now.elapsed())
        };

        let bands = ElevationBands::new(
            self.elevation_step,
            stations.iter().map(|s| (s.geographic, s.elevation)),
        )?;
        let contours = bands
            .contours()
            .map(|(elevation, points)| Contour {
                elevation,
                line: points.to_vec().into(),
            })
            .collect();

        debug!(
            "survey; stations: {}, offsets: {}, bands: {}, skipped: {}, locate_exec: {:?}, offset_exec: {:?}",
            stations.len(),
            offsets.len(),
            bands.len(),
            skipped.len(),
            locate_runtime,
            offset_runtime
        );

        Ok(Survey {
            source_crs,
            working_crs,
            center: center(&stations),
            stations,
            offsets,
            bands,
            contours,
            skipped,
            elevation_enabled: elevation.is_some(),
        })
    }

    fn validate(&self, points: &[Coord<f64>]) -> Result<(), SurveyError> {
        let fail = |msg: &str| Err(SurveyError::Config(msg.to_owned()));
        if points.is_empty() {
            return fail("no points");
        }
        if !(self.offset_distance > 0.0 && self.offset_distance.is_finite()) {
            return fail("offset distance must be positive and finite");
        }
        if !(self.elevation_step > 0.0 && self.elevation_step.is_finite()) {
            return fail("elevation step must be positive and finite");
        }
        if !self.target_crs.is_geographic() {
            return Err(SurveyError::Config(format!(
                "unsupported target {}, expected EPSG:4326",
                self.target_crs
            )));
        }
        Ok(())
    }

    fn skip_point(
        &self,
        index: usize,
        source: UtmError,
        skipped: &mut Vec<Skipped>,
    ) -> Result<(), SurveyError> {
        let err = SurveyError::InvalidCoordinate { index, source };
        match self.invalid_points {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                warn!("skipping {err}");
                skipped.push(Skipped {
                    kind: SkippedKind::Point,
                    index,
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }

    fn skip_segment(
        &self,
        policy: ErrorPolicy,
        index: usize,
        err: SurveyError,
        skipped: &mut Vec<Skipped>,
    ) -> Result<(), SurveyError> {
        match policy {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                warn!("skipping segment {index}, {err}");
                skipped.push(Skipped {
                    kind: SkippedKind::Segment,
                    index,
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }

    fn offsets(
        &self,
        stations: &[Station],
        to_target: &Transformer,
        skipped: &mut Vec<Skipped>,
    ) -> Result<Vec<Offset>, SurveyError> {
        let mut offsets = Vec::with_capacity(stations.len().saturating_sub(1));
        for (index, (from, to)) in stations.iter().tuple_windows().enumerate() {
            let projected = match offset_segment(from.projected, to.projected, self.offset_distance)
            {
                Ok(pair) => pair,
                Err(SurveyError::DegenerateSegment { .. }) => {
                    let err = SurveyError::DegenerateSegment { index };
                    self.skip_segment(self.degenerate_segments, index, err, skipped)?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            // Edge points may fall just outside the zone's numeric range,
            // e.g. south of the equator in a northern zone.
            match projected.try_map_coords(|c| to_target.transform_derived(c)) {
                Ok(geographic) => offsets.push(Offset {
                    from: from.number,
                    to: to.number,
                    projected,
                    geographic,
                }),
                Err(source) => {
                    let err = SurveyError::InvalidCoordinate {
                        index: from.number - 1,
                        source,
                    };
                    self.skip_segment(self.invalid_points, index, err, skipped)?;
                }
            }
        }
        Ok(offsets)
    }
}

/// Picks the projected CRS offsets are computed in: the source itself
/// when it is projected, otherwise the UTM zone of the first usable point.
fn working_crs(source: Crs, points: &[Coord<f64>]) -> Result<Crs, SurveyError> {
    if !source.is_geographic() {
        return Ok(source);
    }
    let mut first_err = None;
    for (index, &point) in points.iter().enumerate() {
        match Crs::utm_for(point) {
            Ok(crs) => return Ok(crs),
            Err(e) => {
                first_err.get_or_insert(SurveyError::InvalidCoordinate { index, source: e });
            }
        }
    }
    Err(first_err.unwrap_or_else(|| SurveyError::Config("no points".to_owned())))
}

/// Returns a point's projected and geographic coordinates.
fn locate(
    to_working: &Transformer,
    to_target: &Transformer,
    source: Crs,
    point: Coord<f64>,
) -> Result<(Coord<f64>, Coord<f64>), UtmError> {
    let projected = to_working.transform(point)?;
    let geographic = if source.is_geographic() {
        point
    } else {
        to_target.transform(projected)?
    };
    Ok((projected, geographic))
}

#[allow(clippy::cast_precision_loss)]
fn center(stations: &[Station]) -> Coord<f64> {
    let n = stations.len() as f64;
    let sum = stations
        .iter()
        .fold(Coord::zero(), |acc, s| acc + s.geographic);
    sum / n
}
