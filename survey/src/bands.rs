//! Grouping of points by rounded elevation.

use crate::SurveyError;
use geo::geometry::Coord;
use serde::{ser::Serializer, Serialize};
use std::collections::BTreeMap;

/// Default rounding step, in meters.
pub const DEFAULT_STEP: f64 = 5.0;

/// Minimum number of points for a band to be drawn as a contour line.
pub const MIN_CONTOUR_POINTS: usize = 2;

/// Geographic points grouped by elevation rounded to a multiple of
/// `step`.
///
/// Rounding is half away from zero: with a step of 5, 102.5 belongs to
/// the 105 band and -2.5 to the -5 band. Points within a band keep their
/// input order; bands are ordered by elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationBands {
    step: f64,
    /// Keyed by multiple of `step`.
    bands: BTreeMap<i64, Vec<Coord<f64>>>,
}

impl ElevationBands {
    /// Groups `samples` by rounded elevation. Samples without an
    /// elevation, or with a non-finite one, are left out.
    pub fn new<I>(step: f64, samples: I) -> Result<Self, SurveyError>
    where
        I: IntoIterator<Item = (Coord<f64>, Option<f64>)>,
    {
        if !(step > 0.0 && step.is_finite()) {
            return Err(SurveyError::Config(
                "elevation step must be positive and finite".to_owned(),
            ));
        }
        let mut bands: BTreeMap<i64, Vec<Coord<f64>>> = BTreeMap::new();
        for (coord, elevation) in samples {
            if let Some(elevation) = elevation.filter(|z| z.is_finite()) {
                bands
                    .entry(band_index(elevation, step))
                    .or_default()
                    .push(coord);
            }
        }
        Ok(Self { step, bands })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of distinct bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Returns the points in the band for `elevation`, after rounding.
    pub fn get(&self, elevation: f64) -> Option<&[Coord<f64>]> {
        self.bands
            .get(&band_index(elevation, self.step))
            .map(Vec::as_slice)
    }

    /// Iterates `(band elevation, points)` in ascending elevation.
    #[allow(clippy::cast_precision_loss)]
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[Coord<f64>])> + '_ {
        self.bands
            .iter()
            .map(|(k, points)| (*k as f64 * self.step, points.as_slice()))
    }

    /// Bands with enough points to draw a line through.
    pub fn contours(&self) -> impl Iterator<Item = (f64, &[Coord<f64>])> + '_ {
        self.iter()
            .filter(|(_, points)| points.len() >= MIN_CONTOUR_POINTS)
    }
}

/// Returns the multiple of `step` nearest to `elevation`, rounding
/// half away from zero.
#[allow(clippy::cast_possible_truncation)]
pub fn band_index(elevation: f64, step: f64) -> i64 {
    (elevation / step).round() as i64
}

impl Serialize for ElevationBands {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Band<'a> {
            elevation: f64,
            points: &'a [Coord<f64>],
        }
        serializer.collect_seq(
            self.iter()
                .map(|(elevation, points)| Band { elevation, points }),
        )
    }
}
