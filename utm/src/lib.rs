//! WGS84 / UTM coordinate reference systems and transforms.
//!
//! Projection math is delegated to [`proj4rs`]; this crate adds EPSG
//! parsing, zone selection and the domain checks UTM needs.
//!
//! # References
//!
//! 1. [EPSG:32651, WGS 84 / UTM zone 51N](https://epsg.io/32651)
//! 1. [NGA, The Universal Grids (TM 8358.2)](https://earth-info.nga.mil/php/download.php?file=coord-utmups)

mod crs;
mod error;

pub use crate::{
    crs::{Crs, Hemisphere},
    error::UtmError,
};
pub use geo;

use crate::crs::{check_geographic, check_projected, MAX_LAT, MIN_LAT};
use geo::geometry::Coord;
use proj4rs::Proj;
use std::{fmt, sync::Arc};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Converts coordinates from a `source` to a `target` CRS.
///
/// Input and output are always in x/y order (easting/northing or
/// longitude/latitude) and geographic values are in degrees.
#[derive(Clone)]
pub struct Transformer {
    source: Crs,
    target: Crs,
    source_proj: Arc<Proj>,
    target_proj: Arc<Proj>,
    geographic: Arc<Proj>,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn proj(crs: Crs) -> Result<Arc<Proj>, UtmError> {
    Proj::from_proj_string(&crs.proj_string())
        .map(Arc::new)
        .map_err(|e| UtmError::Proj(e.to_string()))
}

impl Transformer {
    pub fn new(source: Crs, target: Crs) -> Result<Self, UtmError> {
        Ok(Self {
            source,
            target,
            source_proj: proj(source)?,
            target_proj: proj(target)?,
            geographic: proj(Crs::Wgs84)?,
        })
    }

    pub fn source(&self) -> Crs {
        self.source
    }

    pub fn target(&self) -> Crs {
        self.target
    }

    /// Returns a transformer going from `target` back to `source`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            source_proj: Arc::clone(&self.target_proj),
            target_proj: Arc::clone(&self.source_proj),
            geographic: Arc::clone(&self.geographic),
        }
    }

    /// Transforms a single coordinate.
    ///
    /// Fails with [`UtmError::InvalidCoordinate`] if `coord` lies outside
    /// the valid domain of the source CRS.
    pub fn transform(&self, coord: Coord<C>) -> Result<Coord<C>, UtmError> {
        check(self.source, coord)?;
        if self.source == self.target {
            return Ok(coord);
        }
        let geographic = match self.source {
            Crs::Wgs84 => coord,
            source => {
                let geographic = self.unproject(coord)?;
                if !(MIN_LAT..=MAX_LAT).contains(&geographic.y) {
                    return Err(UtmError::InvalidCoordinate {
                        x: coord.x,
                        y: coord.y,
                        crs: source,
                    });
                }
                geographic
            }
        };
        match self.target {
            Crs::Wgs84 => Ok(geographic),
            target => {
                check_meridian(target, geographic)?;
                self.project(geographic)
            }
        }
    }

    /// Transforms a coordinate derived from checked ones, such as a
    /// point offset from a transformed vertex.
    ///
    /// Unlike [`Transformer::transform`] the source domain is not
    /// enforced, so a point just south of the equator in a northern
    /// zone is accepted. Fails only if the result is not finite.
    pub fn transform_derived(&self, coord: Coord<C>) -> Result<Coord<C>, UtmError> {
        let result = if self.source == self.target {
            coord
        } else {
            let geographic = match self.source {
                Crs::Wgs84 => coord,
                _ => self.unproject(coord)?,
            };
            match self.target {
                Crs::Wgs84 => geographic,
                _ => self.project(geographic)?,
            }
        };
        if result.x.is_finite() && result.y.is_finite() {
            Ok(result)
        } else {
            Err(UtmError::InvalidCoordinate {
                x: coord.x,
                y: coord.y,
                crs: self.source,
            })
        }
    }

    /// Source easting/northing to longitude/latitude in degrees.
    fn unproject(&self, Coord { x, y }: Coord<C>) -> Result<Coord<C>, UtmError> {
        let mut point = (x, y, 0.0);
        proj4rs::transform::transform(&self.source_proj, &self.geographic, &mut point)
            .map_err(|e| UtmError::Proj(e.to_string()))?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    /// Longitude/latitude in degrees to target easting/northing.
    fn project(&self, Coord { x: lon, y: lat }: Coord<C>) -> Result<Coord<C>, UtmError> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.geographic, &self.target_proj, &mut point)
            .map_err(|e| UtmError::Proj(e.to_string()))?;
        Ok(Coord {
            x: point.0,
            y: point.1,
        })
    }
}

fn check(crs: Crs, coord: Coord<C>) -> Result<(), UtmError> {
    match crs {
        Crs::Wgs84 => check_geographic(coord),
        Crs::Utm { .. } => check_projected(crs, coord),
    }
}

/// Transverse Mercator is singular a quarter turn away from the
/// central meridian.
fn check_meridian(target: Crs, coord: Coord<C>) -> Result<(), UtmError> {
    let lon0 = target.central_meridian().unwrap_or_default();
    let dlambda = (coord.x - lon0 + 180.0).rem_euclid(360.0) - 180.0;
    if dlambda.abs() < 90.0 {
        Ok(())
    } else {
        Err(UtmError::InvalidCoordinate {
            x: coord.x,
            y: coord.y,
            crs: Crs::Wgs84,
        })
    }
}
