//! Survey line geometry.
//!
//! Turns a list of surveyed points into a drawable [`Survey`]: stations
//! in WGS84 with DMS labels, road edge offsets along the centerline, and
//! stations grouped into elevation bands when an [`ElevationLookup`] is
//! available.

pub mod bands;
mod config;
mod elevation;
mod error;
pub mod math;
mod survey;

pub use crate::{
    bands::ElevationBands,
    config::{ElevationConfig, ErrorPolicy, SurveyConfig, DEFAULT_OFFSET_DISTANCE},
    elevation::{
        ElevationLookup, ElevationSource, OpenElevation, DEFAULT_TIMEOUT, DEFAULT_WORKERS,
        OPEN_ELEVATION_URL,
    },
    error::{ElevationError, SurveyError},
    survey::{
        Contour, Labels, Offset, Skipped, SkippedKind, Station, Survey, SurveyBuilder,
    },
};
pub use geo;
pub use utm;
