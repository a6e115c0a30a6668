use thiserror::Error;
use utm::UtmError;

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid configuration, {0}")]
    Config(String),

    #[error("point {index}, {source}")]
    InvalidCoordinate { index: usize, source: UtmError },

    #[error("segment {index} has zero length")]
    DegenerateSegment { index: usize },

    #[error("{0}")]
    Crs(#[from] UtmError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Elevation(#[from] ElevationError),
}

/// Reasons an elevation lookup produced no value.
///
/// These never abort a survey; the affected point is reported as
/// unavailable instead.
#[derive(Error, Debug)]
pub enum ElevationError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("elevation service responded with status {0}")]
    Status(u16),

    #[error("malformed elevation response, {0}")]
    Malformed(String),
}
