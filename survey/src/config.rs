//! JSON survey configuration.

use crate::{
    bands::DEFAULT_STEP,
    elevation::{ElevationLookup, OpenElevation, DEFAULT_WORKERS, OPEN_ELEVATION_URL},
    survey::SurveyBuilder,
    SurveyError,
};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, time::Duration};
use utm::Crs;

/// Default road half width, in meters.
pub const DEFAULT_OFFSET_DISTANCE: f64 = 3.0;

/// What to do with an input that cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Fail the whole survey.
    #[default]
    Abort,

    /// Leave the input out and report it in [`crate::Survey::skipped`].
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Input points as `[x, y]` in `source_crs`.
    #[serde(default)]
    pub points: Vec<[f64; 2]>,

    #[serde(default = "default_source_crs")]
    pub source_crs: Crs,

    #[serde(default = "default_target_crs")]
    pub target_crs: Crs,

    #[serde(default = "default_offset_distance")]
    pub offset_distance: f64,

    #[serde(default = "default_elevation_step")]
    pub elevation_step: f64,

    #[serde(default)]
    pub invalid_points: ErrorPolicy,

    #[serde(default)]
    pub degenerate_segments: ErrorPolicy,

    /// Elevation lookup settings; no lookups are made when absent.
    #[serde(default)]
    pub elevation: Option<ElevationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElevationConfig {
    #[serde(default = "default_elevation_url")]
    pub url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of concurrent requests.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_source_crs() -> Crs {
    // WGS 84 / UTM zone 51N
    Crs::Utm {
        zone: 51,
        hemisphere: utm::Hemisphere::North,
    }
}

fn default_target_crs() -> Crs {
    Crs::Wgs84
}

fn default_offset_distance() -> f64 {
    DEFAULT_OFFSET_DISTANCE
}

fn default_elevation_step() -> f64 {
    DEFAULT_STEP
}

fn default_elevation_url() -> String {
    OPEN_ELEVATION_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            source_crs: default_source_crs(),
            target_crs: default_target_crs(),
            offset_distance: default_offset_distance(),
            elevation_step: default_elevation_step(),
            invalid_points: ErrorPolicy::default(),
            degenerate_segments: ErrorPolicy::default(),
            elevation: None,
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            url: default_elevation_url(),
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
        }
    }
}

impl SurveyConfig {
    /// Reads a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SurveyError> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(rdr)?)
    }

    /// Checks everything that can be checked before computing.
    pub fn validate(&self) -> Result<(), SurveyError> {
        let fail = |msg: &str| Err(SurveyError::Config(msg.to_owned()));
        if self.points.is_empty() {
            return fail("no points");
        }
        if !(self.offset_distance > 0.0 && self.offset_distance.is_finite()) {
            return fail("offset_distance must be positive and finite");
        }
        if !(self.elevation_step > 0.0 && self.elevation_step.is_finite()) {
            return fail("elevation_step must be positive and finite");
        }
        if !self.target_crs.is_geographic() {
            return fail("target_crs must be EPSG:4326");
        }
        if let Some(elevation) = &self.elevation {
            if elevation.workers == 0 {
                return fail("elevation.workers must be at least 1");
            }
            if elevation.timeout_secs == 0 {
                return fail("elevation.timeout_secs must be at least 1");
            }
            if elevation.url.is_empty() {
                return fail("elevation.url is empty");
            }
        }
        Ok(())
    }

    /// Returns a [`SurveyBuilder`] populated from this configuration.
    pub fn builder(&self) -> SurveyBuilder {
        crate::Survey::builder()
            .points(
                self.points
                    .iter()
                    .map(|&[x, y]| Coord { x, y })
                    .collect(),
            )
            .source_crs(self.source_crs)
            .target_crs(self.target_crs)
            .offset_distance(self.offset_distance)
            .elevation_step(self.elevation_step)
            .invalid_points(self.invalid_points)
            .degenerate_segments(self.degenerate_segments)
    }

    /// Returns a client for the Open-Elevation compatible service in
    /// `elevation.url`, if lookups are configured.
    pub fn elevation_source(&self) -> Result<Option<OpenElevation>, SurveyError> {
        self.elevation
            .as_ref()
            .map(|elevation| {
                OpenElevation::new(
                    elevation.url.as_str(),
                    Duration::from_secs(elevation.timeout_secs),
                )
            })
            .transpose()
            .map_err(SurveyError::from)
    }

    /// Builds the configured elevation lookup, if any.
    pub fn elevation_lookup(&self) -> Result<Option<ElevationLookup>, SurveyError> {
        match (self.elevation_source()?, &self.elevation) {
            (Some(source), Some(elevation)) => Ok(Some(ElevationLookup::new(
                Box::new(source),
                elevation.workers,
            )?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ElevationConfig, ErrorPolicy, SurveyConfig, SurveyError};
    use std::io::Write;
    use utm::Crs;

    #[test]
    fn test_defaults() {
        let config: SurveyConfig =
            serde_json::from_str(r#"{"points": [[486261.21, 1087959.9]]}"#).unwrap();
        assert_eq!(config.source_crs.to_string(), "EPSG:32651");
        assert_eq!(config.target_crs, Crs::Wgs84);
        assert_eq!(config.offset_distance, 3.0);
        assert_eq!(config.elevation_step, 5.0);
        assert_eq!(config.invalid_points, ErrorPolicy::Abort);
        assert_eq!(config.elevation, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_full() {
        let config: SurveyConfig = serde_json::from_str(
            r#"{
                "points": [[122.877036670, 9.853383158], [122.8785, 9.8541]],
                "source_crs": "EPSG:4326",
                "target_crs": "epsg:4326",
                "offset_distance": 4.5,
                "elevation_step": 10,
                "invalid_points": "skip",
                "degenerate_segments": "skip",
                "elevation": { "workers": 2 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.source_crs, Crs::Wgs84);
        assert_eq!(config.points.len(), 2);
        assert_eq!(config.elevation_step, 10.0);
        assert_eq!(config.degenerate_segments, ErrorPolicy::Skip);
        assert_eq!(
            config.elevation,
            Some(ElevationConfig {
                workers: 2,
                ..ElevationConfig::default()
            })
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_fields_and_crs() {
        assert!(serde_json::from_str::<SurveyConfig>(r#"{"pionts": []}"#).is_err());
        assert!(serde_json::from_str::<SurveyConfig>(r#"{"source_crs": "EPSG:3857"}"#).is_err());
        assert!(serde_json::from_str::<SurveyConfig>(r#"{"source_crs": "utm51"}"#).is_err());
    }

    #[test]
    fn test_validate() {
        let valid = SurveyConfig {
            points: vec![[486_261.21, 1_087_959.9]],
            ..SurveyConfig::default()
        };
        valid.validate().unwrap();

        let invalid = [
            SurveyConfig::default(),
            SurveyConfig {
                offset_distance: 0.0,
                ..valid.clone()
            },
            SurveyConfig {
                offset_distance: -3.0,
                ..valid.clone()
            },
            SurveyConfig {
                elevation_step: f64::INFINITY,
                ..valid.clone()
            },
            SurveyConfig {
                target_crs: "EPSG:32651".parse().unwrap(),
                ..valid.clone()
            },
            SurveyConfig {
                elevation: Some(ElevationConfig {
                    workers: 0,
                    ..ElevationConfig::default()
                }),
                ..valid.clone()
            },
        ];
        for config in invalid {
            assert!(matches!(config.validate(), Err(SurveyError::Config(_))));
        }
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"points": [[1, 2], [3, 4]], "offset_distance": 2}}"#).unwrap();
        let config = SurveyConfig::from_path(file.path()).unwrap();
        assert_eq!(config.points, vec![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(config.offset_distance, 2.0);

        assert!(matches!(
            SurveyConfig::from_path("/nonexistent/survey.json"),
            Err(SurveyError::Io(_))
        ));
    }

    #[test]
    fn test_elevation_lookup() {
        let mut config = SurveyConfig::default();
        assert!(config.elevation_source().unwrap().is_none());
        assert!(config.elevation_lookup().unwrap().is_none());

        config.elevation = Some(ElevationConfig::default());
        assert!(config.elevation_lookup().unwrap().is_some());

        config.elevation = Some(ElevationConfig {
            workers: 0,
            ..ElevationConfig::default()
        });
        assert!(config.elevation_lookup().is_err());
    }

    #[test]
    fn test_serialize_crs() {
        let config = SurveyConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["source_crs"], "EPSG:32651");
        assert_eq!(json["invalid_points"], "abort");
    }
}
