//! Elevation lookups.
//!
//! Lookups never fail a survey. Any error from an [`ElevationSource`]
//! is logged and the point is treated as having no elevation.

use crate::{ElevationError, SurveyError};
use dashmap::DashMap;
use geo::geometry::Coord;
use itertools::Itertools;
use log::{debug, warn};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Public Open-Elevation lookup endpoint.
pub const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of concurrent lookups.
pub const DEFAULT_WORKERS: usize = 4;

/// Something that knows the elevation at a geographic coordinate
/// (x = longitude, y = latitude).
pub trait ElevationSource: Sync {
    fn elevation(&self, coord: Coord<f64>) -> Result<f64, ElevationError>;
}

/// An [Open-Elevation](https://open-elevation.com) compatible HTTP
/// service.
///
/// Issues `GET {base_url}?locations={lat},{lon}` and expects
/// `{"results": [{"elevation": <number>}, ...]}`.
pub struct OpenElevation {
    base_url: String,
    client: Client,
}

impl OpenElevation {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ElevationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url(&self, Coord { x: lon, y: lat }: Coord<f64>) -> String {
        format!("{}?locations={lat},{lon}", self.base_url)
    }
}

impl ElevationSource for OpenElevation {
    fn elevation(&self, coord: Coord<f64>) -> Result<f64, ElevationError> {
        let response = self.client.get(self.url(coord)).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ElevationError::Status(status.as_u16()));
        }
        parse_lookup(&response.text()?)
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Deserialize)]
struct LookupResult {
    elevation: f64,
}

/// Extracts the first elevation from a lookup response body.
fn parse_lookup(body: &str) -> Result<f64, ElevationError> {
    let response: LookupResponse =
        serde_json::from_str(body).map_err(|e| ElevationError::Malformed(e.to_string()))?;
    response
        .results
        .first()
        .map(|result| result.elevation)
        .ok_or_else(|| ElevationError::Malformed("no results".to_owned()))
}

/// Runs an [`ElevationSource`] over many points on a bounded worker
/// pool, caching answers per coordinate.
pub struct ElevationLookup {
    source: Box<dyn ElevationSource>,

    /// Bounds the number of requests in flight.
    pool: ThreadPool,

    /// Previous answers, keyed by the coordinate's bit pattern.
    cache: DashMap<Coord<u64>, Option<f64>>,
}

impl ElevationLookup {
    pub fn new(source: Box<dyn ElevationSource>, workers: usize) -> Result<Self, SurveyError> {
        if workers == 0 {
            return Err(SurveyError::Config(
                "elevation workers must be at least 1".to_owned(),
            ));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|idx| format!("elevation-{idx}"))
            .build()?;
        Ok(Self {
            source,
            pool,
            cache: DashMap::new(),
        })
    }

    /// Returns the elevation at `coord`, or `None` if it is unavailable.
    ///
    /// Each coordinate is fetched at most once, even when requested
    /// from several threads at the same time.
    pub fn get(&self, coord: Coord<f64>) -> Option<f64> {
        *self
            .cache
            .entry(key(coord))
            .or_insert_with(|| self.fetch(coord))
    }

    /// Looks up every coordinate. The result is in the same order as
    /// `coords`.
    pub fn get_all(&self, coords: &[Coord<f64>]) -> Vec<Option<f64>> {
        let now = Instant::now();
        // Fetched outside the cache's locks so distinct coordinates in
        // the same shard do not wait on each other.
        let missing: Vec<Coord<f64>> = coords
            .iter()
            .copied()
            .unique_by(|coord| key(*coord))
            .filter(|coord| !self.cache.contains_key(&key(*coord)))
            .collect();
        let fetched: Vec<Option<f64>> = self
            .pool
            .install(|| missing.par_iter().map(|coord| self.fetch(*coord)).collect());
        for (coord, elevation) in missing.iter().zip(fetched) {
            self.cache.insert(key(*coord), elevation);
        }
        let elevations: Vec<Option<f64>> = coords.iter().map(|coord| self.get(*coord)).collect();
        debug!(
            "elevation; points: {}, fetched: {}, available: {}, exec: {:?}",
            coords.len(),
            missing.len(),
            elevations.iter().flatten().count(),
            now.elapsed()
        );
        elevations
    }

    fn fetch(&self, coord: Coord<f64>) -> Option<f64> {
        match self.source.elevation(coord) {
            Ok(elevation) if elevation.is_finite() => Some(elevation),
            Ok(elevation) => {
                warn!("discarding elevation {elevation} for {coord:?}");
                None
            }
            Err(e) => {
                warn!("elevation unavailable for {coord:?}, {e}");
                None
            }
        }
    }
}

/// Cache key: the coordinate's bit pattern.
fn key(coord: Coord<f64>) -> Coord<u64> {
    Coord {
        x: coord.x.to_bits(),
        y: coord.y.to_bits(),
    }
}
