use anyhow::{anyhow, Error as AnyError};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, str::FromStr};
use survey::{geo::geometry::Coord, utm::Crs};

/// Draw a surveyed road centerline, its edges and elevation contours.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// JSON survey configuration. Flags below override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Survey point "x,y" in the source CRS (easting,northing or
    /// lon,lat). Repeat for each point.
    #[arg(short, long = "point", allow_hyphen_values = true)]
    pub points: Vec<XY>,

    /// CRS of the survey points, e.g. "EPSG:32651".
    #[arg(long)]
    pub source_crs: Option<Crs>,

    /// Distance from the centerline to each road edge, in meters.
    #[arg(long)]
    pub offset: Option<f64>,

    /// Elevation band size, in meters.
    #[arg(long)]
    pub step: Option<f64>,

    /// Look up elevations for every point.
    #[arg(short, long, default_value_t = false)]
    pub elevation: bool,

    /// Open-Elevation compatible lookup endpoint (implies --elevation).
    #[arg(long)]
    pub elevation_url: Option<String>,

    /// Maximum concurrent elevation requests.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Elevation request timeout, in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Leave out invalid points and zero length segments instead of
    /// failing.
    #[arg(long, default_value_t = false)]
    pub skip_invalid: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

/// A coordinate pair given as "x,y".
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write a map page.
    Html {
        /// Output file.
        #[arg(short, long, default_value = "road_center.html")]
        out: PathBuf,

        /// Initial zoom level [default: 18 with elevations, 17 without].
        #[arg(short, long)]
        zoom: Option<u8>,

        /// Open the page in a browser once written.
        #[arg(long, default_value_t = false)]
        open: bool,
    },

    /// Print the survey as JSON.
    Json,

    /// Print the survey as a GeoJSON feature collection.
    Geojson,

    /// Print one CSV row per point.
    Csv,

    /// Plot elevations to terminal.
    Plot,
}
