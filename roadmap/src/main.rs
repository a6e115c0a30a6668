mod browser;
mod html;
mod options;
mod output;
mod progress;

use anyhow::Error as AnyError;
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd, XY};
use progress::Tracked;
use std::collections::HashSet;
use survey::{ElevationConfig, ElevationLookup, ErrorPolicy, Survey, SurveyConfig};

/// Road centerline surveyed in WGS 84 / UTM zone 51N (EPSG:32651),
/// drawn when no points are given.
const DEFAULT_SURVEY: [[f64; 2]; 14] = [
    [486_261.21, 1_087_959.88],
    [485_907.87, 1_088_478.4],
    [485_577.86, 1_088_967.78],
    [485_811.46, 1_089_136.73],
    [486_337.73, 1_089_587.77],
    [486_517.81, 1_089_204.63],
    [486_769.58, 1_088_814.35],
    [486_673.53, 1_088_554.66],
    [486_693.62, 1_088_236.22],
    [486_640.04, 1_088_143.97],
    [486_505.48, 1_087_996.02],
    [486_402.61, 1_087_930.75],
    [486_390.62, 1_087_993.53],
    [486_261.21, 1_087_959.88],
];

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    env_logger::init();

    let config = survey_config(&cli)?;
    let survey = run(&config)?;

    match cli.cmd {
        CliCmd::Html { out, zoom, open } => {
            let zoom = zoom.unwrap_or_else(|| html::default_zoom(&survey));
            std::fs::write(&out, html::render(&survey, zoom)?)?;
            info!("wrote {}", out.display());
            if open {
                browser::open(&out)?;
            }
        }
        CliCmd::Json => output::write_json(std::io::stdout().lock(), &survey)?,
        CliCmd::Geojson => output::write_geojson(std::io::stdout().lock(), &survey)?,
        CliCmd::Csv => output::write_csv(std::io::stdout().lock(), &survey)?,
        CliCmd::Plot => output::plot_ascii(&survey),
    };
    Ok(())
}

/// Loads the configuration file, if any, and applies command line
/// overrides on top.
fn survey_config(cli: &Cli) -> Result<SurveyConfig, AnyError> {
    let mut config = match &cli.config {
        Some(path) => SurveyConfig::from_path(path)?,
        None => SurveyConfig::default(),
    };

    if !cli.points.is_empty() {
        config.points = cli.points.iter().map(|XY(c)| [c.x, c.y]).collect();
    }
    if config.points.is_empty() {
        config.points = DEFAULT_SURVEY.to_vec();
    }
    if let Some(crs) = cli.source_crs {
        config.source_crs = crs;
    }
    if let Some(offset) = cli.offset {
        config.offset_distance = offset;
    }
    if let Some(step) = cli.step {
        config.elevation_step = step;
    }
    if cli.skip_invalid {
        config.invalid_points = ErrorPolicy::Skip;
        config.degenerate_segments = ErrorPolicy::Skip;
    }

    if cli.elevation || cli.elevation_url.is_some() {
        config.elevation.get_or_insert_with(ElevationConfig::default);
    }
    if let Some(elevation) = config.elevation.as_mut() {
        if let Some(url) = &cli.elevation_url {
            elevation.url = url.clone();
        }
        if let Some(workers) = cli.workers {
            elevation.workers = workers;
        }
        if let Some(timeout) = cli.timeout {
            elevation.timeout_secs = timeout;
        }
    }

    config.validate()?;
    Ok(config)
}

fn run(config: &SurveyConfig) -> Result<Survey, AnyError> {
    let builder = config.builder();
    let Some((source, workers)) = config
        .elevation_source()?
        .zip(config.elevation.as_ref().map(|e| e.workers))
    else {
        return Ok(builder.build(None)?);
    };

    let pb = progress::bar("Elevation".to_owned(), lookup_count(&config.points))?;
    let lookup = ElevationLookup::new(Box::new(Tracked::new(source, pb.clone())), workers)?;
    let survey = builder.build(Some(&lookup));
    pb.finish_and_clear();
    Ok(survey?)
}

/// Number of elevation requests a survey of `points` makes, since
/// repeated points are looked up once.
fn lookup_count(points: &[[f64; 2]]) -> u64 {
    let unique: HashSet<[u64; 2]> = points
        .iter()
        .map(|[x, y]| [x.to_bits(), y.to_bits()])
        .collect();
    unique.len() as u64
}

#[cfg(test)]
mod tests {
    use super::{lookup_count, survey_config, Cli, ErrorPolicy, DEFAULT_SURVEY};
    use clap::Parser;
    use std::io::Write;

    fn parse(args: &[&str]) -> Result<survey::SurveyConfig, anyhow::Error> {
        let cli = Cli::parse_from(["roadmap"].iter().chain(args).chain(&["json"]));
        survey_config(&cli)
    }

    #[test]
    fn test_default_survey() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.points, DEFAULT_SURVEY.to_vec());
        assert_eq!(config.source_crs.to_string(), "EPSG:32651");
        assert_eq!(config.elevation, None);
    }

    #[test]
    fn test_lookup_count() {
        // The default survey is a closed loop.
        assert_eq!(lookup_count(&DEFAULT_SURVEY), 13);
        assert_eq!(lookup_count(&[]), 0);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "-p",
            "486261.21,1087959.9",
            "-p",
            "485907.87,1088478.4",
            "--offset",
            "4",
            "--step",
            "10",
            "--elevation",
            "--workers",
            "2",
            "--skip-invalid",
        ])
        .unwrap();
        assert_eq!(config.points.len(), 2);
        assert_eq!(config.offset_distance, 4.0);
        assert_eq!(config.elevation_step, 10.0);
        assert_eq!(config.invalid_points, ErrorPolicy::Skip);
        assert_eq!(config.degenerate_segments, ErrorPolicy::Skip);
        let elevation = config.elevation.unwrap();
        assert_eq!(elevation.workers, 2);
        assert_eq!(elevation.timeout_secs, 10);
    }

    #[test]
    fn test_workers_alone_do_not_enable_elevation() {
        let config = parse(&["--workers", "8"]).unwrap();
        assert_eq!(config.elevation, None);
    }

    #[test]
    fn test_config_file_and_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "points": [[122.8747, 9.8421], [122.8715, 9.8468]],
                "source_crs": "EPSG:4326",
                "elevation": {{ "url": "http://localhost:8080/api/v1/lookup" }}
            }}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = parse(&["--config", path, "--timeout", "3"]).unwrap();
        assert!(config.source_crs.is_geographic());
        assert_eq!(config.points[0], [122.8747, 9.8421]);
        let elevation = config.elevation.unwrap();
        assert_eq!(elevation.url, "http://localhost:8080/api/v1/lookup");
        assert_eq!(elevation.timeout_secs, 3);

        assert!(parse(&["--config", path, "--offset", "0"]).is_err());
    }
}
