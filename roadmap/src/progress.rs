use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use survey::{geo::geometry::Coord, ElevationError, ElevationSource};

pub fn bar(header: String, length: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::with_draw_target(Some(length), ProgressDrawTarget::stderr_with_hz(4));
    pb.set_prefix(header);
    pb.set_style(
        ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Advances a progress bar on every lookup made by the wrapped source.
pub struct Tracked<S> {
    source: S,
    pb: ProgressBar,
}

impl<S> Tracked<S> {
    pub fn new(source: S, pb: ProgressBar) -> Self {
        Self { source, pb }
    }
}

impl<S: ElevationSource> ElevationSource for Tracked<S> {
    fn elevation(&self, coord: Coord<f64>) -> Result<f64, ElevationError> {
        let elevation = self.source.elevation(coord);
        self.pb.inc(1);
        elevation
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, ElevationError, ElevationSource, ProgressBar, Tracked};

    struct Flat;

    impl ElevationSource for Flat {
        fn elevation(&self, _coord: Coord<f64>) -> Result<f64, ElevationError> {
            Ok(12.0)
        }
    }

    #[test]
    fn test_tracked_counts_lookups() {
        let pb = ProgressBar::hidden();
        let tracked = Tracked::new(Flat, pb.clone());
        for _ in 0..3 {
            assert_eq!(tracked.elevation(Coord { x: 0.0, y: 0.0 }).unwrap(), 12.0);
        }
        assert_eq!(pb.position(), 3);
    }
}
