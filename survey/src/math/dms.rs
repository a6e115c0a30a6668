use std::fmt;

/// Which geographic axis a decimal degree value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Degrees, minutes and seconds of a single angle.
///
/// Display only; never converted back into decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
    /// One of `N`, `S`, `E` or `W`.
    pub hemisphere: char,
}

impl Dms {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(value: f64, axis: Axis) -> Self {
        let degrees = value.trunc();
        let minutes = (value - degrees).abs() * 60.0;
        let seconds = (minutes - minutes.trunc()) * 60.0;
        // Zero, including negative zero, counts as north/east.
        let hemisphere = match (axis, value >= 0.0) {
            (Axis::Latitude, true) => 'N',
            (Axis::Latitude, false) => 'S',
            (Axis::Longitude, true) => 'E',
            (Axis::Longitude, false) => 'W',
        };
        Self {
            degrees: degrees.abs() as u32,
            minutes: minutes as u32,
            seconds,
            hemisphere,
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}°{}'{:.1}\"{}",
            self.degrees, self.minutes, self.seconds, self.hemisphere
        )
    }
}

/// Formats decimal degrees as `D°M'S.s"H`.
pub fn format_dms(value: f64, axis: Axis) -> String {
    Dms::new(value, axis).to_string()
}
