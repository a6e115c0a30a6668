use crate::{UtmError, C};
use geo::geometry::Coord;
use std::{fmt, str::FromStr};

const EPSG_WGS84: u32 = 4326;
const EPSG_UTM_NORTH: u32 = 32600;
const EPSG_UTM_SOUTH: u32 = 32700;

/// Southern and northern latitude limits of the UTM system.
pub(crate) const MIN_LAT: C = -80.0;
pub(crate) const MAX_LAT: C = 84.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
}

/// A coordinate reference system identified by its EPSG code.
///
/// Coordinates are always in x/y order: longitude/latitude for
/// [`Crs::Wgs84`], easting/northing for [`Crs::Utm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Crs {
    /// Geographic WGS84 (`EPSG:4326`).
    Wgs84,

    /// WGS84 / UTM (`EPSG:326zz` north, `EPSG:327zz` south).
    Utm { zone: u8, hemisphere: Hemisphere },
}

impl Crs {
    pub fn utm(zone: u8, hemisphere: Hemisphere) -> Result<Self, UtmError> {
        if (1..=60).contains(&zone) {
            Ok(Self::Utm { zone, hemisphere })
        } else {
            Err(UtmError::Zone(zone))
        }
    }

    /// Returns the standard UTM zone containing a geographic `coord`.
    ///
    /// The Norway and Svalbard zone exceptions are not applied.
    pub fn utm_for(coord: Coord<C>) -> Result<Self, UtmError> {
        check_geographic(coord)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let zone = (((coord.x + 180.0) / 6.0).floor() as u8 + 1).min(60);
        let hemisphere = if coord.y < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        };
        Self::utm(zone, hemisphere)
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Self::Wgs84 => EPSG_WGS84,
            Self::Utm {
                zone,
                hemisphere: Hemisphere::North,
            } => EPSG_UTM_NORTH + u32::from(*zone),
            Self::Utm {
                zone,
                hemisphere: Hemisphere::South,
            } => EPSG_UTM_SOUTH + u32::from(*zone),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Wgs84)
    }

    /// Longitude of the zone's central meridian in degrees.
    pub fn central_meridian(&self) -> Option<C> {
        match self {
            Self::Wgs84 => None,
            Self::Utm { zone, .. } => Some(C::from(*zone) * 6.0 - 183.0),
        }
    }

    /// PROJ.4 definition of this CRS.
    pub(crate) fn proj_string(&self) -> String {
        match self {
            Self::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs".to_owned(),
            Self::Utm { zone, hemisphere } => {
                let south = match hemisphere {
                    Hemisphere::North => "",
                    Hemisphere::South => " +south",
                };
                format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs")
            }
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = UtmError;

    #[allow(clippy::cast_possible_truncation)]
    fn from_str(s: &str) -> Result<Self, UtmError> {
        let s = s.trim();
        let code = s
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .and_then(|_| s[5..].parse::<u32>().ok())
            .ok_or_else(|| UtmError::InvalidCrs(s.to_owned()))?;
        match code {
            EPSG_WGS84 => Ok(Self::Wgs84),
            32601..=32660 => Self::utm((code - EPSG_UTM_NORTH) as u8, Hemisphere::North),
            32701..=32760 => Self::utm((code - EPSG_UTM_SOUTH) as u8, Hemisphere::South),
            other => Err(UtmError::Unsupported(other)),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = UtmError;

    fn try_from(s: String) -> Result<Self, UtmError> {
        s.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> String {
        crs.to_string()
    }
}

/// Checks that `coord` is a longitude/latitude pair inside the UTM
/// latitude band.
pub(crate) fn check_geographic(coord: Coord<C>) -> Result<(), UtmError> {
    let valid = coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (MIN_LAT..=MAX_LAT).contains(&coord.y);
    if valid {
        Ok(())
    } else {
        Err(UtmError::InvalidCoordinate {
            x: coord.x,
            y: coord.y,
            crs: Crs::Wgs84,
        })
    }
}

/// Checks that `coord` is an easting/northing pair inside the numeric
/// range of a UTM zone.
pub(crate) fn check_projected(crs: Crs, coord: Coord<C>) -> Result<(), UtmError> {
    let valid = coord.x.is_finite()
        && coord.y.is_finite()
        && (0.0..=1_000_000.0).contains(&coord.x)
        && (0.0..=10_000_000.0).contains(&coord.y);
    if valid {
        Ok(())
    } else {
        Err(UtmError::InvalidCoordinate {
            x: coord.x,
            y: coord.y,
            crs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Crs, Hemisphere, UtmError};

    #[test]
    fn test_parse_epsg() {
        assert_eq!(
            "EPSG:32651".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 51,
                hemisphere: Hemisphere::North
            }
        );
        assert_eq!(
            " epsg:32760".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 60,
                hemisphere: Hemisphere::South
            }
        );
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!(
            "EPSG:32661".parse::<Crs>(),
            Err(UtmError::Unsupported(32661))
        );
        assert_eq!(
            "32651".parse::<Crs>(),
            Err(UtmError::InvalidCrs("32651".to_owned()))
        );
        assert!("EPSG:".parse::<Crs>().is_err());
        assert!("EPSG:abc".parse::<Crs>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for code in ["EPSG:4326", "EPSG:32601", "EPSG:32651", "EPSG:32733"] {
            let crs: Crs = code.parse().unwrap();
            assert_eq!(crs.to_string(), code);
        }
    }

    #[test]
    fn test_zone_bounds() {
        assert_eq!(Crs::utm(0, Hemisphere::North), Err(UtmError::Zone(0)));
        assert_eq!(Crs::utm(61, Hemisphere::South), Err(UtmError::Zone(61)));
        assert!(Crs::utm(60, Hemisphere::South).is_ok());
    }

    #[test]
    fn test_utm_for() {
        assert_eq!(
            Crs::utm_for(Coord {
                x: 122.877,
                y: 9.853
            })
            .unwrap()
            .epsg(),
            32651
        );
        assert_eq!(
            Crs::utm_for(Coord { x: -0.1, y: -10.0 }).unwrap().epsg(),
            32730
        );
        assert_eq!(
            Crs::utm_for(Coord { x: 180.0, y: 0.0 }).unwrap().epsg(),
            32660
        );
        assert_eq!(
            Crs::utm_for(Coord { x: -180.0, y: 0.0 }).unwrap().epsg(),
            32601
        );
        assert!(Crs::utm_for(Coord { x: 10.0, y: 85.0 }).is_err());
    }

    #[test]
    fn test_proj_string() {
        assert_eq!(
            Crs::Wgs84.proj_string(),
            "+proj=longlat +datum=WGS84 +no_defs"
        );
        let crs: Crs = "EPSG:32651".parse().unwrap();
        assert_eq!(
            crs.proj_string(),
            "+proj=utm +zone=51 +datum=WGS84 +units=m +no_defs"
        );
        let crs: Crs = "EPSG:32756".parse().unwrap();
        assert_eq!(
            crs.proj_string(),
            "+proj=utm +zone=56 +south +datum=WGS84 +units=m +no_defs"
        );
    }

    #[test]
    fn test_central_meridian() {
        let crs: Crs = "EPSG:32651".parse().unwrap();
        assert_eq!(crs.central_meridian(), Some(123.0));
        let crs: Crs = "EPSG:32601".parse().unwrap();
        assert_eq!(crs.central_meridian(), Some(-177.0));
        assert_eq!(Crs::Wgs84.central_meridian(), None);
    }
}
