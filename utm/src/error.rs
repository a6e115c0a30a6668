use crate::{Crs, C};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtmError {
    #[error("coordinate ({x}, {y}) is outside the valid domain of {crs}")]
    InvalidCoordinate { x: C, y: C, crs: Crs },

    #[error("invalid CRS identifier {0:?}, expected \"EPSG:<code>\"")]
    InvalidCrs(String),

    #[error("unsupported CRS EPSG:{0}")]
    Unsupported(u32),

    #[error("invalid UTM zone {0}")]
    Zone(u8),

    #[error("projection failed, {0}")]
    Proj(String),
}
