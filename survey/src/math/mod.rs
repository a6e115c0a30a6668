mod dms;
mod offset;

pub use {
    dms::{format_dms, Axis, Dms},
    offset::{offset_segment, offset_segments, OffsetPair},
};
