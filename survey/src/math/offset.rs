use crate::SurveyError;
use geo::{
    geometry::{Coord, Line},
    CoordFloat,
};
use itertools::Itertools;
use serde::Serialize;

/// Lines parallel to one segment, displaced to either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OffsetPair<T: CoordFloat = f64> {
    /// Offset to the left when walking from start to end.
    pub left: Line<T>,

    /// Offset to the right when walking from start to end.
    pub right: Line<T>,
}

impl<T: CoordFloat> OffsetPair<T> {
    /// Applies a fallible coordinate transform to all four endpoints.
    pub fn try_map_coords<E, F>(&self, f: F) -> Result<Self, E>
    where
        F: Fn(Coord<T>) -> Result<Coord<T>, E>,
    {
        Ok(Self {
            left: Line::new(f(self.left.start)?, f(self.left.end)?),
            right: Line::new(f(self.right.start)?, f(self.right.end)?),
        })
    }
}

/// Returns the left and right offsets of the segment `start -> end`,
/// each `distance` away from it.
///
/// A zero length segment has no perpendicular and is reported as
/// [`SurveyError::DegenerateSegment`] with index 0.
pub fn offset_segment<T: CoordFloat>(
    start: Coord<T>,
    end: Coord<T>,
    distance: T,
) -> Result<OffsetPair<T>, SurveyError> {
    check_distance(distance)?;
    offset(start, end, distance).ok_or(SurveyError::DegenerateSegment { index: 0 })
}

/// Returns one [`OffsetPair`] for every consecutive pair of `points`.
pub fn offset_segments<T: CoordFloat>(
    points: &[Coord<T>],
    distance: T,
) -> Result<Vec<OffsetPair<T>>, SurveyError> {
    check_distance(distance)?;
    if points.len() < 2 {
        return Err(SurveyError::Config(format!(
            "offsets need at least 2 points, got {}",
            points.len()
        )));
    }
    points
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(index, (start, end))| {
            offset(*start, *end, distance).ok_or(SurveyError::DegenerateSegment { index })
        })
        .collect()
}

fn offset<T: CoordFloat>(start: Coord<T>, end: Coord<T>, distance: T) -> Option<OffsetPair<T>> {
    let delta = end - start;
    let length = delta.x.hypot(delta.y);
    if length.is_zero() || !length.is_finite() {
        return None;
    }
    let normal = Coord {
        x: -delta.y / length,
        y: delta.x / length,
    };
    let shift = normal * distance;
    Some(OffsetPair {
        left: Line::new(start + shift, end + shift),
        right: Line::new(start - shift, end - shift),
    })
}

fn check_distance<T: CoordFloat>(distance: T) -> Result<(), SurveyError> {
    if distance > T::zero() && distance.is_finite() {
        Ok(())
    } else {
        Err(SurveyError::Config(
            "offset distance must be positive and finite".to_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{offset_segment, offset_segments, Coord, Line, SurveyError};
    use approx::assert_abs_diff_eq;
    use geo::{EuclideanDistance, Point};

    /// Perpendicular distance from `point` to the infinite line through
    /// `line`.
    fn line_distance(point: Coord, line: Line) -> f64 {
        let d = line.delta();
        let p = point - line.start;
        (d.x * p.y - d.y * p.x).abs() / d.x.hypot(d.y)
    }

    fn cross(a: Line, b: Line) -> f64 {
        let (a, b) = (a.delta(), b.delta());
        a.x * b.y - a.y * b.x
    }

    #[test]
    fn test_axis_aligned() {
        let pair = offset_segment(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }, 2.0).unwrap();
        assert_eq!(
            pair.left,
            Line::new(Coord { x: 0.0, y: 2.0 }, Coord { x: 10.0, y: 2.0 })
        );
        assert_eq!(
            pair.right,
            Line::new(Coord { x: 0.0, y: -2.0 }, Coord { x: 10.0, y: -2.0 })
        );
    }

    #[test]
    fn test_survey_centerline() {
        let points = [
            Coord {
                x: 486_261.21,
                y: 1_087_959.9,
            },
            Coord {
                x: 485_907.87,
                y: 1_088_478.4,
            },
        ];
        let offsets = offset_segments(&points, 3.0).unwrap();
        assert_eq!(offsets.len(), 1);

        let centerline = Line::new(points[0], points[1]);
        let pair = offsets[0];
        for side in [pair.left, pair.right] {
            for coord in [side.start, side.end] {
                assert_abs_diff_eq!(line_distance(coord, centerline), 3.0, epsilon = 1e-6);
                assert_abs_diff_eq!(
                    Point::from(coord).euclidean_distance(&centerline),
                    3.0,
                    epsilon = 1e-6
                );
            }
            assert_abs_diff_eq!(
                cross(side, centerline) / centerline.delta().x.hypot(centerline.delta().y),
                0.0,
                epsilon = 1e-6
            );
        }

        // Left and right are on opposite sides.
        let side_of = |coord: Coord| {
            let d = centerline.delta();
            let p = coord - centerline.start;
            (d.x * p.y - d.y * p.x).signum()
        };
        assert_eq!(side_of(pair.left.start), 1.0);
        assert_eq!(side_of(pair.right.start), -1.0);
        assert_abs_diff_eq!(
            Point::from(pair.left.start).euclidean_distance(&Point::from(pair.right.start)),
            6.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_degenerate_segment() {
        let p = Coord {
            x: 486_261.21,
            y: 1_087_959.9,
        };
        assert!(matches!(
            offset_segment(p, p, 3.0),
            Err(SurveyError::DegenerateSegment { index: 0 })
        ));

        let points = [p, Coord { x: p.x + 1.0, y: p.y }, Coord { x: p.x + 1.0, y: p.y }];
        assert!(matches!(
            offset_segments(&points, 3.0),
            Err(SurveyError::DegenerateSegment { index: 1 })
        ));
    }

    #[test]
    fn test_invalid_input() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 1.0, y: 1.0 };
        assert!(matches!(
            offset_segment(a, b, 0.0),
            Err(SurveyError::Config(_))
        ));
        assert!(matches!(
            offset_segment(a, b, -3.0),
            Err(SurveyError::Config(_))
        ));
        assert!(matches!(
            offset_segments(&[a], 3.0),
            Err(SurveyError::Config(_))
        ));
    }

    #[test]
    fn test_polyline() {
        let points = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 5.0 },
            Coord { x: 5.0, y: 5.0 },
        ];
        let offsets = offset_segments(&points, 1.0).unwrap();
        assert_eq!(offsets.len(), 2);
        // Heading north, left is west.
        assert_eq!(offsets[0].left.start, Coord { x: -1.0, y: 0.0 });
        // Heading east, left is north.
        assert_eq!(offsets[1].left.end, Coord { x: 5.0, y: 6.0 });
        assert_eq!(offsets[1].right.end, Coord { x: 5.0, y: 4.0 });
    }

    #[test]
    fn test_f32() {
        let pair = offset_segment(
            Coord::<f32> { x: 0.0, y: 0.0 },
            Coord { x: 0.0, y: 4.0 },
            0.5,
        )
        .unwrap();
        assert_eq!(pair.left.start, Coord { x: -0.5, y: 0.0 });
    }
}
