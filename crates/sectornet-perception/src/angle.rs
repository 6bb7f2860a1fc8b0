//! Compass-angle helpers.
//!
//! All angles are in degrees using the marine convention: 0° points north
//! (+y) and angles increase clockwise, so 90° points east (+x).  Every
//! bearing and heading in the workspace goes through these functions rather
//! than inline trigonometry.
//!
//! # Example
//!
//! ```rust
//! use sectornet_perception::angle::{delta_heading, rel_angle};
//!
//! // Due east of the origin.
//! assert!((rel_angle(0.0, 0.0, 1.0, 0.0) - 90.0).abs() < 1e-9);
//!
//! // Turning from 10° to 0° is a 10° turn to port.
//! assert!((delta_heading(10.0, 360.0) + 10.0).abs() < 1e-9);
//! ```

use sectornet_types::Point2;

/// Wrap `deg` into `[0, 360)`.
pub fn angle360(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Bearing from `(x0, y0)` to `(x1, y1)` in `[0, 360)`.
///
/// A coincident pair has bearing 0°, i.e. straight ahead of a north-facing
/// observer.
pub fn rel_angle(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    angle360(dx.atan2(dy).to_degrees())
}

/// Signed minimal rotation from `heading1` to `heading2`, in `[-180, 180]`.
///
/// Positive values are clockwise turns.  Computed from the cross and dot
/// products of the two unit heading vectors; when the cross product is
/// non-negative the result is reported as negative, which settles exact
/// reversals toward -180°.
pub fn delta_heading(heading1: f64, heading2: f64) -> f64 {
    let (a1, a2) = (heading1.to_radians().sin(), heading1.to_radians().cos());
    let (b1, b2) = (heading2.to_radians().sin(), heading2.to_radians().cos());

    let cross = a1 * b2 - a2 * b1;
    let dot = (a1 * b1 + a2 * b2).clamp(-1.0, 1.0);

    let magnitude = dot.acos().to_degrees();
    if cross >= 0.0 { -magnitude } else { magnitude }
}

/// Centre angle of sector `sector_id` out of `num_sectors`.
pub fn sector_to_angle(num_sectors: usize, sector_id: usize) -> f64 {
    360.0 / num_sectors as f64 * sector_id as f64
}

/// Vector of length `density` pointing at the centre of a sector, in the
/// observer's body frame (+y ahead, +x to starboard).
pub fn reading_to_xy(num_sectors: usize, sector_id: usize, density: f64) -> Point2 {
    let theta = sector_to_angle(num_sectors, sector_id).to_radians();
    Point2::new(density * theta.sin(), density * theta.cos())
}

pub fn sum_xy(points: &[Point2]) -> Point2 {
    points
        .iter()
        .fold(Point2::new(0.0, 0.0), |acc, p| Point2::new(acc.x + p.x, acc.y + p.y))
}

/// Centroid of `points`; the origin when `points` is empty.
pub fn average_xy(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::new(0.0, 0.0);
    }
    let sum = sum_xy(points);
    let n = points.len() as f64;
    Point2::new(sum.x / n, sum.y / n)
}

/// Bearing from the origin to `point`.
pub fn xy_to_rel_angle(point: Point2) -> f64 {
    rel_angle(0.0, 0.0, point.x, point.y)
}
