//! Centre-of-mass follower.
//!
//! A hand-written baseline controller: every sector reading is treated as a
//! vector pointing at its sector centre with the reading as length, and the
//! vehicle steers toward the bearing of their sum.  No training required,
//! which makes it a useful sanity check next to the network controller.

use sectornet_perception::angle::{reading_to_xy, sum_xy, xy_to_rel_angle};
use sectornet_types::Point2;

/// Resultant length, relative to the summed reading magnitude, below which
/// the readings are considered balanced.
const BALANCE_EPSILON: f64 = 1e-9;

/// Signed heading change (degrees, `(-180, 180]`) toward the centre of mass
/// of `readings`.
///
/// Returns `None` for an empty slice.  All-zero or perfectly balanced
/// readings have no preferred direction and yield `0.0`, i.e. hold the
/// current heading.
pub fn center_of_mass_heading(readings: &[f64]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    let n = readings.len();
    let vectors: Vec<Point2> = readings
        .iter()
        .enumerate()
        .map(|(i, &r)| reading_to_xy(n, i, r))
        .collect();

    let sum = sum_xy(&vectors);
    let total: f64 = readings.iter().map(|r| r.abs()).sum();
    if sum.x.hypot(sum.y) <= BALANCE_EPSILON * total {
        return Some(0.0);
    }

    let bearing = xy_to_rel_angle(sum);
    Some(if bearing > 180.0 { bearing - 360.0 } else { bearing })
}
