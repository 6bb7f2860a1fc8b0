//! Sector Sensor.
//!
//! Encodes a snapshot of nearby point entities as a fixed-length,
//! orientation-relative vector suitable as neural-network input.  The space
//! around the observer is split into `sector_count` equal angular slices,
//! with sector 0 centred on straight ahead and indices increasing clockwise.
//!
//! Each entity inside the sensing radius contributes a linear ramp signal to
//! its sector:
//! ```text
//! signal(d) = 1                                     d <= saturation_radius
//!           = 1 - (d - sat) / (sense - sat)         sat < d <= sense
//! ```
//! Signals in one sector add up, so a crowded sector can exceed 1.0 before
//! normalization.
//!
//! # Example
//!
//! ```rust
//! use sectornet_perception::sector_sensor::{NormalizationRule, SectorSensor};
//! use sectornet_types::{Point2, Pose};
//!
//! let sensor = SectorSensor::new(10.0, 1.0, 4, NormalizationRule::None).unwrap();
//! let entities = [Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)];
//!
//! let readings = sensor.query(&entities, Pose::new(0.0, 0.0, 0.0));
//! assert_eq!(readings, vec![1.0, 1.0, 0.0, 0.0]);
//! ```

use sectornet_types::{ConfigError, Point2, Pose};
use tracing::{debug, warn};

use crate::angle::{angle360, delta_heading, rel_angle};

/// Distances of the entities that fell into one sector during one query.
pub type Bucket = Vec<f64>;
/// One [`Bucket`] per sector, indexed by sector number.
pub type Buckets = Vec<Bucket>;

// ────────────────────────────────────────────────────────────────────────────
// NormalizationRule
// ────────────────────────────────────────────────────────────────────────────

/// How per-sector readings are scaled after composition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NormalizationRule {
    /// Readings pass through unchanged.
    #[default]
    None,
    /// Every reading is divided by the given constant.
    Fixed(f64),
    /// Every reading is divided by the number of entities sensed in the
    /// query (across all sectors).  No division when nothing was sensed.
    Dynamic,
}

impl NormalizationRule {
    /// Resolve a rule from its configuration spelling (`"none"`, `"fixed"`,
    /// `"dynamic"`, case-insensitive).
    ///
    /// An unrecognized name is not fatal: it is reported with `warn!` and
    /// the sensor runs unnormalized.
    pub fn from_name(name: &str, fixed_divisor: f64) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "" => NormalizationRule::None,
            "fixed" => NormalizationRule::Fixed(fixed_divisor),
            "dynamic" => NormalizationRule::Dynamic,
            other => {
                warn!(
                    rule = %other,
                    "unrecognized normalization rule; readings will not be normalized"
                );
                NormalizationRule::None
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sector assignment
// ────────────────────────────────────────────────────────────────────────────

/// Map a delta heading (degrees, any range) onto a sector index in
/// `0..sector_count`.
///
/// The angle is shifted by half a sector so that sector 0 straddles straight
/// ahead.  The shift can push angles just left of ahead up to
/// `sector_count`; those wrap back to sector 0.
///
/// `sector_count` must be non-zero.
pub fn sector_index(delta_deg: f64, sector_count: usize) -> usize {
    let width = 360.0 / sector_count as f64;
    let shifted = angle360(delta_deg) + width / 2.0;
    let index = (shifted / width).floor() as usize;
    if index >= sector_count { 0 } else { index }
}

// ────────────────────────────────────────────────────────────────────────────
// SectorSensor
// ────────────────────────────────────────────────────────────────────────────

/// Largest accepted sector count: a 0.01° angular resolution.
pub const MAX_SECTORS: usize = 36_000;

/// Radial bucketed distance encoder.
///
/// Configuration is fixed at construction and queries carry no state from
/// one call to the next, so a shared instance can be queried from several
/// threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorSensor {
    sensing_radius: f64,
    saturation_radius: f64,
    sector_count: usize,
    normalization: NormalizationRule,
}

impl SectorSensor {
    /// Create a sensor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Sensor`] when `sensing_radius` is not a
    /// positive finite number, `saturation_radius` lies outside
    /// `[0, sensing_radius)`, `sector_count` is zero or above
    /// [`MAX_SECTORS`], or a [`NormalizationRule::Fixed`] divisor is not a positive finite number.
    pub fn new(
        sensing_radius: f64,
        saturation_radius: f64,
        sector_count: usize,
        normalization: NormalizationRule,
    ) -> Result<Self, ConfigError> {
        if !(sensing_radius.is_finite() && sensing_radius > 0.0) {
            return Err(ConfigError::Sensor(format!(
                "sensing radius must be positive, got {sensing_radius}"
            )));
        }
        if !(saturation_radius >= 0.0 && saturation_radius < sensing_radius) {
            return Err(ConfigError::Sensor(format!(
                "saturation radius must lie in [0, {sensing_radius}), got {saturation_radius}"
            )));
        }
        if !(1..=MAX_SECTORS).contains(&sector_count) {
            return Err(ConfigError::Sensor(format!(
                "sector count must lie in [1, {MAX_SECTORS}], got {sector_count}"
            )));
        }
        if let NormalizationRule::Fixed(divisor) = normalization
            && !(divisor.is_finite() && divisor > 0.0)
        {
            return Err(ConfigError::Sensor(format!(
                "fixed normalization divisor must be positive, got {divisor}"
            )));
        }

        Ok(Self {
            sensing_radius,
            saturation_radius,
            sector_count,
            normalization,
        })
    }

    pub fn sensing_radius(&self) -> f64 {
        self.sensing_radius
    }

    pub fn saturation_radius(&self) -> f64 {
        self.saturation_radius
    }

    /// Number of sectors, which is also the length of every reading vector.
    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    /// Angular width of one sector in degrees.
    pub fn sector_width(&self) -> f64 {
        360.0 / self.sector_count as f64
    }

    pub fn normalization(&self) -> NormalizationRule {
        self.normalization
    }

    /// Encode `entities` as seen from `pose`.  The result always has
    /// [`sector_count`][Self::sector_count] elements.
    pub fn query(&self, entities: &[Point2], pose: Pose) -> Vec<f64> {
        let buckets = self.fill_buckets(entities, pose);
        let readings = self.buckets_to_readings(&buckets);
        debug!(
            entities = entities.len(),
            sensed = buckets.iter().map(Vec::len).sum::<usize>(),
            ?readings,
            "sector sensor query"
        );
        readings
    }

    /// Sort the distances of every visible entity into per-sector buckets.
    ///
    /// Entities beyond the sensing radius are dropped and do not count
    /// toward dynamic normalization.
    pub fn fill_buckets(&self, entities: &[Point2], pose: Pose) -> Buckets {
        let origin = pose.position();
        let mut buckets: Buckets = vec![Vec::new(); self.sector_count];

        for entity in entities {
            let dist = origin.distance_to(entity);
            if !dist.is_finite() {
                warn!(x = entity.x, y = entity.y, "skipping entity with non-finite position");
                continue;
            }
            if dist > self.sensing_radius {
                continue;
            }

            let bearing = rel_angle(pose.x, pose.y, entity.x, entity.y);
            let delta = delta_heading(pose.heading_deg, bearing);
            buckets[sector_index(delta, self.sector_count)].push(dist);
        }

        buckets
    }

    /// Compose and normalize one reading per bucket.
    ///
    /// Accepts any number of buckets; the output has one entry per input
    /// bucket.
    pub fn buckets_to_readings(&self, buckets: &[Bucket]) -> Vec<f64> {
        let mut readings: Vec<f64> = buckets.iter().map(|b| self.compose_reading(b)).collect();

        match self.normalization {
            NormalizationRule::None => {}
            NormalizationRule::Fixed(divisor) => {
                readings.iter_mut().for_each(|r| *r /= divisor);
            }
            NormalizationRule::Dynamic => {
                let total: usize = buckets.iter().map(Vec::len).sum();
                if total > 0 {
                    let total = total as f64;
                    readings.iter_mut().for_each(|r| *r /= total);
                }
            }
        }

        readings
    }

    /// Sum the ramp signal of every distance in `bucket`.
    ///
    /// A distance beyond the sensing radius should have been filtered out by
    /// [`fill_buckets`][Self::fill_buckets]; if one shows up anyway it
    /// contributes nothing and a warning is logged.
    pub fn compose_reading(&self, bucket: &[f64]) -> f64 {
        bucket.iter().map(|&d| self.signal(d)).sum()
    }

    fn signal(&self, dist: f64) -> f64 {
        if dist > self.sensing_radius {
            warn!(
                distance = dist,
                sensing_radius = self.sensing_radius,
                "distance beyond sensing radius reached reading composition; ignoring it"
            );
            return 0.0;
        }
        if dist <= self.saturation_radius {
            return 1.0;
        }
        1.0 - (dist - self.saturation_radius) / (self.sensing_radius - self.saturation_radius)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(sectors: usize, rule: NormalizationRule) -> SectorSensor {
        SectorSensor::new(10.0, 1.0, sectors, rule).unwrap()
    }

    fn cross_entities() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, -1.0),
        ]
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn rejects_invalid_geometry() {
        assert!(SectorSensor::new(0.0, 0.0, 4, NormalizationRule::None).is_err());
        assert!(SectorSensor::new(10.0, 10.0, 4, NormalizationRule::None).is_err());
        assert!(SectorSensor::new(10.0, -1.0, 4, NormalizationRule::None).is_err());
        assert!(SectorSensor::new(10.0, 1.0, 0, NormalizationRule::None).is_err());
        assert!(SectorSensor::new(f64::NAN, 1.0, 4, NormalizationRule::None).is_err());
    }

    #[test]
    fn rejects_sector_count_beyond_limit() {
        let err = SectorSensor::new(10.0, 1.0, usize::MAX / 8, NormalizationRule::None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Sensor(_)));
        assert!(SectorSensor::new(10.0, 1.0, MAX_SECTORS + 1, NormalizationRule::None).is_err());

        let sensor = SectorSensor::new(10.0, 1.0, MAX_SECTORS, NormalizationRule::None).unwrap();
        let readings = sensor.query(&[Point2::new(0.0, 5.0)], Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings.len(), MAX_SECTORS);
        assert!(readings[0] > 0.0);
    }

    #[test]
    fn rejects_non_positive_fixed_divisor() {
        let err = SectorSensor::new(10.0, 1.0, 4, NormalizationRule::Fixed(0.0)).unwrap_err();
        assert!(matches!(err, ConfigError::Sensor(_)));
        assert!(SectorSensor::new(10.0, 1.0, 4, NormalizationRule::Fixed(-2.0)).is_err());
    }

    #[test]
    fn zero_saturation_radius_is_allowed() {
        let s = SectorSensor::new(10.0, 0.0, 4, NormalizationRule::None).unwrap();
        assert!(close(s.compose_reading(&[5.0]), 0.5, 1e-12));
    }

    #[test]
    fn rule_from_name() {
        assert_eq!(NormalizationRule::from_name("none", 3.0), NormalizationRule::None);
        assert_eq!(NormalizationRule::from_name("FIXED", 3.0), NormalizationRule::Fixed(3.0));
        assert_eq!(NormalizationRule::from_name(" dynamic ", 3.0), NormalizationRule::Dynamic);
        // Unknown rules fall back to no normalization instead of failing.
        assert_eq!(NormalizationRule::from_name("softmax", 3.0), NormalizationRule::None);
    }

    // ── compose_reading ───────────────────────────────────────────────────

    #[test]
    fn compose_reading_one_entity() {
        let s = sensor(4, NormalizationRule::None);
        assert_eq!(s.compose_reading(&[1.0]), 1.0);
        assert!(close(s.compose_reading(&[2.0]), 0.888889, 1e-5));
        assert!(close(s.compose_reading(&[5.0]), 0.555556, 1e-5));
        assert_eq!(s.compose_reading(&[10.0]), 0.0);
        // Out of range: ignored rather than negative.
        assert_eq!(s.compose_reading(&[12.0]), 0.0);
    }

    #[test]
    fn compose_reading_saturates_inside_saturation_radius() {
        let s = sensor(4, NormalizationRule::None);
        assert_eq!(s.compose_reading(&[0.0]), 1.0);
        assert_eq!(s.compose_reading(&[0.5]), 1.0);
    }

    #[test]
    fn compose_reading_is_additive() {
        let s = sensor(4, NormalizationRule::None);
        assert_eq!(s.compose_reading(&[1.0, 1.0, 1.0]), 3.0);
        assert!(close(s.compose_reading(&[1.0, 2.0, 3.0]), 2.666667, 1e-5));
        assert_eq!(s.compose_reading(&[]), 0.0);
    }

    // ── buckets_to_readings ───────────────────────────────────────────────

    #[test]
    fn buckets_to_readings_keeps_bucket_count() {
        let s = sensor(4, NormalizationRule::None);
        let buckets: Buckets = vec![
            vec![1.0, 5.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![9.0, 9.0, 1.0],
            vec![1000.0],
            vec![],
        ];
        let readings = s.buckets_to_readings(&buckets);
        assert_eq!(readings.len(), 5);
        assert!(close(readings[0], 1.55556, 1e-5));
        assert_eq!(readings[1], 4.0);
        assert!(close(readings[2], 1.22222, 1e-5));
        assert_eq!(readings[3], 0.0);
        assert_eq!(readings[4], 0.0);
    }

    #[test]
    fn dynamic_normalization_divides_by_total_count() {
        let s = sensor(4, NormalizationRule::Dynamic);
        let buckets: Buckets = vec![vec![1.0, 1.0], vec![1.0], vec![1.0], vec![]];
        assert_eq!(s.buckets_to_readings(&buckets), vec![0.5, 0.25, 0.25, 0.0]);
    }

    #[test]
    fn fixed_normalization_divides_by_constant() {
        let s = sensor(4, NormalizationRule::Fixed(10.0));
        let buckets: Buckets = vec![vec![1.0, 1.0], vec![1.0], vec![1.0], vec![]];
        let readings = s.buckets_to_readings(&buckets);
        for (got, want) in readings.iter().zip([0.2, 0.1, 0.1, 0.0]) {
            assert!(close(*got, want, 1e-12));
        }
    }

    // ── sector_index ──────────────────────────────────────────────────────

    #[test]
    fn sector_index_centres_sector_zero_on_ahead() {
        assert_eq!(sector_index(0.0, 4), 0);
        assert_eq!(sector_index(-0.0, 4), 0);
        assert_eq!(sector_index(44.9, 4), 0);
        assert_eq!(sector_index(45.0, 4), 1);
        assert_eq!(sector_index(90.0, 4), 1);
        assert_eq!(sector_index(180.0, 4), 2);
        assert_eq!(sector_index(-180.0, 4), 2);
        assert_eq!(sector_index(-90.0, 4), 3);
        assert_eq!(sector_index(314.9, 4), 3);
    }

    #[test]
    fn sector_index_wraps_to_zero() {
        // 315° + half a sector lands exactly on 360°, index 4, which wraps.
        assert_eq!(sector_index(315.0, 4), 0);
        assert_eq!(sector_index(-45.0, 4), 0);
        assert_eq!(sector_index(359.999, 4), 0);
        for sectors in [1, 2, 3, 4, 7, 8, 40, 360] {
            for tenth in -3600..3600 {
                assert!(sector_index(tenth as f64 / 10.0, sectors) < sectors);
            }
        }
    }

    #[test]
    fn wraparound_entity_lands_in_sector_zero() {
        let s = sensor(4, NormalizationRule::None);
        // Just left of straight ahead.
        let buckets = s.fill_buckets(&[Point2::new(-0.01, 1.0)], Pose::new(0.0, 0.0, 0.0));
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].len(), 1);
    }

    // ── fill_buckets ──────────────────────────────────────────────────────

    #[test]
    fn fill_buckets_heading_north() {
        let s = sensor(4, NormalizationRule::None);
        let buckets = s.fill_buckets(&cross_entities(), Pose::new(0.0, 0.0, 0.0));

        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1, 1, 0]);
        assert!(close(buckets[0][0], 1.0, 1e-12));
        assert!(close(buckets[0][1], 1.0, 1e-12));
        assert!(close(buckets[1][0], 1.0, 1e-12));
        assert!(close(buckets[2][0], 1.0, 1e-12));
    }

    #[test]
    fn fill_buckets_heading_east() {
        let s = sensor(4, NormalizationRule::None);
        let buckets = s.fill_buckets(&cross_entities(), Pose::new(0.0, 0.0, 90.0));

        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 1, 0, 2]);
        assert!(close(buckets[3][0], 1.0, 1e-12));
        assert!(close(buckets[3][1], 1.0, 1e-12));
    }

    #[test]
    fn fill_buckets_translated_observer() {
        let s = sensor(4, NormalizationRule::None);
        let buckets = s.fill_buckets(&cross_entities(), Pose::new(2.0, 0.0, 90.0));

        let sizes: Vec<usize> = buckets.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![0, 0, 4, 0]);
        // Insertion order is preserved.
        assert!(close(buckets[2][0], 2.23607, 1e-5));
        assert!(close(buckets[2][1], 2.23607, 1e-5));
        assert!(close(buckets[2][2], 1.0, 1e-5));
        assert!(close(buckets[2][3], 2.23607, 1e-5));
    }

    #[test]
    fn fill_buckets_drops_entities_out_of_range() {
        let s = sensor(4, NormalizationRule::None);
        let entities = [Point2::new(0.0, 10.0), Point2::new(0.0, 10.5)];
        let buckets = s.fill_buckets(&entities, Pose::new(0.0, 0.0, 0.0));
        assert_eq!(buckets[0], vec![10.0]);
        assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), 1);
    }

    #[test]
    fn fill_buckets_skips_non_finite_entities() {
        let s = sensor(4, NormalizationRule::None);
        let entities = [Point2::new(f64::NAN, 0.0), Point2::new(0.0, 2.0)];
        let buckets = s.fill_buckets(&entities, Pose::new(0.0, 0.0, 0.0));
        assert_eq!(buckets.iter().map(Vec::len).sum::<usize>(), 1);
    }

    // ── query ─────────────────────────────────────────────────────────────

    #[test]
    fn query_end_to_end() {
        let s = sensor(4, NormalizationRule::None);
        let readings = s.query(&cross_entities(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings, vec![2.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn query_with_entity_on_top_of_observer() {
        let s = sensor(4, NormalizationRule::None);
        let mut entities = cross_entities();
        entities.push(Point2::new(0.0, 0.0));
        let readings = s.query(&entities, Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings, vec![3.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn query_fixed_norm() {
        let s = sensor(4, NormalizationRule::Fixed(10.0));
        let readings = s.query(&cross_entities(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings.len(), 4);
        for (got, want) in readings.iter().zip([0.2, 0.1, 0.1, 0.0]) {
            assert!(close(*got, want, 1e-12));
        }
    }

    #[test]
    fn query_dynamic_norm_and_empty_scene() {
        let s = sensor(4, NormalizationRule::Dynamic);
        let readings = s.query(&cross_entities(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings, vec![0.5, 0.25, 0.25, 0.0]);

        let readings = s.query(&[], Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings, vec![0.0; 4]);
    }

    #[test]
    fn empty_scene_is_all_zero_for_every_rule() {
        for rule in [
            NormalizationRule::None,
            NormalizationRule::Fixed(7.0),
            NormalizationRule::Dynamic,
        ] {
            let s = sensor(6, rule);
            assert_eq!(s.query(&[], Pose::new(3.0, -4.0, 123.0)), vec![0.0; 6]);
        }
    }

    #[test]
    fn query_with_more_sectors() {
        let s = sensor(8, NormalizationRule::None);
        let readings = s.query(&cross_entities(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings, vec![2.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

        let s = sensor(40, NormalizationRule::None);
        let readings = s.query(&cross_entities(), Pose::new(0.0, 0.0, 0.0));
        assert_eq!(readings.len(), 40);
        for (i, r) in readings.iter().enumerate() {
            let want = match i {
                0 => 2.0,
                10 | 20 => 1.0,
                _ => 0.0,
            };
            assert_eq!(*r, want, "sector {i}");
        }
    }

    #[test]
    fn repeated_queries_are_bit_identical() {
        let s = sensor(8, NormalizationRule::Dynamic);
        let entities = [
            Point2::new(3.3, -1.7),
            Point2::new(-2.0, 4.1),
            Point2::new(0.2, 0.9),
        ];
        let pose = Pose::new(0.4, -0.3, 217.5);
        let first = s.query(&entities, pose);
        let second = s.query(&entities, pose);
        let first_bits: Vec<u64> = first.iter().map(|r| r.to_bits()).collect();
        let second_bits: Vec<u64> = second.iter().map(|r| r.to_bits()).collect();
        assert_eq!(first_bits, second_bits);
    }

    #[test]
    fn reading_length_always_matches_sector_count() {
        let entities: Vec<Point2> = (0..50)
            .map(|i| {
                let t = i as f64 * 0.37;
                Point2::new(12.0 * t.sin(), 12.0 * t.cos())
            })
            .collect();
        for sectors in [1, 3, 5, 16] {
            let s = sensor(sectors, NormalizationRule::Dynamic);
            for heading in [0.0, 45.0, 179.9, 359.0] {
                let readings = s.query(&entities, Pose::new(1.0, 1.0, heading));
                assert_eq!(readings.len(), sectors);
                assert!(readings.iter().all(|r| *r >= 0.0));
            }
        }
    }
}
