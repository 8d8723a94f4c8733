//! Time-indexed store of display records
//!
//! Records are held sorted by key (stable, so rows sharing a timestamp keep
//! their source order) and `BTreeMap` maps each key to its run in the vector.
//! Every lookup hands out a borrowed slice; nothing is copied per query.

use crate::error::ParseError;
use crate::record::{DisplayRecord, RadiusScale, Record};
use crate::timefmt::TimeNormalizer;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Narrowest bucket the aggregate accepts, in seconds
pub const MIN_BUCKET_SECS: i64 = 60;
/// Widest bucket the aggregate accepts, in seconds
pub const MAX_BUCKET_SECS: i64 = 7 * 24 * 3600;

/// Viewport in degrees, already padded
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// Mean of every numeric field over one time bucket
#[derive(Debug, Clone, PartialEq)]
pub struct BucketAggregate {
    pub bucket_start: DateTime<Utc>,
    pub count: usize,
    pub mean_latitude: f64,
    pub mean_longitude: f64,
    pub mean_thickness: f64,
    pub mean_radius: f64,
}

pub struct SnapshotIndex {
    records: Vec<DisplayRecord>,
    runs: BTreeMap<i64, Range<usize>>,
    extent: BoundingBox,
    time: TimeNormalizer,
}

impl SnapshotIndex {
    /// Derive display fields and index them. `records` must be non-empty
    /// for the extent to mean anything; an empty index has a zero box.
    pub fn build(records: Vec<Record>, time: TimeNormalizer, scale: RadiusScale) -> Self {
        let mut ordered: Vec<DisplayRecord> = records
            .into_iter()
            .map(|r| DisplayRecord::derive(r, &time, scale))
            .collect();
        ordered.sort_by_key(|d| d.key);

        let mut runs: BTreeMap<i64, Range<usize>> = BTreeMap::new();
        let mut start = 0;
        for i in 1..=ordered.len() {
            if i == ordered.len() || ordered[i].key != ordered[start].key {
                runs.insert(ordered[start].key, start..i);
                start = i;
            }
        }

        let extent = raw_extent(&ordered);
        tracing::debug!(
            records = ordered.len(),
            timestamps = runs.len(),
            scale = scale.divisor(),
            "snapshot index built"
        );

        Self {
            records: ordered,
            runs,
            extent,
            time,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, ordered by time
    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    pub fn time(&self) -> &TimeNormalizer {
        &self.time
    }

    /// Distinct timestamps, ascending
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.runs.keys().copied()
    }

    pub fn first_instant(&self) -> Option<DateTime<Utc>> {
        self.runs.keys().next().map(|&k| self.time.instant_of(k))
    }

    pub fn last_instant(&self) -> Option<DateTime<Utc>> {
        self.runs.keys().next_back().map(|&k| self.time.instant_of(k))
    }

    /// Records observed at exactly this key; empty when there are none
    pub fn lookup_key(&self, key: i64) -> &[DisplayRecord] {
        match self.runs.get(&key) {
            Some(range) => &self.records[range.clone()],
            None => &[],
        }
    }

    pub fn lookup(&self, instant: DateTime<Utc>) -> &[DisplayRecord] {
        self.lookup_key(self.time.key_of(instant))
    }

    /// Records whose display label equals `label`
    pub fn lookup_label(&self, label: &str) -> Result<Vec<&DisplayRecord>, ParseError> {
        let keys = self.time.keys_for_label(label)?;
        Ok(keys
            .into_iter()
            .flat_map(|k| self.lookup_key(k).iter())
            .collect())
    }

    /// Mean position, thickness and radius per fixed-width bucket, starting
    /// at the earliest raw timestamp. Buckets without records are left out.
    pub fn bucket_aggregate(&self, width: TimeDelta) -> Vec<BucketAggregate> {
        let width_secs = clamp_bucket_secs(width.num_seconds());
        let Some(origin) = self.records.iter().map(|r| r.record.timestamp).min() else {
            return Vec::new();
        };

        let mut buckets: BTreeMap<i64, Sums> = BTreeMap::new();
        for rec in &self.records {
            let offset = (rec.record.timestamp - origin).num_seconds();
            buckets
                .entry(offset.div_euclid(width_secs))
                .or_default()
                .add(rec);
        }

        buckets
            .into_iter()
            .map(|(b, sums)| sums.finish(origin + TimeDelta::seconds(b * width_secs)))
            .collect()
    }

    /// Data extent padded by `padding` degrees on each side
    pub fn bounding_box(&self, padding: f64) -> BoundingBox {
        BoundingBox {
            min_lat: self.extent.min_lat - padding,
            max_lat: self.extent.max_lat + padding,
            min_lon: self.extent.min_lon - padding,
            max_lon: self.extent.max_lon + padding,
        }
    }

    /// Distinct mass labels in first-seen order
    pub fn mass_categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for rec in &self.records {
            if !seen.contains(&rec.mass_label.as_str()) {
                seen.push(&rec.mass_label);
            }
        }
        seen
    }
}

/// Bucket width for a length in hours, clamped to one minute .. seven days
pub fn bucket_width(hours: f64) -> TimeDelta {
    let secs = hours * 3600.0;
    let clamped = if secs.is_nan() {
        MIN_BUCKET_SECS as f64
    } else {
        secs.clamp(MIN_BUCKET_SECS as f64, MAX_BUCKET_SECS as f64)
    };
    if clamped != secs {
        tracing::warn!(hours, seconds = clamped, "bucket width out of range, clamping");
    }
    TimeDelta::seconds(clamped.round() as i64)
}

fn clamp_bucket_secs(secs: i64) -> i64 {
    if secs < MIN_BUCKET_SECS {
        tracing::warn!(seconds = secs, "bucket width below one minute, clamping");
        MIN_BUCKET_SECS
    } else if secs > MAX_BUCKET_SECS {
        tracing::warn!(seconds = secs, "bucket width above seven days, clamping");
        MAX_BUCKET_SECS
    } else {
        secs
    }
}

fn raw_extent(records: &[DisplayRecord]) -> BoundingBox {
    if records.is_empty() {
        return BoundingBox {
            min_lat: 0.0,
            max_lat: 0.0,
            min_lon: 0.0,
            max_lon: 0.0,
        };
    }
    let mut b = BoundingBox {
        min_lat: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        min_lon: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
    };
    for r in records {
        b.min_lat = b.min_lat.min(r.latitude());
        b.max_lat = b.max_lat.max(r.latitude());
        b.min_lon = b.min_lon.min(r.longitude());
        b.max_lon = b.max_lon.max(r.longitude());
    }
    b
}

#[derive(Default)]
struct Sums {
    count: usize,
    latitude: f64,
    longitude: f64,
    thickness: f64,
    radius: f64,
}

impl Sums {
    fn add(&mut self, rec: &DisplayRecord) {
        self.count += 1;
        self.latitude += rec.record.latitude;
        self.longitude += rec.record.longitude;
        self.thickness += rec.record.thickness;
        self.radius += rec.record.radius;
    }

    fn finish(self, bucket_start: DateTime<Utc>) -> BucketAggregate {
        let n = self.count as f64;
        BucketAggregate {
            bucket_start,
            count: self.count,
            mean_latitude: self.latitude / n,
            mean_longitude: self.longitude / n,
            mean_thickness: self.thickness / n,
            mean_radius: self.radius / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample;
    use approx::assert_abs_diff_eq;

    fn index(records: Vec<Record>) -> SnapshotIndex {
        SnapshotIndex::build(records, TimeNormalizer::default(), RadiusScale::new(15_000.0))
    }

    /// Three blobs at local midnight, one two hours later
    fn scenario() -> SnapshotIndex {
        index(vec![
            sample("2018-11-30T03:30:00Z", 46.80, -48.10),
            sample("2018-11-30T03:30:00Z", 46.81, -48.11),
            sample("2018-11-30T03:30:00Z", 46.82, -48.12),
            sample("2018-11-30T05:30:00Z", 46.90, -48.20),
        ])
    }

    #[test]
    fn label_lookup_returns_every_blob_at_that_time() {
        let idx = scenario();
        let hits = idx.lookup_label("2018-11-30 00:00").unwrap();
        assert_eq!(hits.len(), 3);
        let lats: Vec<f64> = hits.iter().map(|r| r.latitude()).collect();
        assert_eq!(lats, vec![46.80, 46.81, 46.82]);

        assert!(idx.lookup_label("2018-11-30 01:00").unwrap().is_empty());
        assert_eq!(idx.lookup_label("2018-11-30 02:00").unwrap().len(), 1);
        assert!(idx.lookup_label("midnight").is_err());
    }

    #[test]
    fn lookup_matches_display_time_exactly() {
        let idx = scenario();
        for key in idx.keys().collect::<Vec<_>>() {
            let label = idx.time().label_for_key(key);
            let hits = idx.lookup_key(key);
            let expected = idx.records().iter().filter(|r| r.display_time == label).count();
            assert_eq!(hits.len(), expected);
            assert!(hits.iter().all(|r| r.display_time == label));
        }
        let start = idx.first_instant().unwrap();
        assert!(idx.lookup(start + TimeDelta::minutes(1)).is_empty());
    }

    #[test]
    fn instant_lookup_truncates_to_granularity() {
        let idx = scenario();
        let start = idx.first_instant().unwrap();
        assert_eq!(idx.lookup(start + TimeDelta::seconds(59)).len(), 3);
    }

    #[test]
    fn build_sorts_but_keeps_ties_in_source_order() {
        let idx = index(vec![
            sample("2018-11-30T05:30:00Z", 1.0, 1.0),
            sample("2018-11-30T03:30:00Z", 2.0, 2.0),
            sample("2018-11-30T03:30:00Z", 3.0, 3.0),
        ]);
        let lats: Vec<f64> = idx.records().iter().map(|r| r.latitude()).collect();
        assert_eq!(lats, vec![2.0, 3.0, 1.0]);
        assert_eq!(idx.keys().count(), 2);
    }

    #[test]
    fn bounding_box_is_padded_exactly() {
        let idx = scenario();
        let b = idx.bounding_box(0.02);
        assert_eq!(b.min_lat, 46.80 - 0.02);
        assert_eq!(b.max_lat, 46.90 + 0.02);
        assert_eq!(b.min_lon, -48.20 - 0.02);
        assert_eq!(b.max_lon, -48.10 + 0.02);
    }

    #[test]
    fn buckets_match_brute_force() {
        let mut records = Vec::new();
        let times = [
            "2018-11-30T03:30:00Z",
            "2018-11-30T03:45:00Z",
            "2018-11-30T05:29:59Z",
            "2018-11-30T05:30:00Z",
            "2018-11-30T09:31:00Z",
            "2018-11-30T10:00:00Z",
        ];
        for (i, t) in times.iter().enumerate() {
            let mut r = sample(t, 46.8 + i as f64 * 0.01, -48.0 - i as f64 * 0.003);
            r.thickness = 0.1 * (i + 1) as f64;
            r.radius = 1000.0 + 37.0 * i as f64;
            records.push(r);
        }
        let idx = index(records.clone());
        let width = TimeDelta::hours(2);
        let buckets = idx.bucket_aggregate(width);

        // 03:30-05:30, 05:30-07:30, (07:30-09:30 empty), 09:30-11:30
        assert_eq!(buckets.len(), 3);
        assert_eq!(
            buckets.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );

        for b in &buckets {
            let end = b.bucket_start + width;
            let members: Vec<&Record> = records
                .iter()
                .filter(|r| r.timestamp >= b.bucket_start && r.timestamp < end)
                .collect();
            assert_eq!(members.len(), b.count);
            let n = members.len() as f64;
            let mean = |f: fn(&Record) -> f64| members.iter().map(|r| f(r)).sum::<f64>() / n;
            assert_abs_diff_eq!(b.mean_latitude, mean(|r| r.latitude), epsilon = 1e-9);
            assert_abs_diff_eq!(b.mean_longitude, mean(|r| r.longitude), epsilon = 1e-9);
            assert_abs_diff_eq!(b.mean_thickness, mean(|r| r.thickness), epsilon = 1e-9);
            assert_abs_diff_eq!(b.mean_radius, mean(|r| r.radius), epsilon = 1e-9);
        }
        assert_eq!(buckets[0].bucket_start, idx.first_instant().unwrap());
    }

    #[test]
    fn bucket_width_is_clamped() {
        let idx = scenario();
        let tiny = idx.bucket_aggregate(TimeDelta::zero());
        assert_eq!(tiny, idx.bucket_aggregate(TimeDelta::seconds(MIN_BUCKET_SECS)));
        let huge = idx.bucket_aggregate(TimeDelta::days(365));
        assert_eq!(huge.len(), 1);
        assert_eq!(huge[0].count, 4);
    }

    #[test]
    fn buckets_start_at_earliest_raw_timestamp() {
        let idx = index(vec![
            sample("2018-11-30T03:30:45Z", 46.80, -48.10),
            sample("2018-11-30T05:30:30Z", 46.90, -48.20),
        ]);
        let buckets = idx.bucket_aggregate(TimeDelta::hours(2));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(
            buckets[0].bucket_start,
            DateTime::parse_from_rfc3339("2018-11-30T03:30:45Z").unwrap()
        );
    }

    #[test]
    fn bucket_width_from_hours_is_clamped() {
        assert_eq!(bucket_width(2.0), TimeDelta::hours(2));
        assert_eq!(bucket_width(1e20), TimeDelta::seconds(MAX_BUCKET_SECS));
        assert_eq!(bucket_width(f64::INFINITY), TimeDelta::seconds(MAX_BUCKET_SECS));
        assert_eq!(bucket_width(-3.0), TimeDelta::seconds(MIN_BUCKET_SECS));
        assert_eq!(bucket_width(f64::NAN), TimeDelta::seconds(MIN_BUCKET_SECS));
    }

    #[test]
    fn mass_categories_first_seen() {
        let mut a = sample("2018-11-30T03:30:00Z", 1.0, 1.0);
        a.mass = 750.0;
        let b = sample("2018-11-30T03:31:00Z", 1.0, 1.0);
        let mut c = sample("2018-11-30T03:32:00Z", 1.0, 1.0);
        c.mass = 750.0;
        let idx = index(vec![a, b, c]);
        assert_eq!(idx.mass_categories(), vec!["750", "1500"]);
    }

    #[test]
    fn empty_index_is_harmless() {
        let idx = index(Vec::new());
        assert!(idx.is_empty());
        assert!(idx.lookup_key(0).is_empty());
        assert!(idx.bucket_aggregate(TimeDelta::hours(2)).is_empty());
        assert_eq!(idx.first_instant(), None);
    }
}
