//! Observation records and their presentation fields

use crate::timefmt::TimeNormalizer;
use chrono::{DateTime, Utc};

/// One observed oil blob, as loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub thickness: f64,
    pub mass: f64,
}

/// A record plus everything the views derive from it
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub record: Record,
    /// Epoch second of the truncated timestamp
    pub key: i64,
    pub display_time: String,
    pub scaled_radius: f64,
    pub mass_label: String,
}

/// Divisor turning a physical radius into a marker radius in map units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale(f64);

impl RadiusScale {
    /// Non-positive or non-finite divisors clamp to 1.0
    pub fn new(divisor: f64) -> Self {
        if divisor.is_finite() && divisor > 0.0 {
            Self(divisor)
        } else {
            tracing::warn!(divisor, "radius scale out of range, using 1.0");
            Self(1.0)
        }
    }

    pub fn divisor(self) -> f64 {
        self.0
    }

    pub fn apply(self, radius: f64) -> f64 {
        radius / self.0
    }
}

/// Canonical category label for a mass value
pub fn mass_label(mass: f64) -> String {
    format!("{}", mass)
}

impl DisplayRecord {
    pub fn derive(record: Record, time: &TimeNormalizer, scale: RadiusScale) -> Self {
        let when = time.normalize_instant(record.timestamp);
        Self {
            key: when.key,
            display_time: when.label,
            scaled_radius: scale.apply(record.radius),
            mass_label: mass_label(record.mass),
            record,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.record.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.record.longitude
    }
}

#[cfg(test)]
pub(crate) fn sample(ts: &str, lat: f64, lon: f64) -> Record {
    Record {
        timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
        latitude: lat,
        longitude: lon,
        radius: 25_000.0,
        thickness: 0.5,
        mass: 1500.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_radius_divides_exactly() {
        let record = sample("2018-11-30T03:30:00Z", 46.8, -48.0);
        let map = DisplayRecord::derive(record.clone(), &TimeNormalizer::default(), RadiusScale::new(10_000.0));
        assert_eq!(map.scaled_radius, 2.5);

        let slider = DisplayRecord::derive(record, &TimeNormalizer::default(), RadiusScale::new(15_000.0));
        assert_eq!(slider.scaled_radius, 25_000.0 / 15_000.0);
    }

    #[test]
    fn bad_scale_clamps() {
        assert_eq!(RadiusScale::new(0.0).divisor(), 1.0);
        assert_eq!(RadiusScale::new(-5.0).divisor(), 1.0);
        assert_eq!(RadiusScale::new(f64::NAN).divisor(), 1.0);
    }

    #[test]
    fn mass_labels_are_canonical() {
        assert_eq!(mass_label(1500.0), "1500");
        assert_eq!(mass_label(12.25), "12.25");
    }

    #[test]
    fn derive_sets_display_time() {
        let record = sample("2018-11-30T03:30:00Z", 46.8, -48.0);
        let d = DisplayRecord::derive(record, &TimeNormalizer::default(), RadiusScale::new(10_000.0));
        assert_eq!(d.display_time, "2018-11-30 00:00");
        assert_eq!(d.mass_label, "1500");
    }
}
