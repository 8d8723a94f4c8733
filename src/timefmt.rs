//! Timestamp parsing and display-zone formatting
//!
//! Records are keyed by the epoch second of their truncated UTC instant.
//! The display label is derived from that key and never used for lookup
//! arithmetic, so formatting cannot drift between load and query time.

use crate::config::Granularity;
use crate::error::ParseError;
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// Fallback zone for display labels (Newfoundland, where the data was taken)
pub const DEFAULT_DISPLAY_TZ: Tz = chrono_tz::America::St_Johns;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// A parsed timestamp in all the forms the rest of the pipeline needs
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTime {
    pub instant: DateTime<Utc>,
    pub key: i64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeNormalizer {
    source: Tz,
    display: Tz,
    granularity: Granularity,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new(Tz::UTC, DEFAULT_DISPLAY_TZ, Granularity::Minute)
    }
}

impl TimeNormalizer {
    pub fn new(source: Tz, display: Tz, granularity: Granularity) -> Self {
        Self {
            source,
            display,
            granularity,
        }
    }

    pub fn display_zone(&self) -> Tz {
        self.display
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Parse a raw timestamp, truncate it and format its display label
    pub fn normalize(&self, raw: &str) -> Result<NormalizedTime, ParseError> {
        Ok(self.normalize_instant(self.parse(raw)?))
    }

    pub fn normalize_instant(&self, instant: DateTime<Utc>) -> NormalizedTime {
        let key = self.key_of(instant);
        NormalizedTime {
            instant: self.instant_of(key),
            key,
            label: self.label_for_key(key),
        }
    }

    /// Parse a raw source timestamp into a UTC instant.
    ///
    /// Explicit offsets (RFC 3339, `+hhmm`, trailing `Z`/`UTC`) win over
    /// the configured source zone. Naive times inside a DST gap are
    /// rejected; times inside a fold resolve to the earlier instant.
    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, ParseError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ParseError::MissingTimestamp);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.with_timezone(&Utc));
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
                return Ok(dt.with_timezone(&Utc));
            }
        }

        let (body, explicit_utc) = match text
            .strip_suffix('Z')
            .or_else(|| text.strip_suffix(" UTC"))
        {
            Some(body) => (body.trim_end(), true),
            None => (text, false),
        };

        let naive = parse_naive(body).ok_or_else(|| ParseError::Timestamp(text.to_string()))?;
        if explicit_utc {
            return Ok(naive.and_utc());
        }

        match self.source.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
            LocalResult::None => Err(ParseError::NonexistentLocalTime(
                text.to_string(),
                self.source.name().to_string(),
            )),
        }
    }

    /// Epoch second of the instant, truncated to the granularity
    pub fn key_of(&self, instant: DateTime<Utc>) -> i64 {
        let secs = instant.timestamp();
        secs - secs.rem_euclid(self.granularity.seconds())
    }

    pub fn instant_of(&self, key: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(key, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Display label for an instant, in the display zone, without offset
    pub fn label(&self, instant: DateTime<Utc>) -> String {
        self.label_for_key(self.key_of(instant))
    }

    pub fn label_for_key(&self, key: i64) -> String {
        self.instant_of(key)
            .with_timezone(&self.display)
            .format(self.granularity.pattern())
            .to_string()
    }

    /// Keys whose label equals `label`. A DST fold yields two keys, a gap
    /// yields none.
    pub fn keys_for_label(&self, label: &str) -> Result<Vec<i64>, ParseError> {
        let text = label.trim();
        let naive = NaiveDateTime::parse_from_str(text, self.granularity.pattern())
            .map_err(|_| ParseError::Timestamp(text.to_string()))?;

        let keys = match self.display.from_local_datetime(&naive) {
            LocalResult::Single(dt) => vec![self.key_of(dt.with_timezone(&Utc))],
            LocalResult::Ambiguous(a, b) => vec![
                self.key_of(a.with_timezone(&Utc)),
                self.key_of(b.with_timezone(&Utc)),
            ],
            LocalResult::None => Vec::new(),
        };
        Ok(keys)
    }

    /// Key of `start` moved forward by a fractional number of hours
    pub fn offset_key(&self, start: DateTime<Utc>, hours: f64) -> i64 {
        let millis = (hours * 3_600_000.0).round() as i64;
        let moved = start
            .checked_add_signed(TimeDelta::milliseconds(millis))
            .unwrap_or(start);
        self.key_of(moved)
    }
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}
