use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marker radius divisor for the static full-trajectory view
pub const DEFAULT_MAP_SCALE: f64 = 10_000.0;
/// Marker radius divisor for the time-sliced view
pub const DEFAULT_SLIDER_SCALE: f64 = 15_000.0;
/// Degrees added on every side of the data extent
pub const DEFAULT_PADDING: f64 = 0.02;
/// Width of the trajectory overlay buckets
pub const DEFAULT_BUCKET_HOURS: f64 = 2.0;

/// Precision of display timestamps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Minute,
    Second,
}

impl Granularity {
    /// Length of one unit in seconds
    pub fn seconds(self) -> i64 {
        match self {
            Granularity::Minute => 60,
            Granularity::Second => 1,
        }
    }

    /// strftime pattern for display labels
    pub fn pattern(self) -> &'static str {
        match self {
            Granularity::Minute => "%Y-%m-%d %H:%M",
            Granularity::Second => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// What the slider view shows when no observation matches the selected time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySnapshotPolicy {
    /// Clear the markers and say so
    #[default]
    NoData,
    /// Keep drawing the last snapshot that had data
    KeepPrevious,
}

/// Numeric slider control, in hours from the first observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderSpec {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
}

impl Default for SliderSpec {
    fn default() -> Self {
        Self {
            label: "Hour".to_string(),
            min: 0.0,
            max: 24.0,
            step: 2.0,
            initial: 0.0,
        }
    }
}

impl SliderSpec {
    /// Repair a spec loaded from user settings. Returns a description of
    /// every field that had to change.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();
        let defaults = SliderSpec::default();

        if !self.min.is_finite() {
            fixes.push(format!("slider min {} replaced by {}", self.min, defaults.min));
            self.min = defaults.min;
        }
        if !self.max.is_finite() {
            fixes.push(format!("slider max {} replaced by {}", self.max, defaults.max));
            self.max = defaults.max;
        }
        if self.max < self.min {
            fixes.push(format!("slider bounds swapped ({} > {})", self.min, self.max));
            std::mem::swap(&mut self.min, &mut self.max);
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            let span = self.max - self.min;
            let step = if span > 0.0 { span } else { 1.0 };
            fixes.push(format!("slider step {} replaced by {}", self.step, step));
            self.step = step;
        }
        let clamped = self.clamp(self.initial);
        if clamped != self.initial {
            fixes.push(format!("slider initial {} clamped to {}", self.initial, clamped));
            self.initial = clamped;
        }
        fixes
    }

    /// Nearest value inside [min, max]. NaN maps to min.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Every value the slider can stop on, min first
    pub fn positions(&self) -> Vec<f64> {
        let mut out = Vec::new();
        if self.step <= 0.0 || !self.step.is_finite() {
            out.push(self.min);
            return out;
        }
        let count = ((self.max - self.min) / self.step + 1e-9).floor() as usize;
        for i in 0..=count {
            out.push(self.min + self.step * i as f64);
        }
        out
    }
}

/// Settings for the static full-trajectory view
#[derive(Clone, Debug)]
pub struct MapConfig {
    pub scale: f64,
    pub padding: f64,
    pub print: bool,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub time_step: f32,
}

/// Settings for the time slider view
#[derive(Clone, Debug)]
pub struct SliderConfig {
    pub scale: f64,
    pub padding: f64,
    pub bucket_hours: f64,
    pub show_overlay: bool,
    pub empty_policy: EmptySnapshotPolicy,
    pub slider: SliderSpec,
    pub time_step: f32,
}

/// Settings for writing a scene file
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub view: SliderConfig,
    pub output: PathBuf,
}
