//! Slider-driven view state
//!
//! `ViewState` holds only the slider offset and the keys derived from it.
//! The records themselves stay in the `SnapshotIndex`; every update borrows
//! its snapshot from there, so recomputing a view is always idempotent.

use crate::config::{EmptySnapshotPolicy, SliderSpec};
use crate::record::DisplayRecord;
use crate::snapshot::SnapshotIndex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;

/// How the pushed snapshot relates to the requested time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Records observed at the requested time
    Live,
    /// Nothing observed at the requested time; the record set is empty
    NoData,
    /// Nothing observed; showing the last snapshot that had data
    Held { since: String },
}

/// Everything a renderer needs after a slider move
#[derive(Debug, Clone)]
pub struct ViewUpdate<'a> {
    pub offset_hours: f64,
    pub instant: DateTime<Utc>,
    pub label: String,
    pub title: String,
    pub records: &'a [DisplayRecord],
    pub status: SnapshotStatus,
}

/// Receiver of view updates (a terminal, a scene file, a test recorder)
pub trait RenderSink {
    fn show(&mut self, update: &ViewUpdate<'_>) -> io::Result<()>;
}

pub fn title_for(label: &str) -> String {
    format!("Oil distribution at {label}")
}

#[derive(Debug, Clone)]
pub struct ViewState {
    start: DateTime<Utc>,
    slider: SliderSpec,
    policy: EmptySnapshotPolicy,
    offset_hours: f64,
    current_key: i64,
    last_shown: Option<i64>,
}

impl ViewState {
    /// Start at the earliest observation with the slider at its initial
    /// value. Returns `None` for an empty index.
    pub fn new(index: &SnapshotIndex, slider: SliderSpec, policy: EmptySnapshotPolicy) -> Option<Self> {
        let start = index.first_instant()?;
        let mut state = Self {
            start,
            offset_hours: slider.min,
            current_key: index.time().key_of(start),
            last_shown: None,
            slider,
            policy,
        };
        let initial = state.slider.initial;
        state.set_offset(index, initial);
        Some(state)
    }

    pub fn offset_hours(&self) -> f64 {
        self.offset_hours
    }

    /// Move the slider. Out-of-range values are clamped to the nearest
    /// bound; in-range values are taken as is, even between steps.
    pub fn set_offset(&mut self, index: &SnapshotIndex, hours: f64) {
        let clamped = self.slider.clamp(hours);
        if clamped != hours {
            tracing::warn!(requested = hours, clamped, "slider offset out of range");
        }
        self.offset_hours = clamped;
        self.current_key = index.time().offset_key(self.start, clamped);
        if !index.lookup_key(self.current_key).is_empty() {
            self.last_shown = Some(self.current_key);
        }
        tracing::debug!(offset = clamped, key = self.current_key, "slider moved");
    }

    pub fn step_forward(&mut self, index: &SnapshotIndex) {
        let next = self.offset_hours + self.slider.step;
        self.set_offset(index, next.min(self.slider.max));
    }

    pub fn step_back(&mut self, index: &SnapshotIndex) {
        let prev = self.offset_hours - self.slider.step;
        self.set_offset(index, prev.max(self.slider.min));
    }

    pub fn jump_to_start(&mut self, index: &SnapshotIndex) {
        let min = self.slider.min;
        self.set_offset(index, min);
    }

    pub fn jump_to_end(&mut self, index: &SnapshotIndex) {
        let max = self.slider.max;
        self.set_offset(index, max);
    }

    /// The view for the current offset
    pub fn update<'a>(&self, index: &'a SnapshotIndex) -> ViewUpdate<'a> {
        let time = index.time();
        let instant = time.instant_of(self.current_key);
        let label = time.label(instant);
        let found = index.lookup(instant);

        let (records, status) = if !found.is_empty() {
            (found, SnapshotStatus::Live)
        } else {
            match (self.policy, self.last_shown) {
                (EmptySnapshotPolicy::KeepPrevious, Some(key)) => (
                    index.lookup_key(key),
                    SnapshotStatus::Held {
                        since: time.label_for_key(key),
                    },
                ),
                _ => (found, SnapshotStatus::NoData),
            }
        };

        ViewUpdate {
            offset_hours: self.offset_hours,
            instant,
            title: title_for(&label),
            label,
            records,
            status,
        }
    }
}

/// Slider event handler: apply the new value and push the result
pub fn on_slider_change<S: RenderSink + ?Sized>(
    state: &mut ViewState,
    index: &SnapshotIndex,
    sink: &mut S,
    value: f64,
) -> io::Result<()> {
    state.set_offset(index, value);
    sink.show(&state.update(index))
}
