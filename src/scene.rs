//! JSON scene export for browser-side plotting.
//!
//! A scene carries everything a plotting front end needs to replay the
//! slider offline: the grey background of every observation, the smoothed
//! trajectory path, a fixed viewport and one frame per slider position.

use crate::config::{Granularity, SliderConfig, SliderSpec};
use crate::loader::LoadReport;
use crate::record::DisplayRecord;
use crate::snapshot::{bucket_width, BoundingBox, SnapshotIndex};
use crate::tooltip::{TooltipField, SLIDER_TOOLTIP};
use crate::view::{on_slider_change, RenderSink, SnapshotStatus, ViewState, ViewUpdate};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// One circle glyph
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    /// Scaled radius, in map units
    pub radius: f64,
    /// Physical radius as loaded
    pub radius_raw: f64,
    pub thickness: f64,
    pub mass: String,
    pub time: String,
}

impl From<&DisplayRecord> for Marker {
    fn from(rec: &DisplayRecord) -> Self {
        Self {
            x: rec.record.longitude,
            y: rec.record.latitude,
            radius: rec.scaled_radius,
            radius_raw: rec.record.radius,
            thickness: rec.record.thickness,
            mass: rec.mass_label.clone(),
            time: rec.display_time.clone(),
        }
    }
}

/// One vertex of the smoothed trajectory line
#[derive(Debug, Clone, Serialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub thickness: f64,
    pub radius_raw: f64,
    pub bucket_start: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub offset_hours: f64,
    /// Requested instant, RFC 3339 in UTC
    pub utc: String,
    pub label: String,
    pub title: String,
    pub status: SnapshotStatus,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub source: String,
    pub loaded: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub title: String,
    pub display_time_zone: String,
    pub granularity: Granularity,
    pub viewport: BoundingBox,
    pub slider: SliderSpec,
    pub tooltip: Vec<TooltipField>,
    pub mass_categories: Vec<String>,
    pub background: Vec<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Vec<PathPoint>>,
    pub frames: Vec<Frame>,
    pub load: LoadSummary,
}

impl Scene {
    /// Writes pretty JSON to a file.
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Collects one frame per slider update
#[derive(Default)]
struct FrameRecorder {
    frames: Vec<Frame>,
}

impl RenderSink for FrameRecorder {
    fn show(&mut self, update: &ViewUpdate<'_>) -> io::Result<()> {
        self.frames.push(Frame {
            offset_hours: update.offset_hours,
            utc: update.instant.to_rfc3339(),
            label: update.label.clone(),
            title: update.title.clone(),
            status: update.status.clone(),
            markers: update.records.iter().map(Marker::from).collect(),
        });
        Ok(())
    }
}

/// Trajectory path from bucket means, labelled in display time
pub fn overlay_path(index: &SnapshotIndex, bucket_hours: f64) -> Vec<PathPoint> {
    index
        .bucket_aggregate(bucket_width(bucket_hours))
        .into_iter()
        .map(|b| PathPoint {
            x: b.mean_longitude,
            y: b.mean_latitude,
            thickness: b.mean_thickness,
            radius_raw: b.mean_radius,
            bucket_start: index.time().label(b.bucket_start),
            count: b.count,
        })
        .collect()
}

/// Drive a fresh view state across every slider position and capture the
/// result. Returns `None` for an empty index.
pub fn build_scene(index: &SnapshotIndex, config: &SliderConfig, report: &LoadReport) -> Option<Scene> {
    if index.is_empty() {
        return None;
    }
    let mut state = ViewState::new(index, config.slider.clone(), config.empty_policy)?;
    let mut recorder = FrameRecorder::default();
    for position in config.slider.positions() {
        // FrameRecorder never fails
        let _ = on_slider_change(&mut state, index, &mut recorder, position);
    }

    Some(Scene {
        title: recorder
            .frames
            .first()
            .map(|f| f.title.clone())
            .unwrap_or_default(),
        display_time_zone: index.time().display_zone().name().to_string(),
        granularity: index.time().granularity(),
        viewport: index.bounding_box(config.padding),
        slider: config.slider.clone(),
        tooltip: SLIDER_TOOLTIP.to_vec(),
        mass_categories: index.mass_categories().into_iter().map(String::from).collect(),
        background: index.records().iter().map(Marker::from).collect(),
        overlay: config
            .show_overlay
            .then(|| overlay_path(index, config.bucket_hours)),
        frames: recorder.frames,
        load: LoadSummary {
            source: report.path.display().to_string(),
            loaded: report.loaded,
            dropped: report.dropped_count(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmptySnapshotPolicy, DEFAULT_BUCKET_HOURS, DEFAULT_PADDING};
    use crate::record::{sample, RadiusScale};
    use crate::timefmt::TimeNormalizer;

    fn config(show_overlay: bool) -> SliderConfig {
        SliderConfig {
            scale: 15_000.0,
            padding: DEFAULT_PADDING,
            bucket_hours: DEFAULT_BUCKET_HOURS,
            show_overlay,
            empty_policy: EmptySnapshotPolicy::NoData,
            slider: SliderSpec::default(),
            time_step: 0.05,
        }
    }

    fn index() -> SnapshotIndex {
        SnapshotIndex::build(
            vec![
                sample("2018-11-30T03:30:00Z", 46.80, -48.10),
                sample("2018-11-30T03:30:00Z", 46.81, -48.11),
                sample("2018-11-30T05:30:00Z", 46.90, -48.20),
                sample("2018-11-30T06:00:00Z", 46.92, -48.22),
            ],
            TimeNormalizer::default(),
            RadiusScale::new(15_000.0),
        )
    }

    #[test]
    fn one_frame_per_slider_position() {
        let idx = index();
        let scene = build_scene(&idx, &config(true), &LoadReport::default()).unwrap();
        assert_eq!(scene.frames.len(), 13);
        assert_eq!(scene.frames[0].markers.len(), 2);
        assert_eq!(scene.frames[1].markers.len(), 1);
        assert_eq!(scene.frames[2].status, SnapshotStatus::NoData);
        assert_eq!(scene.title, "Oil distribution at 2018-11-30 00:00");
        assert_eq!(scene.background.len(), 4);
        assert_eq!(scene.display_time_zone, "America/St_Johns");
    }

    #[test]
    fn overlay_follows_bucket_means() {
        let idx = index();
        let scene = build_scene(&idx, &config(true), &LoadReport::default()).unwrap();
        let overlay = scene.overlay.unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay[0].count, 2);
        assert_eq!(overlay[1].count, 2);
        assert_eq!(overlay[0].bucket_start, "2018-11-30 00:00");
        assert!((overlay[0].y - 46.805).abs() < 1e-9);
    }

    #[test]
    fn absurd_bucket_hours_are_clamped() {
        let idx = index();
        let wide = overlay_path(&idx, 1e20);
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].count, 4);
        assert_eq!(overlay_path(&idx, f64::INFINITY).len(), 1);
        assert_eq!(overlay_path(&idx, f64::NAN).len(), 3);
    }

    #[test]
    fn frames_carry_the_requested_instant() {
        let idx = index();
        let scene = build_scene(&idx, &config(false), &LoadReport::default()).unwrap();
        assert_eq!(scene.frames[0].utc, "2018-11-30T03:30:00+00:00");
        assert_eq!(scene.frames[1].utc, "2018-11-30T05:30:00+00:00");
    }

    #[test]
    fn empty_index_has_no_scene() {
        let idx = SnapshotIndex::build(Vec::new(), TimeNormalizer::default(), RadiusScale::new(1.0));
        assert!(build_scene(&idx, &config(true), &LoadReport::default()).is_none());
    }

    #[test]
    fn overlay_can_be_switched_off() {
        let idx = index();
        let scene = build_scene(&idx, &config(false), &LoadReport::default()).unwrap();
        assert!(scene.overlay.is_none());
        let json = serde_json::to_value(&scene).unwrap();
        assert!(json.get("overlay").is_none());
        assert_eq!(json["frames"][2]["status"]["kind"], "no_data");
        assert_eq!(json["granularity"], "minute");
    }

    #[test]
    fn scene_written_to_disk() {
        let dir = tempfile::tempdir().expect("Could not create temp dir");
        let path = dir.path().join("scene.json");
        let scene = build_scene(&index(), &config(true), &LoadReport::default()).unwrap();
        scene.write_to_file(&path).expect("Failed to write scene");
        let text = std::fs::read_to_string(&path).unwrap();
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["slider"]["label"], "Hour");
        let min_lat = back["viewport"]["min_lat"].as_f64().unwrap();
        assert!((min_lat - (46.80 - 0.02)).abs() < 1e-12);
    }
}
