//! Interactive time slider over the snapshot index
//!
//! Layers, bottom to top: every observation in grey, the smoothed path,
//! the snapshot at the slider time, and the hovered blob.

use super::canvas::{BrailleCanvas, Projection};
use super::{draw_title, draw_tooltip, Controls};
use crate::colors::{self, Layer};
use crate::config::{SliderConfig, SliderSpec};
use crate::help::{render_help_overlay, SLIDER_HELP};
use crate::scene::{overlay_path, PathPoint};
use crate::snapshot::{BoundingBox, SnapshotIndex};
use crate::terminal::Terminal;
use crate::tooltip::{self, SLIDER_TOOLTIP};
use crate::view::{on_slider_change, RenderSink, SnapshotStatus, ViewState, ViewUpdate};
use crossterm::event::KeyCode;
use std::io;

/// Rows used by the title, the status line and the slider bar
const CHROME_ROWS: u16 = 3;

/// What one frame needs besides the update itself
pub struct FrameContext<'a> {
    pub index: &'a SnapshotIndex,
    pub viewport: BoundingBox,
    pub overlay: Option<&'a [PathPoint]>,
    pub slider: &'a SliderSpec,
    pub hover: Option<usize>,
}

/// Draw a complete slider frame into the buffer
pub fn draw_frame(term: &mut Terminal, ctx: &FrameContext<'_>, update: &ViewUpdate<'_>) {
    let (width, height) = term.size();
    draw_title(term, &update.title);
    if height <= CHROME_ROWS || width < 2 {
        return;
    }

    let mut canvas = BrailleCanvas::new(width, height - CHROME_ROWS);
    let projection = Projection::new(ctx.viewport, &canvas);
    let blob = |canvas: &mut BrailleCanvas, lon: f64, lat: f64, radius: f64, layer: Layer| {
        let (x, y) = projection.to_dot(lon, lat);
        canvas.disc(x, y, projection.radius(radius), layer as u8);
    };

    for rec in ctx.index.records() {
        blob(&mut canvas, rec.longitude(), rec.latitude(), rec.scaled_radius, Layer::Background);
    }
    if let Some(path) = ctx.overlay {
        for pair in path.windows(2) {
            let from = projection.to_dot(pair[0].x, pair[0].y);
            let to = projection.to_dot(pair[1].x, pair[1].y);
            canvas.line(from, to, Layer::Path as u8);
        }
    }
    for (i, rec) in update.records.iter().enumerate() {
        let layer = if ctx.hover == Some(i) {
            Layer::Hover
        } else {
            Layer::Snapshot
        };
        blob(&mut canvas, rec.longitude(), rec.latitude(), rec.scaled_radius, layer);
    }
    canvas.blit(term, 1, |level| {
        Layer::from_level(level).unwrap_or(Layer::Background).color()
    });

    let status_row = height as i32 - 2;
    let (status, color) = status_line(update);
    term.set_str(0, status_row, &status, Some(color), false);
    draw_slider_bar(term, height as i32 - 1, ctx.slider, update.offset_hours);

    if let Some(rec) = ctx.hover.and_then(|i| update.records.get(i)) {
        let (cx, cy) = Projection::cell_of(projection.to_dot(rec.longitude(), rec.latitude()));
        draw_tooltip(term, (cx, cy + 1), &tooltip::lines(rec, &SLIDER_TOOLTIP));
    }
}

fn status_line(update: &ViewUpdate<'_>) -> (String, crossterm::style::Color) {
    match &update.status {
        SnapshotStatus::Live => (
            format!("{} blobs at {}", update.records.len(), update.label),
            colors::TEXT,
        ),
        SnapshotStatus::NoData => (format!("no data at {}", update.label), colors::WARNING),
        SnapshotStatus::Held { since } => (
            format!("no data at {}, holding {}", update.label, since),
            colors::WARNING,
        ),
    }
}

/// `Hour: 6  [────●────]` spanning the full width
pub fn draw_slider_bar(term: &mut Terminal, row: i32, slider: &SliderSpec, value: f64) {
    let (width, _) = term.size();
    let prefix = format!("{}: {}  ", slider.label, value);
    let suffix = format!("  {}..{}", slider.min, slider.max);
    let fixed = prefix.chars().count() + suffix.chars().count() + 2;
    let track = (width as usize).saturating_sub(fixed);

    term.set_str(0, row, &prefix, Some(colors::TITLE), true);
    if track == 0 {
        return;
    }
    let span = slider.max - slider.min;
    let frac = if span > 0.0 {
        ((value - slider.min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let knob = (frac * (track - 1) as f64).round() as usize;
    let bar: String = (0..track).map(|i| if i == knob { '●' } else { '─' }).collect();

    let x = prefix.chars().count() as i32;
    term.set(x, row, '[', Some(colors::TEXT), false);
    term.set_str(x + 1, row, &bar, Some(colors::TEXT), false);
    term.set(x + 1 + knob as i32, row, '●', Some(colors::TITLE), true);
    term.set(x + 1 + track as i32, row, ']', Some(colors::TEXT), false);
    term.set_str(x + 2 + track as i32, row, &suffix, Some(colors::TEXT), false);
}

/// Live terminal sink for view updates
struct SliderScreen<'a> {
    term: Terminal,
    index: &'a SnapshotIndex,
    viewport: BoundingBox,
    overlay: Vec<PathPoint>,
    show_overlay: bool,
    slider: SliderSpec,
    controls: Controls,
    shown: usize,
}

impl RenderSink for SliderScreen<'_> {
    fn show(&mut self, update: &ViewUpdate<'_>) -> io::Result<()> {
        self.shown = update.records.len();
        if self.controls.hover.is_some_and(|i| i >= self.shown) {
            self.controls.hover = None;
        }
        let ctx = FrameContext {
            index: self.index,
            viewport: self.viewport,
            overlay: self.show_overlay.then_some(self.overlay.as_slice()),
            slider: &self.slider,
            hover: self.controls.hover,
        };
        self.term.clear();
        draw_frame(&mut self.term, &ctx, update);
        if self.controls.show_help {
            render_help_overlay(&mut self.term, SLIDER_HELP);
        }
        self.term.present()
    }
}

/// Run the slider until the user quits
pub fn run(index: &SnapshotIndex, config: &SliderConfig) -> io::Result<()> {
    let Some(mut state) = ViewState::new(index, config.slider.clone(), config.empty_policy) else {
        return Ok(());
    };
    let overlay = overlay_path(index, config.bucket_hours);
    tracing::debug!(points = overlay.len(), "trajectory path");

    let mut screen = SliderScreen {
        term: Terminal::interactive()?,
        index,
        viewport: index.bounding_box(config.padding),
        overlay,
        show_overlay: config.show_overlay,
        slider: config.slider.clone(),
        controls: Controls::default(),
        shown: 0,
    };
    let timeout = (config.time_step.max(0.01) * 1000.0) as u64;
    on_slider_change(&mut state, index, &mut screen, config.slider.initial)?;

    loop {
        let mut redraw = screen.term.sync_size()?;

        if let Some((code, mods)) = screen.term.poll_key(timeout)? {
            let before = state.offset_hours();
            let shown = screen.shown;
            if screen.controls.handle_key(code, mods, shown) {
                break;
            }
            match code {
                KeyCode::Left | KeyCode::Char('h') => state.step_back(index),
                KeyCode::Right | KeyCode::Char('l') => state.step_forward(index),
                KeyCode::Home => state.jump_to_start(index),
                KeyCode::End => state.jump_to_end(index),
                KeyCode::Char('o') => screen.show_overlay = !screen.show_overlay,
                _ => {}
            }
            if state.offset_hours() != before {
                screen.controls.hover = None;
            }
            redraw = true;
        }

        if redraw {
            screen.show(&state.update(index))?;
        }
    }
    Ok(())
}
