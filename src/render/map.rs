//! Static view of the whole trajectory, one colored blob per observation

use super::canvas::{BrailleCanvas, Projection};
use super::{draw_title, draw_tooltip, Controls};
use crate::colors::{self, Layer};
use crate::config::MapConfig;
use crate::help::{render_help_overlay, MAP_HELP};
use crate::snapshot::{BoundingBox, SnapshotIndex};
use crate::terminal::Terminal;
use crate::tooltip::{self, MAP_TOOLTIP};
use std::io::{self, stdout};

pub const MAP_TITLE: &str = "Oil Spill Trajectory";

/// Level reserved for the hovered blob; categories use 1..HOVER_LEVEL
const HOVER_LEVEL: u8 = u8::MAX;

const PRINT_WIDTH: u16 = 100;
const PRINT_HEIGHT: u16 = 40;

/// Draw the full map into the buffer. `hover` indexes `index.records()`.
pub fn draw(term: &mut Terminal, index: &SnapshotIndex, viewport: BoundingBox, hover: Option<usize>) {
    let (width, height) = term.size();
    draw_title(term, MAP_TITLE);
    if height < 3 || width < 2 {
        return;
    }

    let categories = index.mass_categories();
    let level_of = |mass: &str| -> u8 {
        let pos = categories.iter().position(|c| *c == mass).unwrap_or(0);
        (pos + 1).min(HOVER_LEVEL as usize - 1) as u8
    };

    let mut canvas = BrailleCanvas::new(width, height - 2);
    let projection = Projection::new(viewport, &canvas);
    for (i, rec) in index.records().iter().enumerate() {
        let level = if hover == Some(i) {
            HOVER_LEVEL
        } else {
            level_of(&rec.mass_label)
        };
        let center = projection.to_dot(rec.longitude(), rec.latitude());
        canvas.disc(center.0, center.1, projection.radius(rec.scaled_radius), level);
    }
    canvas.blit(term, 1, |level| match level {
        HOVER_LEVEL => Layer::Hover.color(),
        n => (colors::category_color(n as usize - 1), false),
    });

    draw_legend(term, &categories);

    let footer = format!("{} observations  ? help", index.len());
    term.set_str(0, height as i32 - 1, &footer, Some(colors::TEXT), false);

    if let Some(rec) = hover.and_then(|i| index.records().get(i)) {
        let (cx, cy) = Projection::cell_of(projection.to_dot(rec.longitude(), rec.latitude()));
        draw_tooltip(term, (cx, cy + 1), &tooltip::lines(rec, &MAP_TOOLTIP));
    }
}

/// Mass legend stacked up from the bottom-right corner, on a blanked
/// rectangle so markers underneath do not bleed into the labels
fn draw_legend(term: &mut Terminal, categories: &[&str]) {
    let (width, height) = term.size();
    let room = (height as usize).saturating_sub(3);
    let shown = categories.len().min(room);
    let label_width = categories.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let x = (width as usize).saturating_sub(label_width + 3) as i32;
    let bottom = height as i32 - 2;

    for (i, mass) in categories.iter().take(shown).enumerate() {
        let y = bottom - (shown - 1 - i) as i32;
        for cx in (x - 1)..width as i32 {
            term.set(cx, y, ' ', None, false);
        }
        term.set(x, y, '●', Some(colors::category_color(i)), true);
        term.set_str(x + 2, y, mass, Some(colors::TEXT), false);
    }
}

/// Show the map until the user quits, or print one frame in print mode
pub fn run(index: &SnapshotIndex, config: &MapConfig) -> io::Result<()> {
    let viewport = index.bounding_box(config.padding);

    if config.print {
        let (tty_w, tty_h) = crossterm::terminal::size().unwrap_or((PRINT_WIDTH, PRINT_HEIGHT));
        let width = config.width.unwrap_or(tty_w).max(10);
        let height = config.height.unwrap_or(PRINT_HEIGHT.min(tty_h.max(10))).max(5);
        let mut term = Terminal::offscreen(width, height);
        draw(&mut term, index, viewport, None);
        return term.print_to(&mut stdout().lock());
    }

    let mut term = Terminal::interactive()?;
    let mut controls = Controls::default();
    let timeout = (config.time_step.max(0.01) * 1000.0) as u64;
    let mut dirty = true;

    loop {
        if term.sync_size()? {
            dirty = true;
        }
        if dirty {
            term.clear();
            draw(&mut term, index, viewport, controls.hover);
            if controls.show_help {
                render_help_overlay(&mut term, MAP_HELP);
            }
            term.present()?;
            dirty = false;
        }

        if let Some((code, mods)) = term.poll_key(timeout)? {
            if controls.handle_key(code, mods, index.len()) {
                break;
            }
            if let Some(i) = controls.hover {
                tracing::debug!(hover = i, "map hover");
            }
            dirty = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{sample, RadiusScale};
    use crate::timefmt::TimeNormalizer;

    /// Three observations of the given radius in metres
    fn index(radius: f64) -> SnapshotIndex {
        let mut heavy = sample("2018-11-30T05:30:00Z", 46.90, -48.20);
        heavy.mass = 3000.0;
        let records = vec![
            sample("2018-11-30T03:30:00Z", 46.80, -48.10),
            sample("2018-11-30T04:30:00Z", 46.85, -48.15),
            heavy,
        ];
        SnapshotIndex::build(
            records
                .into_iter()
                .map(|mut r| {
                    r.radius = radius;
                    r
                })
                .collect(),
            TimeNormalizer::default(),
            RadiusScale::new(10_000.0),
        )
    }

    #[test]
    fn draws_title_legend_and_blobs() {
        let idx = index(100.0);
        let mut term = Terminal::offscreen(60, 20);
        draw(&mut term, &idx, idx.bounding_box(0.02), None);

        assert!(term.row_text(0).contains(MAP_TITLE));
        assert!(term.row_text(17).contains("● 1500"));
        assert!(term.row_text(18).contains("● 3000"));
        assert!(term.row_text(19).starts_with("3 observations"));

        let braille = (1..19)
            .flat_map(|y| term.row_text(y).chars().collect::<Vec<_>>())
            .filter(|c| ('\u{2801}'..='\u{28ff}').contains(c))
            .count();
        assert!(braille > 0);
    }

    #[test]
    fn hovered_blob_gets_a_tooltip() {
        let idx = index(100.0);
        let mut term = Terminal::offscreen(60, 20);
        draw(&mut term, &idx, idx.bounding_box(0.02), Some(0));
        let text: Vec<String> = (0..20).map(|y| term.row_text(y)).collect();
        assert!(text.iter().any(|l| l.contains("DateTime: 2018-11-30 00:00")));
        assert!(text.iter().any(|l| l.contains("Radius: 100.0000")));
    }

    #[test]
    fn legend_stays_readable_over_markers() {
        // blobs this large cover the whole canvas
        let idx = index(25_000.0);
        let mut term = Terminal::offscreen(60, 20);
        draw(&mut term, &idx, idx.bounding_box(0.02), None);

        assert!(term.row_text(17).ends_with(" ● 1500"));
        assert!(term.row_text(18).ends_with(" ● 3000"));
        let covered = term.row_text(10);
        assert_eq!(covered.chars().count(), 60);
        assert!(!covered.contains(' '));
    }

    #[test]
    fn tiny_terminal_only_gets_the_title() {
        let idx = index(100.0);
        let mut term = Terminal::offscreen(30, 2);
        draw(&mut term, &idx, idx.bounding_box(0.02), None);
        assert!(term.row_text(0).contains("Oil Spill"));
        assert_eq!(term.row_text(1), "");
    }
}
