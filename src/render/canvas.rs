//! Braille dot canvas and the lon/lat → dot projection
//!
//! Each terminal cell holds a 2×4 block of braille dots, which makes a dot
//! close to square on common fonts. Dots carry a small level value; when a
//! cell is flushed the highest level present decides its color.

use crate::snapshot::BoundingBox;
use crate::terminal::Terminal;
use crossterm::style::Color;

const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

pub struct BrailleCanvas {
    width: usize,
    height: usize,
    dots: Vec<Vec<u8>>,
}

impl BrailleCanvas {
    /// Canvas covering `cols` × `rows` terminal cells
    pub fn new(cols: u16, rows: u16) -> Self {
        let width = cols as usize * 2;
        let height = rows as usize * 4;
        Self {
            width,
            height,
            dots: vec![vec![0; width]; height],
        }
    }

    /// Size in dots
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn level(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 {
            return 0;
        }
        self.dots
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Raise a dot to `level`; lower levels never overwrite higher ones
    pub fn plot(&mut self, x: i32, y: i32, level: u8) {
        if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
            let cell = &mut self.dots[y as usize][x as usize];
            *cell = (*cell).max(level);
        }
    }

    /// Filled disc; radii below one dot still mark the center
    pub fn disc(&mut self, cx: i32, cy: i32, radius: f64, level: u8) {
        let r = radius.max(0.0);
        let reach = r.ceil() as i64;
        let r2 = r * r;
        let (cx64, cy64) = (cx as i64, cy as i64);
        // only walk the part of the bounding square that lands on the canvas
        let ys = cy64.saturating_sub(reach).max(0)..=cy64.saturating_add(reach).min(self.height as i64 - 1);
        let xs = cx64.saturating_sub(reach).max(0)..=cx64.saturating_add(reach).min(self.width as i64 - 1);
        for y in ys {
            for x in xs.clone() {
                let (dx, dy) = ((x - cx64) as f64, (y - cy64) as f64);
                if dx * dx + dy * dy <= r2 {
                    self.plot(x as i32, y as i32, level);
                }
            }
        }
        self.plot(cx, cy, level);
    }

    /// Bresenham line
    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), level: u8) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x, y, level);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Copy non-empty cells into the terminal buffer, offset by `top` rows
    pub fn blit<F>(&self, term: &mut Terminal, top: i32, mut color: F)
    where
        F: FnMut(u8) -> (Color, bool),
    {
        for cy in 0..self.height / 4 {
            for cx in 0..self.width / 2 {
                let mut bits = 0u8;
                let mut max_level = 0u8;
                for (row, row_bits) in DOT_BITS.iter().enumerate() {
                    for (col, bit) in row_bits.iter().enumerate() {
                        let level = self.dots[cy * 4 + row][cx * 2 + col];
                        if level > 0 {
                            bits |= bit;
                            max_level = max_level.max(level);
                        }
                    }
                }
                if bits > 0 {
                    let ch = char::from_u32(0x2800 + bits as u32).unwrap_or(' ');
                    let (fg, bold) = color(max_level);
                    term.set(cx as i32, top + cy as i32, ch, Some(fg), bold);
                }
            }
        }
    }
}

/// Maps a fixed viewport onto a dot grid, longitude on x and latitude on y
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    viewport: BoundingBox,
    width: usize,
    height: usize,
}

impl Projection {
    pub fn new(viewport: BoundingBox, canvas: &BrailleCanvas) -> Self {
        let (width, height) = canvas.size();
        Self {
            viewport,
            width,
            height,
        }
    }

    fn dots_per_lon(&self) -> f64 {
        let span = self.viewport.lon_span();
        if span > 0.0 {
            (self.width.saturating_sub(1)) as f64 / span
        } else {
            0.0
        }
    }

    fn dots_per_lat(&self) -> f64 {
        let span = self.viewport.lat_span();
        if span > 0.0 {
            (self.height.saturating_sub(1)) as f64 / span
        } else {
            0.0
        }
    }

    pub fn to_dot(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon - self.viewport.min_lon) * self.dots_per_lon();
        let y = (self.viewport.max_lat - lat) * self.dots_per_lat();
        // far off-canvas points only need to stay off-canvas
        let bound = 4.0 * (self.width + self.height) as f64;
        (
            x.round().clamp(-bound, bound) as i32,
            y.round().clamp(-bound, bound) as i32,
        )
    }

    /// Marker radius given in longitude units, as dots
    pub fn radius(&self, map_units: f64) -> f64 {
        map_units * self.dots_per_lon()
    }

    /// Cell that holds a dot
    pub fn cell_of(dot: (i32, i32)) -> (i32, i32) {
        (dot.0.div_euclid(2), dot.1.div_euclid(4))
    }
}
