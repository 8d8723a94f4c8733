use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

/// Back-buffered terminal surface
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    interactive: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

impl Terminal {
    /// Take over the real terminal: raw mode, alternate screen, hidden cursor
    pub fn interactive() -> io::Result<Self> {
        let (width, height) = size()?;
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen, Hide)?;
        let mut term = Self::offscreen(width, height);
        term.interactive = true;
        Ok(term)
    }

    /// A buffer of fixed size that never touches the tty
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            interactive: false,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Follow a terminal resize; the buffer is cleared
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    /// Re-read the tty size, resizing if it changed. Returns true on change.
    pub fn sync_size(&mut self) -> io::Result<bool> {
        if !self.interactive {
            return Ok(false);
        }
        let (w, h) = size()?;
        if (w, h) == (self.width, self.height) {
            return Ok(false);
        }
        self.resize(w, h);
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(true)
    }

    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.fill(Cell::default());
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Set a character at position with optional color
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bold };
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    /// Text of one buffer row, trailing blanks removed
    #[cfg(test)]
    pub fn row_text(&self, y: usize) -> String {
        self.buffer
            .get(y)
            .map(|row| row.iter().map(|c| c.ch).collect::<String>())
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }

    /// Styles are only emitted where they change along a row
    fn write_cells<W: Write>(&self, out: &mut W, position: bool) -> io::Result<()> {
        const PLAIN: (Option<Color>, bool) = (None, false);
        let mut style = PLAIN;
        for (y, row) in self.buffer.iter().enumerate() {
            if position {
                queue!(out, MoveTo(0, y as u16))?;
            }
            for cell in row {
                if (cell.fg, cell.bold) != style {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                    if cell.bold {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if let Some(color) = cell.fg {
                        queue!(out, SetForegroundColor(color))?;
                    }
                    style = (cell.fg, cell.bold);
                }
                queue!(out, Print(cell.ch))?;
            }
            if !position {
                if style != PLAIN {
                    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                    style = PLAIN;
                }
                queue!(out, Print('\n'))?;
            }
        }
        if style != PLAIN {
            queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        }
        out.flush()
    }

    /// Draw the whole buffer on the alternate screen
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        self.write_cells(&mut out, true)
    }

    /// Print the buffer as plain lines with colors (print mode)
    pub fn print_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_cells(out, false)
    }

    /// Wait up to `timeout_ms` for a key press
    pub fn poll_key(&self, timeout_ms: u64) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        if poll(Duration::from_millis(timeout_ms))? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = read()?
            {
                return Ok(Some((code, modifiers)));
            }
        }
        Ok(None)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.interactive {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}
