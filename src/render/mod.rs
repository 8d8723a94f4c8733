//! Terminal front ends: the static trajectory map and the time slider

pub mod canvas;
pub mod map;
pub mod slider;

use crate::colors;
use crate::help;
use crate::terminal::Terminal;
use crossterm::event::{KeyCode, KeyModifiers};

/// Key state shared by both views
#[derive(Debug, Default, Clone)]
pub struct Controls {
    pub show_help: bool,
    /// Index of the hovered blob within what is currently drawn
    pub hover: Option<usize>,
}

impl Controls {
    /// Handle the common keys. Returns true if the view should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, count: usize) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Tab => self.hover_next(count),
            KeyCode::BackTab => self.hover_prev(count),
            _ => {}
        }
        false
    }

    pub fn hover_next(&mut self, count: usize) {
        self.hover = match (self.hover, count) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), n) if i + 1 >= n => None,
            (Some(i), _) => Some(i + 1),
        };
    }

    pub fn hover_prev(&mut self, count: usize) {
        self.hover = match (self.hover, count) {
            (_, 0) => None,
            (None, n) => Some(n - 1),
            (Some(0), _) => None,
            (Some(i), n) => Some((i - 1).min(n - 1)),
        };
    }
}

/// Centered bold title on the first row
pub fn draw_title(term: &mut Terminal, title: &str) {
    let (width, _) = term.size();
    let x = (width as usize).saturating_sub(title.chars().count()) / 2;
    term.set_str(x as i32, 0, title, Some(colors::TITLE), true);
}

/// Tooltip box next to a cell, pushed back inside the screen if needed
pub fn draw_tooltip(term: &mut Terminal, anchor: (i32, i32), lines: &[String]) {
    let (width, height) = term.size();
    let (box_w, box_h) = help::box_size(lines);
    let (ax, ay) = (anchor.0.max(0) as usize, anchor.1.max(0) as usize);

    let x = if ax + 2 + box_w <= width as usize {
        ax + 2
    } else {
        ax.saturating_sub(box_w + 1)
    };
    let y = (ay + 1).min((height as usize).saturating_sub(box_h));
    help::draw_box(term, x, y, lines);
}
