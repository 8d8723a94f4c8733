use crate::colors;
use crate::terminal::Terminal;

/// Key reference for the static map view
pub const MAP_HELP: &str = "\
TRAJECTORY MAP
─────────────────
Tab      Next blob
S-Tab    Previous blob
?        Close help
q/Esc    Quit";

/// Key reference for the slider view
pub const SLIDER_HELP: &str = "\
OIL DISTRIBUTION
─────────────────
←/h →/l  Move slider
Home/End Slider bounds
Tab      Next blob
S-Tab    Previous blob
o        Toggle path
?        Close help
q/Esc    Quit";

/// Width and height of the box `draw_box` would draw for these lines
pub fn box_size(lines: &[String]) -> (usize, usize) {
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (max_width + 4, lines.len() + 2)
}

/// Draw a bordered text box with its top-left corner at (x, y)
pub fn draw_box(term: &mut Terminal, x: usize, y: usize, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let (box_width, box_height) = box_size(lines);
    let inner = box_width - 4;
    let border = Some(colors::TITLE);
    let text = Some(colors::TEXT);

    let horizontal = "─".repeat(box_width - 2);
    term.set_str(x as i32, y as i32, &format!("┌{horizontal}┐"), border, false);
    for (i, line) in lines.iter().enumerate() {
        let row = (y + 1 + i) as i32;
        let padding = inner.saturating_sub(line.chars().count());
        term.set(x as i32, row, '│', border, false);
        term.set_str(x as i32 + 1, row, &format!(" {}{} ", line, " ".repeat(padding)), text, false);
        term.set((x + box_width - 1) as i32, row, '│', border, false);
    }
    let bottom = (y + box_height - 1) as i32;
    term.set_str(x as i32, bottom, &format!("└{horizontal}┘"), border, false);
}

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    let lines: Vec<String> = help_text.lines().map(String::from).collect();
    let (width, height) = term.size();
    let (box_width, box_height) = box_size(&lines);
    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;
    draw_box(term, start_x, start_y, &lines);
}
