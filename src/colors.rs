use crossterm::style::Color;

/// First thirteen entries of the Category20 palette, used for mass classes
const CATEGORY: [(u8, u8, u8); 13] = [
    (0x1f, 0x77, 0xb4),
    (0xae, 0xc7, 0xe8),
    (0xff, 0x7f, 0x0e),
    (0xff, 0xbb, 0x78),
    (0x2c, 0xa0, 0x2c),
    (0x98, 0xdf, 0x8a),
    (0xd6, 0x27, 0x28),
    (0xff, 0x98, 0x96),
    (0x94, 0x67, 0xbd),
    (0xc5, 0xb0, 0xd5),
    (0x8c, 0x56, 0x4b),
    (0xc4, 0x9c, 0x94),
    (0xe3, 0x77, 0xc2),
];

pub fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

/// Color of the n-th mass category; wraps after thirteen
pub fn category_color(index: usize) -> Color {
    let (r, g, b) = CATEGORY[index % CATEGORY.len()];
    rgb(r, g, b)
}

/// Slider view layers, lowest first. Higher layers win a shared cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Layer {
    Background = 1,
    Path = 2,
    Snapshot = 3,
    Hover = 4,
}

impl Layer {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Layer::Background),
            2 => Some(Layer::Path),
            3 => Some(Layer::Snapshot),
            4 => Some(Layer::Hover),
            _ => None,
        }
    }

    pub fn color(self) -> (Color, bool) {
        match self {
            Layer::Background => (Color::DarkGrey, false),
            Layer::Path => (Color::Grey, false),
            Layer::Snapshot => (Color::White, true),
            Layer::Hover => (rgb(0xb2, 0x22, 0x22), true), // firebrick
        }
    }
}

pub const TITLE: Color = Color::White;
pub const TEXT: Color = Color::Grey;
pub const WARNING: Color = Color::Yellow;
