use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 1.0);
    pub const YELLOW: Color = Color::rgba(255, 255, 0, 1.0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    /// CSS notation, ready for a 2D context `fillStyle`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font: String,
    pub color: Color,
    pub align: TextAlign,
}

/// One primitive of an overlay frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Resize { size: Size },
    Clear,
    FillRect { rect: Rect, color: Color },
    FillText { text: String, x: f64, y: f64, style: TextStyle },
}

/// Drawing surface layered over the video.
///
/// `size` is the backing-store size, which the renderer keeps equal to the
/// video's rendered box. `flush` is called once a frame is complete.
pub trait Canvas {
    fn size(&self) -> Size;
    fn resize(&mut self, size: Size);
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle);

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Recording canvas. Holds the commands of the frame being drawn; a front end
/// replays them onto a real 2D context.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayList {
    size: Size,
    commands: Vec<DrawCommand>,
    resizes: u32,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// How many times the backing store changed size.
    pub fn resizes(&self) -> u32 {
        self.resizes
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = (&Rect, &Color)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillRect { rect, color } => Some((rect, color)),
            _ => None,
        })
    }
}

impl Canvas for DisplayList {
    fn size(&self) -> Size {
        self.size
    }

    fn resize(&mut self, size: Size) {
        self.size = size;
        self.resizes += 1;
        self.commands.push(DrawCommand::Resize { size });
    }

    /// Clearing starts a new frame, so earlier commands are discarded. A resize
    /// issued just before the clear is kept so replays pick up the new size.
    fn clear(&mut self) {
        let resize = match self.commands.last() {
            Some(command @ DrawCommand::Resize { .. }) => Some(command.clone()),
            _ => None,
        };
        self.commands.clear();
        self.commands.extend(resize);
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            style: style.clone(),
        });
    }
}
