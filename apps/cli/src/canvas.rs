use courtside_core::{
    Canvas, DisplayList, Result, Size,
    overlay::{Color, Rect, TextStyle},
};
use indicatif::ProgressBar;

/// Prints every finished frame as one line of JSON draw commands.
#[derive(Default)]
pub struct JsonLinesCanvas {
    list: DisplayList,
}

impl Canvas for JsonLinesCanvas {
    fn size(&self) -> Size {
        self.list.size()
    }

    fn resize(&mut self, size: Size) {
        self.list.resize(size);
    }

    fn clear(&mut self) {
        self.list.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.list.fill_rect(rect, color);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        self.list.fill_text(text, x, y, style);
    }

    fn flush(&mut self) -> Result<()> {
        println!("{}", serde_json::to_string(self.list.commands())?);
        Ok(())
    }
}

/// Shows the overlay text of each frame as the message of a progress bar.
pub struct HudCanvas {
    list: DisplayList,
    bar: ProgressBar,
}

impl HudCanvas {
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            list: DisplayList::new(),
            bar,
        }
    }
}

impl Canvas for HudCanvas {
    fn size(&self) -> Size {
        self.list.size()
    }

    fn resize(&mut self, size: Size) {
        self.list.resize(size);
    }

    fn clear(&mut self) {
        self.list.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.list.fill_rect(rect, color);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle) {
        self.list.fill_text(text, x, y, style);
    }

    fn flush(&mut self) -> Result<()> {
        let hud = self.list.texts().collect::<Vec<_>>().join(" | ");
        self.bar.set_message(hud);
        Ok(())
    }
}
