mod bar;
mod drw;
mod font;

pub use bar::{BarContent, ClientTitle, click_target, draw_bar};
pub use drw::XftDrw;

use crate::geometry::Rect;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Normal,
    Selected,
}

/// Rendering primitives the status bar is drawn with. All drawing happens
/// off-screen until [`Draw::present`] copies it to a window.
pub trait Draw {
    fn font_height(&self) -> i32;
    fn text_width(&self, text: &str) -> i32;
    fn resize(&mut self, width: i32, height: i32);
    fn set_scheme(&mut self, scheme: Scheme);
    fn rect(&mut self, geometry: Rect, filled: bool, invert: bool);
    /// Fills `geometry` with the background and draws `text` after
    /// `left_pad`, truncating it to fit. Returns the right edge.
    fn text(&mut self, geometry: Rect, left_pad: i32, text: &str, invert: bool) -> i32;
    fn present(&mut self, window: Window, geometry: Rect);
}

/// Horizontal padding around every text cell.
pub fn padding(draw: &dyn Draw) -> i32 {
    draw.font_height()
}

/// Width of a text cell including its padding.
pub fn cell_width(draw: &dyn Draw, text: &str) -> i32 {
    draw.text_width(text) + padding(draw)
}

pub fn bar_height(draw: &dyn Draw) -> i32 {
    draw.font_height() + 2
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Scheme(Scheme),
        Rect(Rect, bool, bool),
        Text(Rect, String, bool),
        Present(Window, Rect),
    }

    /// Every character is 10 pixels wide and the font is 14 high.
    #[derive(Debug, Default)]
    pub struct RecordingDraw {
        pub ops: Vec<Op>,
    }

    impl Draw for RecordingDraw {
        fn font_height(&self) -> i32 {
            14
        }

        fn text_width(&self, text: &str) -> i32 {
            text.chars().count() as i32 * 10
        }

        fn resize(&mut self, _width: i32, _height: i32) {}

        fn set_scheme(&mut self, scheme: Scheme) {
            self.ops.push(Op::Scheme(scheme));
        }

        fn rect(&mut self, geometry: Rect, filled: bool, invert: bool) {
            self.ops.push(Op::Rect(geometry, filled, invert));
        }

        fn text(&mut self, geometry: Rect, _left_pad: i32, text: &str, invert: bool) -> i32 {
            self.ops.push(Op::Text(geometry, text.to_string(), invert));
            geometry.x + geometry.w
        }

        fn present(&mut self, window: Window, geometry: Rect) {
            self.ops.push(Op::Present(window, geometry));
        }
    }
}
