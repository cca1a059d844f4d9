use crate::errors::X11Error;
use std::ffi::CString;
use x11::xft::{XftFont, XftFontClose, XftFontOpenName, XftTextExtentsUtf8};
use x11::xlib::Display;

pub struct Font {
    xft_font: *mut XftFont,
    display: *mut Display,
}

impl Font {
    pub fn new(display: *mut Display, screen: i32, font_name: &str) -> Result<Self, X11Error> {
        let font_name_cstr =
            CString::new(font_name).map_err(|_| X11Error::FontLoadFailed(font_name.to_string()))?;

        let xft_font = unsafe { XftFontOpenName(display, screen, font_name_cstr.as_ptr()) };

        if xft_font.is_null() {
            return Err(X11Error::FontLoadFailed(font_name.to_string()));
        }

        Ok(Font { xft_font, display })
    }

    pub fn raw(&self) -> *mut XftFont {
        self.xft_font
    }

    pub fn height(&self) -> i32 {
        unsafe { (*self.xft_font).height }
    }

    pub fn ascent(&self) -> i32 {
        unsafe { (*self.xft_font).ascent }
    }

    pub fn text_width(&self, text: &str) -> i32 {
        unsafe {
            let mut extents = std::mem::zeroed();
            XftTextExtentsUtf8(
                self.display,
                self.xft_font,
                text.as_ptr(),
                text.len() as i32,
                &mut extents,
            );
            extents.xOff as i32
        }
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe {
            if !self.xft_font.is_null() {
                XftFontClose(self.display, self.xft_font);
            }
        }
    }
}
