use super::font::Font;
use super::{Draw, Scheme};
use crate::ColorScheme;
use crate::errors::X11Error;
use crate::geometry::Rect;
use log::debug;
use std::borrow::Cow;
use std::mem::ManuallyDrop;
use std::os::raw::c_int;
use x11::xft::{
    XftColor, XftColorAllocValue, XftColorFree, XftDrawCreate, XftDrawDestroy, XftDrawStringUtf8,
};
use x11::xlib::{self, Display, GC, Pixmap, XErrorEvent};
use x11::xrender::XRenderColor;
use x11rb::protocol::xproto::Window;

const ELLIPSIS: &str = "...";

/// Xlib drawing errors are logged rather than fatal; a bar window may be
/// destroyed underneath a pending copy.
unsafe extern "C" fn log_xlib_error(_display: *mut Display, event: *mut XErrorEvent) -> c_int {
    if let Some(event) = unsafe { event.as_ref() } {
        debug!(
            "xlib error: request {} minor {} code {}",
            event.request_code, event.minor_code, event.error_code
        );
    }
    0
}

#[derive(Clone, Copy)]
struct SchemeColors {
    foreground: XftColor,
    background: XftColor,
}

/// Off-screen Xft renderer on its own Xlib display connection.
pub struct XftDrw {
    display: *mut Display,
    screen: i32,
    root: xlib::Window,
    width: i32,
    height: i32,
    drawable: Pixmap,
    gc: GC,
    font: ManuallyDrop<Font>,
    normal: SchemeColors,
    selected: SchemeColors,
    scheme: Scheme,
}

impl XftDrw {
    pub fn new(font_name: &str, normal: &ColorScheme, selected: &ColorScheme) -> Result<Self, X11Error> {
        unsafe {
            let display = xlib::XOpenDisplay(std::ptr::null());
            if display.is_null() {
                return Err(X11Error::DisplayOpenFailed);
            }
            xlib::XSetErrorHandler(Some(log_xlib_error));

            let screen = xlib::XDefaultScreen(display);
            let font = match Font::new(display, screen, font_name) {
                Ok(font) => font,
                Err(error) => {
                    xlib::XCloseDisplay(display);
                    return Err(error);
                }
            };

            let root = xlib::XRootWindow(display, screen);
            let width = xlib::XDisplayWidth(display, screen);
            let height = xlib::XDisplayHeight(display, screen);
            let depth = xlib::XDefaultDepth(display, screen) as u32;
            let drawable = xlib::XCreatePixmap(display, root, width as u32, height as u32, depth);
            let gc = xlib::XCreateGC(display, root, 0, std::ptr::null_mut());
            xlib::XSetLineAttributes(display, gc, 1, xlib::LineSolid, xlib::CapButt, xlib::JoinMiter);

            let mut drw = Self {
                display,
                screen,
                root,
                width,
                height,
                drawable,
                gc,
                font: ManuallyDrop::new(font),
                normal: SchemeColors {
                    foreground: std::mem::zeroed(),
                    background: std::mem::zeroed(),
                },
                selected: SchemeColors {
                    foreground: std::mem::zeroed(),
                    background: std::mem::zeroed(),
                },
                scheme: Scheme::Normal,
            };
            drw.normal = SchemeColors {
                foreground: drw.alloc_color(normal.foreground),
                background: drw.alloc_color(normal.background),
            };
            drw.selected = SchemeColors {
                foreground: drw.alloc_color(selected.foreground),
                background: drw.alloc_color(selected.background),
            };
            Ok(drw)
        }
    }

    fn alloc_color(&self, color: u32) -> XftColor {
        let red = ((color >> 16) & 0xFF) as u16;
        let green = ((color >> 8) & 0xFF) as u16;
        let blue = (color & 0xFF) as u16;

        let render_color = XRenderColor {
            red: red << 8 | red,
            green: green << 8 | green,
            blue: blue << 8 | blue,
            alpha: 0xFFFF,
        };

        unsafe {
            let mut xft_color: XftColor = std::mem::zeroed();
            XftColorAllocValue(
                self.display,
                xlib::XDefaultVisual(self.display, self.screen),
                xlib::XDefaultColormap(self.display, self.screen),
                &render_color,
                &mut xft_color,
            );
            xft_color
        }
    }

    fn free_color(&self, color: &mut XftColor) {
        unsafe {
            XftColorFree(
                self.display,
                xlib::XDefaultVisual(self.display, self.screen),
                xlib::XDefaultColormap(self.display, self.screen),
                color,
            );
        }
    }

    fn colors(&self) -> SchemeColors {
        match self.scheme {
            Scheme::Normal => self.normal,
            Scheme::Selected => self.selected,
        }
    }

    fn set_foreground(&self, color: &XftColor) {
        unsafe {
            xlib::XSetForeground(self.display, self.gc, color.pixel);
        }
    }
}

/// Longest prefix of `text` that fits in `available`, with an ellipsis
/// appended when anything was cut.
fn fit_to_width<'a>(text: &'a str, available: i32, width: impl Fn(&str) -> i32) -> Cow<'a, str> {
    if width(text) <= available {
        return Cow::Borrowed(text);
    }

    let ellipsis_width = width(ELLIPSIS);
    let mut end = 0;
    for (index, ch) in text.char_indices() {
        let next = index + ch.len_utf8();
        if width(&text[..next]) + ellipsis_width > available {
            break;
        }
        end = next;
    }

    if end == 0 {
        if ellipsis_width <= available {
            Cow::Borrowed(ELLIPSIS)
        } else {
            Cow::Borrowed("")
        }
    } else {
        Cow::Owned(format!("{}{}", &text[..end], ELLIPSIS))
    }
}

impl Draw for XftDrw {
    fn font_height(&self) -> i32 {
        self.font.height()
    }

    fn text_width(&self, text: &str) -> i32 {
        self.font.text_width(text)
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        unsafe {
            xlib::XFreePixmap(self.display, self.drawable);
            let depth = xlib::XDefaultDepth(self.display, self.screen) as u32;
            self.drawable = xlib::XCreatePixmap(
                self.display,
                self.root,
                width.max(1) as u32,
                height.max(1) as u32,
                depth,
            );
        }
    }

    fn set_scheme(&mut self, scheme: Scheme) {
        self.scheme = scheme;
    }

    fn rect(&mut self, geometry: Rect, filled: bool, invert: bool) {
        let colors = self.colors();
        self.set_foreground(if invert {
            &colors.background
        } else {
            &colors.foreground
        });
        unsafe {
            if filled {
                xlib::XFillRectangle(
                    self.display,
                    self.drawable,
                    self.gc,
                    geometry.x,
                    geometry.y,
                    geometry.w.max(0) as u32,
                    geometry.h.max(0) as u32,
                );
            } else {
                xlib::XDrawRectangle(
                    self.display,
                    self.drawable,
                    self.gc,
                    geometry.x,
                    geometry.y,
                    (geometry.w - 1).max(0) as u32,
                    (geometry.h - 1).max(0) as u32,
                );
            }
        }
    }

    fn text(&mut self, geometry: Rect, left_pad: i32, text: &str, invert: bool) -> i32 {
        if geometry.w <= 0 || geometry.h <= 0 {
            return geometry.x;
        }

        let colors = self.colors();
        let (background, foreground) = if invert {
            (colors.foreground, colors.background)
        } else {
            (colors.background, colors.foreground)
        };

        self.set_foreground(&background);
        unsafe {
            xlib::XFillRectangle(
                self.display,
                self.drawable,
                self.gc,
                geometry.x,
                geometry.y,
                geometry.w as u32,
                geometry.h as u32,
            );
        }

        let fitted = fit_to_width(text, geometry.w - left_pad, |part| self.font.text_width(part));
        if fitted.is_empty() {
            return geometry.x + geometry.w;
        }

        let baseline = geometry.y + (geometry.h - self.font.height()) / 2 + self.font.ascent();
        unsafe {
            let xft_draw = XftDrawCreate(
                self.display,
                self.drawable,
                xlib::XDefaultVisual(self.display, self.screen),
                xlib::XDefaultColormap(self.display, self.screen),
            );
            if xft_draw.is_null() {
                debug!("{}", X11Error::DrawCreateFailed);
                return geometry.x + geometry.w;
            }
            XftDrawStringUtf8(
                xft_draw,
                &foreground,
                self.font.raw(),
                geometry.x + left_pad,
                baseline,
                fitted.as_ptr(),
                fitted.len() as i32,
            );
            XftDrawDestroy(xft_draw);
        }

        geometry.x + geometry.w
    }

    fn present(&mut self, window: Window, geometry: Rect) {
        unsafe {
            xlib::XCopyArea(
                self.display,
                self.drawable,
                window as xlib::Window,
                self.gc,
                geometry.x,
                geometry.y,
                geometry.w.max(1) as u32,
                geometry.h.max(1) as u32,
                geometry.x,
                geometry.y,
            );
            xlib::XSync(self.display, xlib::False);
        }
    }
}

impl Drop for XftDrw {
    fn drop(&mut self) {
        let mut colors = [
            self.normal.foreground,
            self.normal.background,
            self.selected.foreground,
            self.selected.background,
        ];
        for color in &mut colors {
            self.free_color(color);
        }
        unsafe {
            ManuallyDrop::drop(&mut self.font);
            xlib::XFreePixmap(self.display, self.drawable);
            xlib::XFreeGC(self.display, self.gc);
            xlib::XCloseDisplay(self.display);
        }
    }
}
