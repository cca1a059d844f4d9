use crate::geometry::Rect;
use crate::size_hints::SizeHints;
use x11rb::protocol::xproto::Window;

pub type TagMask = u32;

pub const BROKEN: &str = "broken";

#[derive(Debug, Clone)]
pub struct Client {
    pub name: String,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub old_x: i32,
    pub old_y: i32,
    pub old_width: i32,
    pub old_height: i32,
    pub base_width: i32,
    pub base_height: i32,
    pub increment_width: i32,
    pub increment_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub hints_valid: bool,
    pub border_width: i32,
    pub old_border_width: i32,
    pub tags: TagMask,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    pub old_state: bool,
    pub is_fullscreen: bool,
    pub monitor_index: usize,
    pub window: Window,
}

impl Client {
    pub fn new(window: Window, monitor_index: usize, tags: TagMask) -> Self {
        Self {
            name: BROKEN.to_string(),
            min_aspect: 0.0,
            max_aspect: 0.0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            old_x: 0,
            old_y: 0,
            old_width: 0,
            old_height: 0,
            base_width: 0,
            base_height: 0,
            increment_width: 0,
            increment_height: 0,
            max_width: 0,
            max_height: 0,
            min_width: 0,
            min_height: 0,
            hints_valid: false,
            border_width: 0,
            old_border_width: 0,
            tags,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            old_state: false,
            is_fullscreen: false,
            monitor_index,
            window,
        }
    }

    pub fn width_with_border(&self) -> i32 {
        self.width + 2 * self.border_width
    }

    pub fn height_with_border(&self) -> i32 {
        self.height + 2 * self.border_width
    }

    pub fn geometry(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Stores the current geometry as the previous one and adopts `geometry`.
    pub fn set_geometry(&mut self, geometry: Rect) {
        self.old_x = self.x;
        self.old_y = self.y;
        self.old_width = self.width;
        self.old_height = self.height;
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.w;
        self.height = geometry.h;
    }

    pub fn old_geometry(&self) -> Rect {
        Rect::new(self.old_x, self.old_y, self.old_width, self.old_height)
    }

    pub fn is_visible_on(&self, tagset: TagMask) -> bool {
        self.tags & tagset != 0
    }

    /// ICCCM fallbacks: a missing base size is taken from the minimum and vice versa.
    pub fn update_size_hints(&mut self, hints: Option<&SizeHints>) {
        let hints = hints.copied().unwrap_or_default();

        (self.base_width, self.base_height) = hints.base.or(hints.min).unwrap_or((0, 0));
        (self.increment_width, self.increment_height) = hints.increment.unwrap_or((0, 0));
        (self.max_width, self.max_height) = hints.max.unwrap_or((0, 0));
        (self.min_width, self.min_height) = hints.min.or(hints.base).unwrap_or((0, 0));

        match hints.aspect {
            Some(((min_x, min_y), (max_x, max_y))) if min_x != 0 && max_y != 0 => {
                self.min_aspect = min_y as f32 / min_x as f32;
                self.max_aspect = max_x as f32 / max_y as f32;
            }
            _ => {
                self.min_aspect = 0.0;
                self.max_aspect = 0.0;
            }
        }

        self.is_fixed = self.max_width > 0
            && self.max_height > 0
            && self.max_width == self.min_width
            && self.max_height == self.min_height;
        self.hints_valid = true;
    }
}
