use crate::client::TagMask;
use crate::geometry::Rect;
use x11rb::protocol::xproto::Window;

pub const MFACT_MIN: f32 = 0.05;
pub const MFACT_MAX: f32 = 0.95;

/// Per-monitor defaults taken from the configuration.
#[derive(Debug, Clone)]
pub struct MonitorDefaults {
    pub mfact: f32,
    pub nmaster: i32,
    pub show_bar: bool,
    pub top_bar: bool,
    pub layout_symbol: String,
    pub layout_count: usize,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    pub num: usize,
    pub area: Rect,
    pub window_area: Rect,
    pub bar_y: i32,
    pub bar_window: Option<Window>,
    pub show_bar: bool,
    pub top_bar: bool,
    pub layout_symbol: String,
    pub mfact: f32,
    pub nmaster: i32,
    pub tagset: [TagMask; 2],
    pub selected_tags: usize,
    pub layouts: [usize; 2],
    pub selected_layout: usize,
    pub selected: Option<Window>,
    /// Attachment order, head first.
    pub clients: Vec<Window>,
    /// Recency order, most recently focused first.
    pub stack: Vec<Window>,
}

impl Monitor {
    pub fn new(num: usize, defaults: &MonitorDefaults) -> Self {
        Self {
            num,
            area: Rect::default(),
            window_area: Rect::default(),
            bar_y: 0,
            bar_window: None,
            show_bar: defaults.show_bar,
            top_bar: defaults.top_bar,
            layout_symbol: defaults.layout_symbol.clone(),
            mfact: defaults.mfact,
            nmaster: defaults.nmaster,
            tagset: [1, 1],
            selected_tags: 0,
            layouts: [0, 1 % defaults.layout_count.max(1)],
            selected_layout: 0,
            selected: None,
            clients: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn active_tags(&self) -> TagMask {
        self.tagset[self.selected_tags]
    }

    pub fn layout_index(&self) -> usize {
        self.layouts[self.selected_layout]
    }

    /// Recomputes the window area and bar position from the full area.
    pub fn update_bar_position(&mut self, bar_height: i32) {
        self.window_area = self.area;
        if self.show_bar {
            self.window_area.h -= bar_height;
            if self.top_bar {
                self.bar_y = self.window_area.y;
                self.window_area.y += bar_height;
            } else {
                self.bar_y = self.window_area.y + self.window_area.h;
            }
        } else {
            self.bar_y = -bar_height;
        }
    }

    pub fn bar_geometry(&self, bar_height: i32) -> Rect {
        Rect::new(self.window_area.x, self.bar_y, self.window_area.w, bar_height)
    }
}

/// Drops exact duplicates while keeping the first occurrence's position, the
/// way cloned outputs show up through Xinerama.
pub fn unique_geometries(rects: &[Rect]) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::with_capacity(rects.len());
    for rect in rects {
        let has_valid_dimensions = rect.w > 0 && rect.h > 0;
        if has_valid_dimensions && !unique.contains(rect) {
            unique.push(*rect);
        }
    }
    unique
}
