use crate::client::Client;
use crate::geometry::Rect;

pub mod flags {
    pub const P_MIN_SIZE: u32 = 1 << 4;
    pub const P_MAX_SIZE: u32 = 1 << 5;
    pub const P_RESIZE_INC: u32 = 1 << 6;
    pub const P_ASPECT: u32 = 1 << 7;
    pub const P_BASE_SIZE: u32 = 1 << 8;
}

pub mod offset {
    pub const FLAGS: usize = 0;
    pub const MIN_WIDTH: usize = 5;
    pub const MIN_HEIGHT: usize = 6;
    pub const MAX_WIDTH: usize = 7;
    pub const MAX_HEIGHT: usize = 8;
    pub const WIDTH_INC: usize = 9;
    pub const HEIGHT_INC: usize = 10;
    pub const MIN_ASPECT_X: usize = 11;
    pub const MIN_ASPECT_Y: usize = 12;
    pub const MAX_ASPECT_X: usize = 13;
    pub const MAX_ASPECT_Y: usize = 14;
    pub const BASE_WIDTH: usize = 15;
    pub const BASE_HEIGHT: usize = 16;
}

/// Decoded `WM_NORMAL_HINTS`. Fields whose flag is unset are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHints {
    pub base: Option<(i32, i32)>,
    pub min: Option<(i32, i32)>,
    pub max: Option<(i32, i32)>,
    pub increment: Option<(i32, i32)>,
    pub aspect: Option<((i32, i32), (i32, i32))>,
}

impl SizeHints {
    pub fn from_raw(values: &[u32]) -> Option<Self> {
        if values.len() <= offset::BASE_HEIGHT {
            return None;
        }

        let flags = values[offset::FLAGS];
        let pair = |flag: u32, a: usize, b: usize| {
            (flags & flag != 0).then(|| (values[a] as i32, values[b] as i32))
        };

        Some(Self {
            base: pair(flags::P_BASE_SIZE, offset::BASE_WIDTH, offset::BASE_HEIGHT),
            min: pair(flags::P_MIN_SIZE, offset::MIN_WIDTH, offset::MIN_HEIGHT),
            max: pair(flags::P_MAX_SIZE, offset::MAX_WIDTH, offset::MAX_HEIGHT),
            increment: pair(flags::P_RESIZE_INC, offset::WIDTH_INC, offset::HEIGHT_INC),
            aspect: (flags & flags::P_ASPECT != 0).then(|| {
                (
                    (
                        values[offset::MIN_ASPECT_X] as i32,
                        values[offset::MIN_ASPECT_Y] as i32,
                    ),
                    (
                        values[offset::MAX_ASPECT_X] as i32,
                        values[offset::MAX_ASPECT_Y] as i32,
                    ),
                )
            }),
        })
    }
}

/// Everything size-hint enforcement needs to know beyond the client itself.
#[derive(Debug, Clone, Copy)]
pub struct HintContext {
    pub interact: bool,
    pub screen_width: i32,
    pub screen_height: i32,
    pub work_area: Rect,
    pub bar_height: i32,
    pub respect_hints: bool,
}

/// Adjusts `geometry` in place and reports whether it now differs from the
/// client's current geometry.
pub fn apply_size_hints(client: &Client, geometry: &mut Rect, context: &HintContext) -> bool {
    let Rect {
        mut x,
        mut y,
        mut w,
        mut h,
    } = *geometry;
    let bw = client.border_width;

    w = w.max(1);
    h = h.max(1);

    if context.interact {
        if x > context.screen_width {
            x = context.screen_width - client.width_with_border();
        }
        if y > context.screen_height {
            y = context.screen_height - client.height_with_border();
        }
        if x + w + 2 * bw < 0 {
            x = 0;
        }
        if y + h + 2 * bw < 0 {
            y = 0;
        }
    } else {
        let area = &context.work_area;
        if x >= area.right() {
            x = area.right() - client.width_with_border();
        }
        if y >= area.bottom() {
            y = area.bottom() - client.height_with_border();
        }
        if x + w + 2 * bw <= area.x {
            x = area.x;
        }
        if y + h + 2 * bw <= area.y {
            y = area.y;
        }
    }

    h = h.max(context.bar_height);
    w = w.max(context.bar_height);

    if context.respect_hints {
        let base_is_min = client.base_width == client.min_width
            && client.base_height == client.min_height;

        if !base_is_min {
            w -= client.base_width;
            h -= client.base_height;
        }

        if client.min_aspect > 0.0 && client.max_aspect > 0.0 {
            if client.max_aspect < w as f32 / h as f32 {
                w = (h as f32 * client.max_aspect + 0.5) as i32;
            } else if client.min_aspect < h as f32 / w as f32 {
                h = (w as f32 * client.min_aspect + 0.5) as i32;
            }
        }

        if base_is_min {
            w -= client.base_width;
            h -= client.base_height;
        }

        if client.increment_width > 0 {
            w -= w % client.increment_width;
        }
        if client.increment_height > 0 {
            h -= h % client.increment_height;
        }

        w = (w + client.base_width).max(client.min_width);
        h = (h + client.base_height).max(client.min_height);

        if client.max_width > 0 {
            w = w.min(client.max_width);
        }
        if client.max_height > 0 {
            h = h.min(client.max_height);
        }
    }

    *geometry = Rect::new(x, y, w, h);
    x != client.x || y != client.y || w != client.width || h != client.height
}
