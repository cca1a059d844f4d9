use super::{Draw, Scheme, cell_width, padding};
use crate::client::TagMask;
use crate::geometry::Rect;
use crate::mouse::ClickTarget;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy)]
pub struct ClientTitle<'a> {
    pub name: &'a str,
    pub is_floating: bool,
    pub is_fixed: bool,
}

/// Everything one monitor's bar shows.
#[derive(Debug, Clone, Copy)]
pub struct BarContent<'a> {
    pub window: Window,
    pub width: i32,
    pub height: i32,
    pub tags: &'a [String],
    pub active_tags: TagMask,
    pub occupied: TagMask,
    pub urgent: TagMask,
    /// Tags of the focused client, set only on the selected monitor.
    pub focused_tags: Option<TagMask>,
    pub layout_symbol: &'a str,
    pub title: Option<ClientTitle<'a>>,
    pub is_selected_monitor: bool,
    pub status: &'a str,
}

pub fn draw_bar(draw: &mut dyn Draw, bar: &BarContent) {
    let height = bar.height;
    let font_height = draw.font_height();
    let box_offset = font_height / 9;
    let box_size = font_height / 6 + 2;
    let half_pad = padding(draw) / 2;

    // status is only drawn on the selected monitor
    let mut status_width = 0;
    if bar.is_selected_monitor {
        draw.set_scheme(Scheme::Normal);
        status_width = draw.text_width(bar.status) + 2;
        draw.text(
            Rect::new(bar.width - status_width, 0, status_width, height),
            0,
            bar.status,
            false,
        );
    }

    let mut x = 0;
    for (index, tag) in bar.tags.iter().enumerate() {
        let mask = 1 << index;
        let width = cell_width(draw, tag);
        let urgent = bar.urgent & mask != 0;
        draw.set_scheme(if bar.active_tags & mask != 0 {
            Scheme::Selected
        } else {
            Scheme::Normal
        });
        draw.text(Rect::new(x, 0, width, height), half_pad, tag, urgent);
        if bar.occupied & mask != 0 {
            let filled = bar.focused_tags.is_some_and(|tags| tags & mask != 0);
            draw.rect(
                Rect::new(x + box_offset, box_offset, box_size, box_size),
                filled,
                urgent,
            );
        }
        x += width;
    }

    let width = cell_width(draw, bar.layout_symbol);
    draw.set_scheme(Scheme::Normal);
    x = draw.text(Rect::new(x, 0, width, height), half_pad, bar.layout_symbol, false);

    let remaining = bar.width - status_width - x;
    if remaining > height {
        match bar.title {
            Some(title) => {
                draw.set_scheme(if bar.is_selected_monitor {
                    Scheme::Selected
                } else {
                    Scheme::Normal
                });
                draw.text(Rect::new(x, 0, remaining, height), half_pad, title.name, false);
                if title.is_floating {
                    draw.rect(
                        Rect::new(x + box_offset, box_offset, box_size, box_size),
                        title.is_fixed,
                        false,
                    );
                }
            }
            None => {
                draw.set_scheme(Scheme::Normal);
                draw.rect(Rect::new(x, 0, remaining, height), true, true);
            }
        }
    }

    draw.present(bar.window, Rect::new(0, 0, bar.width, height));
}

/// Resolves a click at `x` on the selected monitor's bar. Tag clicks also
/// return the tag's index.
pub fn click_target(
    draw: &dyn Draw,
    tags: &[String],
    layout_symbol: &str,
    status: &str,
    bar_width: i32,
    x: i32,
) -> (ClickTarget, Option<usize>) {
    let mut right = 0;
    for (index, tag) in tags.iter().enumerate() {
        right += cell_width(draw, tag);
        if x < right {
            return (ClickTarget::TagBar, Some(index));
        }
    }

    if x < right + cell_width(draw, layout_symbol) {
        (ClickTarget::LayoutSymbol, None)
    } else if x > bar_width - cell_width(draw, status) {
        (ClickTarget::StatusText, None)
    } else {
        (ClickTarget::WindowTitle, None)
    }
}
