use super::{ArrangeParams, TiledClient};
use crate::geometry::Rect;
use x11rb::protocol::xproto::Window;

/// Master column on the left holding up to `nmaster` clients, the rest
/// stacked on the right. Each client divides the space still left, so any
/// rounding remainder falls to the later clients.
pub fn tile(
    params: &ArrangeParams,
    tiled: &[TiledClient],
    place: &mut dyn FnMut(Window, Rect) -> Rect,
) {
    let n = tiled.len() as i32;
    if n == 0 {
        return;
    }

    let area = params.window_area;
    let master_width = if n > params.nmaster {
        if params.nmaster > 0 {
            (area.w as f32 * params.mfact) as i32
        } else {
            0
        }
    } else {
        area.w
    };

    let master_count = n.min(params.nmaster);
    let mut master_y = 0;
    let mut stack_y = 0;

    for (i, client) in tiled.iter().enumerate() {
        let i = i as i32;
        let bw = client.border_width;

        if i < params.nmaster {
            let height = (area.h - master_y) / (master_count - i);
            let applied = place(
                client.window,
                Rect::new(
                    area.x,
                    area.y + master_y,
                    master_width - 2 * bw,
                    height - 2 * bw,
                ),
            );
            let applied_height = applied.h + 2 * bw;
            if master_y + applied_height < area.h {
                master_y += applied_height;
            }
        } else {
            let height = (area.h - stack_y) / (n - i);
            let applied = place(
                client.window,
                Rect::new(
                    area.x + master_width,
                    area.y + stack_y,
                    area.w - master_width - 2 * bw,
                    height - 2 * bw,
                ),
            );
            let applied_height = applied.h + 2 * bw;
            if stack_y + applied_height < area.h {
                stack_y += applied_height;
            }
        }
    }
}
