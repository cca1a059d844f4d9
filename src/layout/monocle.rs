use super::{ArrangeParams, TiledClient};
use crate::geometry::Rect;
use x11rb::protocol::xproto::Window;

pub fn monocle(
    params: &ArrangeParams,
    tiled: &[TiledClient],
    place: &mut dyn FnMut(Window, Rect) -> Rect,
) -> Option<String> {
    let area = params.window_area;
    for client in tiled {
        let bw = client.border_width;
        place(
            client.window,
            Rect::new(area.x, area.y, area.w - 2 * bw, area.h - 2 * bw),
        );
    }

    (params.visible_count > 0).then(|| format!("[{}]", params.visible_count))
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{clients, record};
    use super::super::{ArrangeParams, LayoutType};
    use crate::geometry::Rect;

    fn params(visible_count: usize) -> ArrangeParams {
        ArrangeParams {
            window_area: Rect::new(0, 20, 800, 580),
            mfact: 0.55,
            nmaster: 1,
            visible_count,
        }
    }

    #[test]
    fn every_client_fills_the_window_area() {
        let (placed, symbol) = record(&params(4), LayoutType::Monocle, &clients(4, 2));
        assert_eq!(symbol.as_deref(), Some("[4]"));
        assert!(placed.iter().all(|(_, r)| *r == Rect::new(0, 20, 796, 576)));
        assert_eq!(placed.len(), 4);
    }

    #[test]
    fn floating_clients_count_towards_the_symbol() {
        let (placed, symbol) = record(&params(3), LayoutType::Monocle, &clients(1, 0));
        assert_eq!(symbol.as_deref(), Some("[3]"));
        assert_eq!(placed.len(), 1);
    }

    #[test]
    fn empty_monitor_keeps_the_symbol() {
        let (_, symbol) = record(&params(0), LayoutType::Monocle, &[]);
        assert_eq!(symbol, None);
    }
}
