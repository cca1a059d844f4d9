use super::{ArrangeParams, TiledClient};
use crate::geometry::Rect;
use x11rb::protocol::xproto::Window;

/// Clients keep whatever geometry they or the user chose.
pub fn floating(
    _params: &ArrangeParams,
    _tiled: &[TiledClient],
    _place: &mut dyn FnMut(Window, Rect) -> Rect,
) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::super::test_util::{clients, record};
    use super::super::{ArrangeParams, LayoutType};
    use crate::geometry::Rect;

    #[test]
    fn floating_places_nothing() {
        let params = ArrangeParams {
            window_area: Rect::new(0, 0, 100, 100),
            mfact: 0.5,
            nmaster: 1,
            visible_count: 2,
        };
        let (placed, symbol) = record(&params, LayoutType::Floating, &clients(2, 1));
        assert!(placed.is_empty());
        assert_eq!(symbol, None);
        assert!(!LayoutType::Floating.arranges());
        assert!(LayoutType::Tile.arranges());
    }
}
