pub mod floating;
pub mod monocle;
pub mod tiling;

use crate::geometry::Rect;
use serde::Deserialize;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LayoutType {
    Tile,
    Monocle,
    Floating,
}

impl LayoutType {
    pub fn default_symbol(&self) -> &'static str {
        match self {
            Self::Tile => "[]=",
            Self::Monocle => "[M]",
            Self::Floating => "><>",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "tile" | "tiling" => Ok(Self::Tile),
            "monocle" => Ok(Self::Monocle),
            "floating" | "float" => Ok(Self::Floating),
            _ => Err(format!("Invalid Layout Type: {}", s)),
        }
    }

    /// Floating performs no arrangement; everything else manages geometry.
    pub fn arranges(&self) -> bool {
        !matches!(self, Self::Floating)
    }

    /// Runs the layout. `place` receives the requested geometry of a tiled
    /// client (border already subtracted) and returns what was actually
    /// applied after size hints. A returned string replaces the monitor's
    /// layout symbol.
    pub fn arrange(
        &self,
        params: &ArrangeParams,
        tiled: &[TiledClient],
        place: &mut dyn FnMut(Window, Rect) -> Rect,
    ) -> Option<String> {
        match self {
            Self::Tile => {
                tiling::tile(params, tiled, place);
                None
            }
            Self::Monocle => monocle::monocle(params, tiled, place),
            Self::Floating => floating::floating(params, tiled, place),
        }
    }
}

/// A configured layout: the symbol shown in the bar and the algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub symbol: String,
    pub kind: LayoutType,
}

impl Layout {
    pub fn new(symbol: &str, kind: LayoutType) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
        }
    }

    pub fn defaults() -> Vec<Layout> {
        [LayoutType::Tile, LayoutType::Floating, LayoutType::Monocle]
            .into_iter()
            .map(|kind| Layout::new(kind.default_symbol(), kind))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArrangeParams {
    pub window_area: Rect,
    pub mfact: f32,
    pub nmaster: i32,
    /// Visible clients on the monitor, floating ones included.
    pub visible_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiledClient {
    pub window: Window,
    pub border_width: i32,
}
