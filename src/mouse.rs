use crate::keyboard::handlers::{Arg, KeyAction, modifiers_to_mask};
use serde::Deserialize;
use x11rb::protocol::xproto::KeyButMask;

/// Where a button press landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ClickTarget {
    TagBar,
    LayoutSymbol,
    StatusText,
    WindowTitle,
    ClientWindow,
    RootWindow,
}

impl ClickTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        let target = match name {
            "TagBar" => Self::TagBar,
            "LayoutSymbol" => Self::LayoutSymbol,
            "StatusText" => Self::StatusText,
            "WindowTitle" => Self::WindowTitle,
            "ClientWindow" => Self::ClientWindow,
            "RootWindow" => Self::RootWindow,
            _ => return None,
        };
        Some(target)
    }
}

#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub click: ClickTarget,
    pub modifiers: Vec<KeyButMask>,
    pub button: u8,
    pub func: KeyAction,
    pub arg: Arg,
}

impl ButtonBinding {
    pub fn new(
        click: ClickTarget,
        modifiers: Vec<KeyButMask>,
        button: u8,
        func: KeyAction,
        arg: Arg,
    ) -> Self {
        Self {
            click,
            modifiers,
            button,
            func,
            arg,
        }
    }

    pub fn mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

/// `(modifiers, button)` pairs to grab on client windows.
pub fn client_buttons(bindings: &[ButtonBinding]) -> Vec<(u16, u8)> {
    bindings
        .iter()
        .filter(|binding| binding.click == ClickTarget::ClientWindow)
        .map(|binding| (binding.mask(), binding.button))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_client_window_bindings_are_grabbed() {
        let bindings = vec![
            ButtonBinding::new(ClickTarget::TagBar, vec![], 1, KeyAction::View, Arg::None),
            ButtonBinding::new(
                ClickTarget::ClientWindow,
                vec![KeyButMask::MOD1],
                3,
                KeyAction::ResizeMouse,
                Arg::None,
            ),
        ];
        assert_eq!(client_buttons(&bindings), vec![(u16::from(KeyButMask::MOD1), 3)]);
    }
}
