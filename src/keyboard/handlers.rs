use crate::keyboard::keysyms::Keysym;
use serde::Deserialize;
use x11rb::protocol::xproto::KeyButMask;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum KeyAction {
    Spawn,
    KillClient,
    FocusStack,
    FocusMonitor,
    TagMonitor,
    IncNMaster,
    SetMFact,
    SetLayout,
    View,
    ToggleView,
    Tag,
    ToggleTag,
    ToggleBar,
    ToggleFloating,
    ToggleFullScreen,
    Zoom,
    MoveMouse,
    ResizeMouse,
    Quit,
    Restart,
}

impl KeyAction {
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "Spawn" => Self::Spawn,
            "KillClient" => Self::KillClient,
            "FocusStack" => Self::FocusStack,
            "FocusMonitor" => Self::FocusMonitor,
            "TagMonitor" => Self::TagMonitor,
            "IncNMaster" => Self::IncNMaster,
            "SetMFact" => Self::SetMFact,
            "SetLayout" => Self::SetLayout,
            "View" => Self::View,
            "ToggleView" => Self::ToggleView,
            "Tag" => Self::Tag,
            "ToggleTag" => Self::ToggleTag,
            "ToggleBar" => Self::ToggleBar,
            "ToggleFloating" => Self::ToggleFloating,
            "ToggleFullScreen" => Self::ToggleFullScreen,
            "Zoom" => Self::Zoom,
            "MoveMouse" => Self::MoveMouse,
            "ResizeMouse" => Self::ResizeMouse,
            "Quit" => Self::Quit,
            "Restart" => Self::Restart,
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Arg {
    #[default]
    None,
    Int(i32),
    UInt(u32),
    Float(f32),
    Str(String),
    Array(Vec<String>),
}

impl Arg {
    pub fn as_int(&self) -> i32 {
        match self {
            Arg::Int(value) => *value,
            Arg::UInt(value) => *value as i32,
            Arg::Float(value) => *value as i32,
            _ => 0,
        }
    }

    pub fn as_uint(&self) -> u32 {
        match self {
            Arg::UInt(value) => *value,
            Arg::Int(value) => *value as u32,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Arg::Float(value) => *value,
            Arg::Int(value) => *value as f32,
            _ => 0.0,
        }
    }

    /// The command line a spawn action runs. A single string goes through
    /// the shell.
    pub fn as_command(&self) -> Option<Vec<String>> {
        match self {
            Arg::Str(command) => Some(vec!["sh".into(), "-c".into(), command.clone()]),
            Arg::Array(argv) if !argv.is_empty() => Some(argv.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub modifiers: Vec<KeyButMask>,
    pub keysym: Keysym,
    pub func: KeyAction,
    pub arg: Arg,
}

impl KeyBinding {
    pub fn new(modifiers: Vec<KeyButMask>, keysym: Keysym, func: KeyAction, arg: Arg) -> Self {
        Self {
            modifiers,
            keysym,
            func,
            arg,
        }
    }

    pub fn mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

pub fn modifiers_to_mask(modifiers: &[KeyButMask]) -> u16 {
    modifiers
        .iter()
        .fold(0u16, |acc, &modifier| acc | u16::from(modifier))
}

/// Strips lock modifiers and anything that is not a real modifier key, so a
/// binding fires regardless of Caps Lock or Num Lock.
pub fn clean_mask(state: u16, numlock: u16) -> u16 {
    let modifiers = modifiers_to_mask(&[
        KeyButMask::SHIFT,
        KeyButMask::CONTROL,
        KeyButMask::MOD1,
        KeyButMask::MOD2,
        KeyButMask::MOD3,
        KeyButMask::MOD4,
        KeyButMask::MOD5,
    ]);
    state & !(numlock | u16::from(KeyButMask::LOCK)) & modifiers
}

/// Every binding for `keysym` whose modifiers equal the cleaned `state`.
pub fn matching_bindings<'a>(
    bindings: &'a [KeyBinding],
    keysym: Keysym,
    state: u16,
    numlock: u16,
) -> impl Iterator<Item = &'a KeyBinding> {
    let state = clean_mask(state, numlock);
    bindings.iter().filter(move |binding| {
        binding.keysym == keysym && clean_mask(binding.mask(), numlock) == state
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::keysyms;

    const NUMLOCK: u16 = 1 << 4;

    fn binding(modifiers: Vec<KeyButMask>, keysym: Keysym, func: KeyAction) -> KeyBinding {
        KeyBinding::new(modifiers, keysym, func, Arg::None)
    }

    #[test]
    fn lock_keys_do_not_affect_matching() {
        let state = u16::from(KeyButMask::MOD1) | u16::from(KeyButMask::LOCK) | NUMLOCK;
        assert_eq!(clean_mask(state, NUMLOCK), u16::from(KeyButMask::MOD1));
    }

    #[test]
    fn every_matching_binding_is_returned() {
        let bindings = vec![
            binding(vec![KeyButMask::MOD1], keysyms::XK_J, KeyAction::FocusStack),
            binding(vec![KeyButMask::MOD1, KeyButMask::SHIFT], keysyms::XK_J, KeyAction::Zoom),
            binding(vec![KeyButMask::MOD1], keysyms::XK_J, KeyAction::ToggleBar),
            binding(vec![KeyButMask::MOD1], keysyms::XK_K, KeyAction::Quit),
        ];
        let state = u16::from(KeyButMask::MOD1) | NUMLOCK;
        let actions: Vec<KeyAction> = matching_bindings(&bindings, keysyms::XK_J, state, NUMLOCK)
            .map(|binding| binding.func)
            .collect();
        assert_eq!(actions, vec![KeyAction::FocusStack, KeyAction::ToggleBar]);
    }

    #[test]
    fn string_commands_run_through_the_shell() {
        assert_eq!(
            Arg::Str("st -e htop".into()).as_command(),
            Some(vec!["sh".to_string(), "-c".to_string(), "st -e htop".to_string()])
        );
        assert_eq!(Arg::Array(vec![]).as_command(), None);
        assert_eq!(Arg::Int(3).as_command(), None);
    }

    #[test]
    fn action_names_round_trip() {
        assert_eq!(KeyAction::from_name("ToggleView"), Some(KeyAction::ToggleView));
        assert_eq!(KeyAction::from_name("Recompile"), None);
    }
}
