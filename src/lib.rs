pub mod bar;
pub mod client;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod keyboard;
pub mod layout;
pub mod monitor;
pub mod mouse;
pub mod rules;
pub mod size_hints;
pub mod spawn;
pub mod state;
pub mod window_manager;
pub mod xconnection;

pub mod prelude {
    pub use crate::ColorScheme;
    pub use crate::keyboard::{Arg, KeyAction, KeyBinding, keysyms};
    pub use crate::layout::{Layout, LayoutType};
    pub use crate::mouse::{ButtonBinding, ClickTarget};
    pub use crate::rules::Rule;
    pub use x11rb::protocol::xproto::KeyButMask;
}

use crate::errors::ConfigError;
use crate::keyboard::keysyms::{self, Keysym};
use crate::keyboard::{Arg, KeyAction, KeyBinding};
use crate::layout::Layout;
use crate::mouse::{ButtonBinding, ClickTarget};
use crate::rules::Rule;
use x11rb::protocol::xproto::KeyButMask;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tag masks are `u32` and the top bit is never a tag.
pub const MAX_TAGS: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub foreground: u32,
    pub background: u32,
    pub border: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Appearance
    pub border_width: i32,
    pub snap: i32,
    pub font: String,
    pub scheme_normal: ColorScheme,
    pub scheme_selected: ColorScheme,

    // Bar
    pub show_bar: bool,
    pub top_bar: bool,

    // Layout
    pub mfact: f32,
    pub nmaster: i32,
    pub resize_hints: bool,
    pub lock_fullscreen: bool,
    pub layouts: Vec<Layout>,

    // Tags and rules
    pub tags: Vec<String>,
    pub rules: Vec<Rule>,

    // Bindings
    pub terminal: String,
    pub modkey: KeyButMask,
    pub keybindings: Vec<KeyBinding>,
    pub buttons: Vec<ButtonBinding>,

    pub autostart: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tags.is_empty() || self.tags.len() > MAX_TAGS {
            return Err(ConfigError::ValidationError(format!(
                "between 1 and {MAX_TAGS} tags are required, got {}",
                self.tags.len()
            )));
        }
        if self.layouts.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one layout is required".to_string(),
            ));
        }
        if !(monitor::MFACT_MIN..=monitor::MFACT_MAX).contains(&self.mfact) {
            return Err(ConfigError::ValidationError(format!(
                "mfact {} is outside [{}, {}]",
                self.mfact,
                monitor::MFACT_MIN,
                monitor::MFACT_MAX
            )));
        }
        if self.nmaster < 0 || self.border_width < 0 || self.snap < 0 {
            return Err(ConfigError::ValidationError(
                "nmaster, border_width and snap must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// view, toggleview, tag and toggletag for one tag key.
pub fn tag_keys(modkey: KeyButMask, keysym: Keysym, tag: usize) -> Vec<KeyBinding> {
    const CONTROL: KeyButMask = KeyButMask::CONTROL;
    const SHIFT: KeyButMask = KeyButMask::SHIFT;
    let mask = Arg::UInt(1 << tag);

    vec![
        KeyBinding::new(vec![modkey], keysym, KeyAction::View, mask.clone()),
        KeyBinding::new(vec![modkey, CONTROL], keysym, KeyAction::ToggleView, mask.clone()),
        KeyBinding::new(vec![modkey, SHIFT], keysym, KeyAction::Tag, mask.clone()),
        KeyBinding::new(vec![modkey, CONTROL, SHIFT], keysym, KeyAction::ToggleTag, mask),
    ]
}

pub fn default_buttons(modkey: KeyButMask, terminal: &str) -> Vec<ButtonBinding> {
    use ClickTarget::*;

    vec![
        ButtonBinding::new(LayoutSymbol, vec![], 1, KeyAction::SetLayout, Arg::None),
        ButtonBinding::new(LayoutSymbol, vec![], 3, KeyAction::SetLayout, Arg::Int(2)),
        ButtonBinding::new(WindowTitle, vec![], 2, KeyAction::Zoom, Arg::None),
        ButtonBinding::new(StatusText, vec![], 2, KeyAction::Spawn, Arg::Str(terminal.to_string())),
        ButtonBinding::new(ClientWindow, vec![modkey], 1, KeyAction::MoveMouse, Arg::None),
        ButtonBinding::new(ClientWindow, vec![modkey], 2, KeyAction::ToggleFloating, Arg::None),
        ButtonBinding::new(ClientWindow, vec![modkey], 3, KeyAction::ResizeMouse, Arg::None),
        ButtonBinding::new(TagBar, vec![], 1, KeyAction::View, Arg::None),
        ButtonBinding::new(TagBar, vec![], 3, KeyAction::ToggleView, Arg::None),
        ButtonBinding::new(TagBar, vec![modkey], 1, KeyAction::Tag, Arg::None),
        ButtonBinding::new(TagBar, vec![modkey], 3, KeyAction::ToggleTag, Arg::None),
    ]
}

impl Default for Config {
    fn default() -> Self {
        const MODKEY: KeyButMask = KeyButMask::MOD1;
        const SHIFT: KeyButMask = KeyButMask::SHIFT;

        const TERMINAL: &str = "st";
        const FONT: &str = "monospace:size=10";

        let scheme_normal = ColorScheme {
            foreground: 0xbbbbbb,
            background: 0x222222,
            border: 0x444444,
        };
        let scheme_selected = ColorScheme {
            foreground: 0xeeeeee,
            background: 0x005577,
            border: 0x005577,
        };

        let dmenu: Vec<String> = [
            "dmenu_run", "-m", "0", "-fn", FONT, "-nb", "#222222", "-nf", "#bbbbbb", "-sb",
            "#005577", "-sf", "#eeeeee",
        ]
        .iter()
        .map(|part| part.to_string())
        .collect();

        let mut keybindings = vec![
            KeyBinding::new(vec![MODKEY], keysyms::XK_P, KeyAction::Spawn, Arg::Array(dmenu)),
            KeyBinding::new(
                vec![MODKEY, SHIFT],
                keysyms::XK_RETURN,
                KeyAction::Spawn,
                Arg::Array(vec![TERMINAL.to_string()]),
            ),
            KeyBinding::new(vec![MODKEY], keysyms::XK_B, KeyAction::ToggleBar, Arg::None),
            KeyBinding::new(vec![MODKEY], keysyms::XK_J, KeyAction::FocusStack, Arg::Int(1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_K, KeyAction::FocusStack, Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_I, KeyAction::IncNMaster, Arg::Int(1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_D, KeyAction::IncNMaster, Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_H, KeyAction::SetMFact, Arg::Float(-0.05)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_L, KeyAction::SetMFact, Arg::Float(0.05)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_RETURN, KeyAction::Zoom, Arg::None),
            KeyBinding::new(vec![MODKEY], keysyms::XK_TAB, KeyAction::View, Arg::UInt(0)),
            KeyBinding::new(vec![MODKEY, SHIFT], keysyms::XK_C, KeyAction::KillClient, Arg::None),
            KeyBinding::new(vec![MODKEY], keysyms::XK_T, KeyAction::SetLayout, Arg::Int(0)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_F, KeyAction::SetLayout, Arg::Int(1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_M, KeyAction::SetLayout, Arg::Int(2)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_SPACE, KeyAction::SetLayout, Arg::None),
            KeyBinding::new(
                vec![MODKEY, SHIFT],
                keysyms::XK_SPACE,
                KeyAction::ToggleFloating,
                Arg::None,
            ),
            KeyBinding::new(
                vec![MODKEY, SHIFT],
                keysyms::XK_F,
                KeyAction::ToggleFullScreen,
                Arg::None,
            ),
            KeyBinding::new(vec![MODKEY], keysyms::XK_0, KeyAction::View, Arg::UInt(!0)),
            KeyBinding::new(vec![MODKEY, SHIFT], keysyms::XK_0, KeyAction::Tag, Arg::UInt(!0)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_COMMA, KeyAction::FocusMonitor, Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY], keysyms::XK_PERIOD, KeyAction::FocusMonitor, Arg::Int(1)),
            KeyBinding::new(
                vec![MODKEY, SHIFT],
                keysyms::XK_COMMA,
                KeyAction::TagMonitor,
                Arg::Int(-1),
            ),
            KeyBinding::new(
                vec![MODKEY, SHIFT],
                keysyms::XK_PERIOD,
                KeyAction::TagMonitor,
                Arg::Int(1),
            ),
            KeyBinding::new(vec![MODKEY, SHIFT], keysyms::XK_Q, KeyAction::Quit, Arg::None),
            KeyBinding::new(vec![MODKEY, SHIFT], keysyms::XK_R, KeyAction::Restart, Arg::None),
        ];

        let digits = [
            keysyms::XK_1,
            keysyms::XK_2,
            keysyms::XK_3,
            keysyms::XK_4,
            keysyms::XK_5,
            keysyms::XK_6,
            keysyms::XK_7,
            keysyms::XK_8,
            keysyms::XK_9,
        ];
        for (tag, keysym) in digits.into_iter().enumerate() {
            keybindings.extend(tag_keys(MODKEY, keysym, tag));
        }

        Self {
            border_width: 1,
            snap: 32,
            font: FONT.to_string(),
            scheme_normal,
            scheme_selected,
            show_bar: true,
            top_bar: true,
            mfact: 0.55,
            nmaster: 1,
            resize_hints: true,
            lock_fullscreen: true,
            layouts: Layout::defaults(),
            tags: (1..=9).map(|tag| tag.to_string()).collect(),
            rules: vec![
                Rule {
                    class: Some("Gimp".to_string()),
                    instance: None,
                    title: None,
                    tags: 0,
                    is_floating: true,
                    monitor: -1,
                },
                Rule {
                    class: Some("Firefox".to_string()),
                    instance: None,
                    title: None,
                    tags: 1 << 8,
                    is_floating: false,
                    monitor: -1,
                },
            ],
            terminal: TERMINAL.to_string(),
            modkey: MODKEY,
            keybindings,
            buttons: default_buttons(MODKEY, TERMINAL),
            autostart: Vec::new(),
        }
    }
}
