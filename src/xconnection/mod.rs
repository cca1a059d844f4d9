//! The boundary to the display server. Everything the window manager sends
//! to or reads from X goes through [`XConn`], so the core can be driven by a
//! recording connection in tests.

#[cfg(test)]
pub mod mock;
mod x11rb_conn;

pub use x11rb_conn::X11rbConnection;

use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::keysyms::Keysym;
use crate::size_hints::SizeHints;
use x11rb::protocol::xproto::Window;

/// Request opcodes and error codes used to classify protocol errors.
pub mod protocol {
    pub const X_CONFIGURE_WINDOW: u8 = 12;
    pub const X_GRAB_BUTTON: u8 = 28;
    pub const X_GRAB_KEY: u8 = 33;
    pub const X_SET_INPUT_FOCUS: u8 = 42;
    pub const X_COPY_AREA: u8 = 62;
    pub const X_POLY_SEGMENT: u8 = 66;
    pub const X_POLY_FILL_RECTANGLE: u8 = 70;
    pub const X_POLY_TEXT8: u8 = 74;

    pub const BAD_WINDOW: u8 = 3;
    pub const BAD_MATCH: u8 = 8;
    pub const BAD_DRAWABLE: u8 = 9;
    pub const BAD_ACCESS: u8 = 10;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolError {
    pub major_opcode: u8,
    pub error_code: u8,
}

impl ProtocolError {
    /// Errors caused by windows vanishing under our feet, or by requests we
    /// race against other clients for. These are expected and ignored.
    pub fn is_benign(&self) -> bool {
        use protocol::*;

        self.error_code == BAD_WINDOW
            || matches!(
                (self.major_opcode, self.error_code),
                (X_SET_INPUT_FOCUS, BAD_MATCH)
                    | (X_CONFIGURE_WINDOW, BAD_MATCH)
                    | (X_POLY_TEXT8, BAD_DRAWABLE)
                    | (X_POLY_FILL_RECTANGLE, BAD_DRAWABLE)
                    | (X_POLY_SEGMENT, BAD_DRAWABLE)
                    | (X_COPY_AREA, BAD_DRAWABLE)
                    | (X_GRAB_BUTTON, BAD_ACCESS)
                    | (X_GRAB_KEY, BAD_ACCESS)
            )
    }
}

/// Window properties the window manager reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    WmName,
    NetWmName,
    WmTransientFor,
    WmNormalHints,
    WmHints,
    NetWmWindowType,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Remove),
            1 => Some(Self::Add),
            2 => Some(Self::Toggle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// `_NET_WM_STATE` naming `_NET_WM_STATE_FULLSCREEN` in either slot.
    Fullscreen(StateAction),
    ActiveWindow,
    Other,
}

/// Only the fields a managed window's configure request can carry, each
/// present when the matching value-mask bit was set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub window: Window,
    pub button: u8,
    pub state: u16,
    /// Position relative to `window`.
    pub x: i32,
    pub y: i32,
    pub root_x: i32,
    pub root_y: i32,
    pub time: u32,
}

/// Notifications the window manager handles. Anything else the server
/// sends is dropped by the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum XEvent {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    ClientMessage {
        window: Window,
        message: ClientMessage,
    },
    ConfigureNotify {
        window: Window,
        width: i32,
        height: i32,
    },
    ConfigureRequest(ConfigureRequest),
    DestroyNotify {
        window: Window,
    },
    EnterNotify {
        window: Window,
        /// Normal-mode crossing that is not into an inferior window.
        ordinary: bool,
    },
    Expose {
        window: Window,
        count: u16,
    },
    FocusIn {
        window: Window,
    },
    KeyPress {
        keycode: u8,
        state: u16,
    },
    MappingNotify {
        keyboard: bool,
    },
    MapRequest {
        window: Window,
    },
    MotionNotify {
        window: Window,
        root_x: i32,
        root_y: i32,
        time: u32,
    },
    PropertyNotify {
        window: Window,
        property: Property,
        deleted: bool,
    },
    UnmapNotify {
        window: Window,
        synthetic: bool,
    },
    Error(ProtocolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ButtonPress,
    ButtonRelease,
    ClientMessage,
    ConfigureNotify,
    ConfigureRequest,
    DestroyNotify,
    EnterNotify,
    Expose,
    FocusIn,
    KeyPress,
    MappingNotify,
    MapRequest,
    MotionNotify,
    PropertyNotify,
    UnmapNotify,
    Error,
}

impl XEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ButtonPress(_) => EventKind::ButtonPress,
            Self::ButtonRelease(_) => EventKind::ButtonRelease,
            Self::ClientMessage { .. } => EventKind::ClientMessage,
            Self::ConfigureNotify { .. } => EventKind::ConfigureNotify,
            Self::ConfigureRequest(_) => EventKind::ConfigureRequest,
            Self::DestroyNotify { .. } => EventKind::DestroyNotify,
            Self::EnterNotify { .. } => EventKind::EnterNotify,
            Self::Expose { .. } => EventKind::Expose,
            Self::FocusIn { .. } => EventKind::FocusIn,
            Self::KeyPress { .. } => EventKind::KeyPress,
            Self::MappingNotify { .. } => EventKind::MappingNotify,
            Self::MapRequest { .. } => EventKind::MapRequest,
            Self::MotionNotify { .. } => EventKind::MotionNotify,
            Self::PropertyNotify { .. } => EventKind::PropertyNotify,
            Self::UnmapNotify { .. } => EventKind::UnmapNotify,
            Self::Error(_) => EventKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub override_redirect: bool,
    pub viewable: bool,
    pub geometry: Rect,
    pub border_width: i32,
}

/// ICCCM `WM_STATE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Withdrawn,
    Normal,
    Iconic,
}

impl ClientState {
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::Withdrawn => 0,
            Self::Normal => 1,
            Self::Iconic => 3,
        }
    }

    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Withdrawn),
            1 => Some(Self::Normal),
            3 => Some(Self::Iconic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WmHints {
    pub urgent: bool,
    /// The input field, when the client set it.
    pub input: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowType {
    pub fullscreen: bool,
    pub dialog: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmProtocol {
    DeleteWindow,
    TakeFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Normal,
    Resize,
    Move,
}

/// Everything the window manager asks of the display server.
///
/// Property reads return `Option` so a window that disappears mid-request is
/// simply treated as having no such property.
pub trait XConn {
    fn root(&self) -> Window;
    fn screen_size(&self) -> (i32, i32);
    /// Physical display rectangles, or the whole screen without Xinerama.
    fn screen_rects(&self) -> WmResult<Vec<Rect>>;

    fn next_event(&self) -> WmResult<XEvent>;
    fn flush(&self) -> WmResult<()>;
    /// Waits for the server to process everything sent and drops any
    /// EnterNotify events that were generated meanwhile.
    fn discard_enter_events(&self) -> WmResult<()>;

    /// Claims substructure redirection on the root window.
    fn become_wm(&self) -> WmResult<()>;
    /// Advertises EWMH support and selects the root event mask.
    fn init_root(&self, wm_name: &str) -> WmResult<()>;
    fn cleanup(&self) -> WmResult<()>;

    fn query_tree(&self) -> WmResult<Vec<Window>>;
    fn window_attributes(&self, window: Window) -> Option<WindowAttributes>;
    fn client_state(&self, window: Window) -> Option<ClientState>;
    fn set_client_state(&self, window: Window, state: ClientState) -> WmResult<()>;
    fn select_client_input(&self, window: Window) -> WmResult<()>;

    fn move_resize(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()>;
    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()>;
    /// Tells a client its geometry without changing it.
    fn send_configure_notify(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()>;
    /// Applies a configure request from an unmanaged window unchanged.
    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()>;
    fn set_border_width(&self, window: Window, border_width: i32) -> WmResult<()>;
    fn set_border_color(&self, window: Window, pixel: u32) -> WmResult<()>;
    fn map(&self, window: Window) -> WmResult<()>;
    fn raise(&self, window: Window) -> WmResult<()>;
    fn stack_below(&self, window: Window, sibling: Window) -> WmResult<()>;

    fn set_input_focus(&self, window: Window) -> WmResult<()>;
    fn set_active_window(&self, window: Option<Window>) -> WmResult<()>;
    fn append_client_list(&self, window: Window) -> WmResult<()>;
    fn set_client_list(&self, windows: &[Window]) -> WmResult<()>;
    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()>;
    fn supports_protocol(&self, window: Window, protocol: WmProtocol) -> bool;
    fn send_protocol(&self, window: Window, protocol: WmProtocol) -> WmResult<()>;
    fn kill_client(&self, window: Window) -> WmResult<()>;

    fn window_title(&self, window: Window) -> Option<String>;
    fn root_name(&self) -> Option<String>;
    /// `(instance, class)` from `WM_CLASS`.
    fn class_hint(&self, window: Window) -> Option<(String, String)>;
    fn transient_for(&self, window: Window) -> Option<Window>;
    fn size_hints(&self, window: Window) -> Option<SizeHints>;
    fn wm_hints(&self, window: Window) -> Option<WmHints>;
    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()>;
    fn window_type(&self, window: Window) -> WindowType;

    fn refresh_keyboard_mapping(&self) -> WmResult<()>;
    fn keycode_to_keysym(&self, keycode: u8) -> Keysym;
    fn numlock_mask(&self) -> u16;
    fn grab_keys(&self, keys: &[(u16, Keysym)]) -> WmResult<()>;
    /// Grabs `buttons` on a client, or every button when it is not focused
    /// so the first click can focus it.
    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[(u16, u8)]) -> WmResult<()>;
    fn allow_replay_pointer(&self, time: u32) -> WmResult<()>;

    /// Returns false when another client holds the pointer.
    fn grab_pointer(&self, cursor: CursorKind) -> WmResult<bool>;
    fn ungrab_pointer(&self) -> WmResult<()>;
    fn query_pointer(&self) -> Option<(i32, i32)>;
    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()>;

    fn create_bar(&self, geometry: Rect) -> WmResult<Window>;
    fn destroy_window(&self, window: Window) -> WmResult<()>;
}
