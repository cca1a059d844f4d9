//! A scripted connection that records every request it receives.

use super::{
    ClientState, ConfigureRequest, CursorKind, WindowAttributes, WindowType, WmHints, WmProtocol,
    XConn, XEvent,
};
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::keysyms::Keysym;
use crate::size_hints::SizeHints;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use x11rb::protocol::xproto::Window;

pub const ROOT: Window = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MoveResize(Window, Rect, i32),
    Move(Window, i32, i32),
    ConfigureNotify(Window, Rect, i32),
    Forward(ConfigureRequest),
    BorderWidth(Window, i32),
    BorderColor(Window, u32),
    Map(Window),
    Raise(Window),
    StackBelow(Window, Window),
    Focus(Window),
    ActiveWindow(Option<Window>),
    AppendClientList(Window),
    ClientList(Vec<Window>),
    Fullscreen(Window, bool),
    SendProtocol(Window, WmProtocol),
    Kill(Window),
    Urgency(Window, bool),
    SetState(Window, ClientState),
    SelectInput(Window),
    GrabKeys(Vec<(u16, Keysym)>),
    GrabButtons(Window, bool),
    ReplayPointer,
    GrabPointer(CursorKind),
    UngrabPointer,
    Warp(Window, i32, i32),
    CreateBar(Window, Rect),
    Destroy(Window),
    DiscardEnter,
}

#[derive(Default)]
pub struct MockXConn {
    pub screen: Cell<(i32, i32)>,
    pub rects: RefCell<Vec<Rect>>,
    pub events: RefCell<VecDeque<XEvent>>,
    pub calls: RefCell<Vec<Call>>,
    pub titles: RefCell<HashMap<Window, String>>,
    pub root_name: RefCell<Option<String>>,
    pub class_hints: RefCell<HashMap<Window, (String, String)>>,
    pub transients: RefCell<HashMap<Window, Window>>,
    pub size_hints: RefCell<HashMap<Window, SizeHints>>,
    pub wm_hints: RefCell<HashMap<Window, WmHints>>,
    pub window_types: RefCell<HashMap<Window, WindowType>>,
    pub protocols: RefCell<HashMap<Window, Vec<WmProtocol>>>,
    pub attributes: RefCell<HashMap<Window, WindowAttributes>>,
    pub client_states: RefCell<HashMap<Window, ClientState>>,
    pub keysyms: RefCell<HashMap<u8, Keysym>>,
    pub pointer: Cell<Option<(i32, i32)>>,
    pub refuse_pointer_grab: Cell<bool>,
    next_bar: Cell<Window>,
}

impl MockXConn {
    pub fn new(rects: &[Rect]) -> Self {
        let width = rects.iter().map(|r| r.right()).max().unwrap_or(0);
        let height = rects.iter().map(|r| r.bottom()).max().unwrap_or(0);
        let conn = Self::default();
        conn.screen.set((width, height));
        *conn.rects.borrow_mut() = rects.to_vec();
        conn.next_bar.set(10_000);
        conn
    }

    /// Makes `window` look like a regular top-level window at `geometry`.
    pub fn add_window(&self, window: Window, geometry: Rect) {
        self.attributes.borrow_mut().insert(
            window,
            WindowAttributes {
                override_redirect: false,
                viewable: true,
                geometry,
                border_width: 0,
            },
        );
    }

    pub fn push_event(&self, event: XEvent) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) -> WmResult<()> {
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl XConn for MockXConn {
    fn root(&self) -> Window {
        ROOT
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen.get()
    }

    fn screen_rects(&self) -> WmResult<Vec<Rect>> {
        Ok(self.rects.borrow().clone())
    }

    fn next_event(&self) -> WmResult<XEvent> {
        self.events
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("event script exhausted").into())
    }

    fn flush(&self) -> WmResult<()> {
        Ok(())
    }

    fn discard_enter_events(&self) -> WmResult<()> {
        self.events
            .borrow_mut()
            .retain(|event| !matches!(event, XEvent::EnterNotify { .. }));
        self.record(Call::DiscardEnter)
    }

    fn become_wm(&self) -> WmResult<()> {
        Ok(())
    }

    fn init_root(&self, _wm_name: &str) -> WmResult<()> {
        Ok(())
    }

    fn cleanup(&self) -> WmResult<()> {
        Ok(())
    }

    fn query_tree(&self) -> WmResult<Vec<Window>> {
        let mut windows: Vec<Window> = self.attributes.borrow().keys().copied().collect();
        windows.sort();
        Ok(windows)
    }

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
        self.attributes.borrow().get(&window).copied()
    }

    fn client_state(&self, window: Window) -> Option<ClientState> {
        self.client_states.borrow().get(&window).copied()
    }

    fn set_client_state(&self, window: Window, state: ClientState) -> WmResult<()> {
        self.client_states.borrow_mut().insert(window, state);
        self.record(Call::SetState(window, state))
    }

    fn select_client_input(&self, window: Window) -> WmResult<()> {
        self.record(Call::SelectInput(window))
    }

    fn move_resize(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()> {
        self.record(Call::MoveResize(window, geometry, border_width))
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.record(Call::Move(window, x, y))
    }

    fn send_configure_notify(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()> {
        self.record(Call::ConfigureNotify(window, geometry, border_width))
    }

    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()> {
        self.record(Call::Forward(*request))
    }

    fn set_border_width(&self, window: Window, border_width: i32) -> WmResult<()> {
        self.record(Call::BorderWidth(window, border_width))
    }

    fn set_border_color(&self, window: Window, pixel: u32) -> WmResult<()> {
        self.record(Call::BorderColor(window, pixel))
    }

    fn map(&self, window: Window) -> WmResult<()> {
        self.record(Call::Map(window))
    }

    fn raise(&self, window: Window) -> WmResult<()> {
        self.record(Call::Raise(window))
    }

    fn stack_below(&self, window: Window, sibling: Window) -> WmResult<()> {
        self.record(Call::StackBelow(window, sibling))
    }

    fn set_input_focus(&self, window: Window) -> WmResult<()> {
        self.record(Call::Focus(window))
    }

    fn set_active_window(&self, window: Option<Window>) -> WmResult<()> {
        self.record(Call::ActiveWindow(window))
    }

    fn append_client_list(&self, window: Window) -> WmResult<()> {
        self.record(Call::AppendClientList(window))
    }

    fn set_client_list(&self, windows: &[Window]) -> WmResult<()> {
        self.record(Call::ClientList(windows.to_vec()))
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()> {
        self.record(Call::Fullscreen(window, fullscreen))
    }

    fn supports_protocol(&self, window: Window, protocol: WmProtocol) -> bool {
        self.protocols
            .borrow()
            .get(&window)
            .is_some_and(|protocols| protocols.contains(&protocol))
    }

    fn send_protocol(&self, window: Window, protocol: WmProtocol) -> WmResult<()> {
        self.record(Call::SendProtocol(window, protocol))
    }

    fn kill_client(&self, window: Window) -> WmResult<()> {
        self.record(Call::Kill(window))
    }

    fn window_title(&self, window: Window) -> Option<String> {
        self.titles.borrow().get(&window).cloned()
    }

    fn root_name(&self) -> Option<String> {
        self.root_name.borrow().clone()
    }

    fn class_hint(&self, window: Window) -> Option<(String, String)> {
        self.class_hints.borrow().get(&window).cloned()
    }

    fn transient_for(&self, window: Window) -> Option<Window> {
        self.transients.borrow().get(&window).copied()
    }

    fn size_hints(&self, window: Window) -> Option<SizeHints> {
        self.size_hints.borrow().get(&window).copied()
    }

    fn wm_hints(&self, window: Window) -> Option<WmHints> {
        self.wm_hints.borrow().get(&window).copied()
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()> {
        if let Some(hints) = self.wm_hints.borrow_mut().get_mut(&window) {
            hints.urgent = urgent;
        }
        self.record(Call::Urgency(window, urgent))
    }

    fn window_type(&self, window: Window) -> WindowType {
        self.window_types
            .borrow()
            .get(&window)
            .copied()
            .unwrap_or_default()
    }

    fn refresh_keyboard_mapping(&self) -> WmResult<()> {
        Ok(())
    }

    fn keycode_to_keysym(&self, keycode: u8) -> Keysym {
        self.keysyms.borrow().get(&keycode).copied().unwrap_or(0)
    }

    fn numlock_mask(&self) -> u16 {
        1 << 4
    }

    fn grab_keys(&self, keys: &[(u16, Keysym)]) -> WmResult<()> {
        self.record(Call::GrabKeys(keys.to_vec()))
    }

    fn grab_buttons(&self, window: Window, focused: bool, _buttons: &[(u16, u8)]) -> WmResult<()> {
        self.record(Call::GrabButtons(window, focused))
    }

    fn allow_replay_pointer(&self, _time: u32) -> WmResult<()> {
        self.record(Call::ReplayPointer)
    }

    fn grab_pointer(&self, cursor: CursorKind) -> WmResult<bool> {
        if self.refuse_pointer_grab.get() {
            return Ok(false);
        }
        self.record(Call::GrabPointer(cursor))?;
        Ok(true)
    }

    fn ungrab_pointer(&self) -> WmResult<()> {
        self.record(Call::UngrabPointer)
    }

    fn query_pointer(&self) -> Option<(i32, i32)> {
        self.pointer.get()
    }

    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.record(Call::Warp(window, x, y))
    }

    fn create_bar(&self, geometry: Rect) -> WmResult<Window> {
        let window = self.next_bar.get();
        self.next_bar.set(window + 1);
        self.record(Call::CreateBar(window, geometry))?;
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> WmResult<()> {
        self.record(Call::Destroy(window))
    }
}
