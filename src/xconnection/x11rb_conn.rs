use super::{
    ButtonEvent, ClientMessage, ClientState, ConfigureRequest, CursorKind, Property,
    ProtocolError, StateAction, WindowAttributes, WindowType, WmHints, WmProtocol, XConn, XEvent,
};
use crate::errors::{WmResult, X11Error};
use crate::geometry::Rect;
use crate::keyboard::keysyms::{self, Keysym};
use crate::size_hints::SizeHints;
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use x11rb::COPY_DEPTH_FROM_PARENT;
use x11rb::CURRENT_TIME;
use x11rb::NONE;
use x11rb::connection::Connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::errors::ReplyError;
use x11rb::protocol::Event;
use x11rb::protocol::xinerama::ConnectionExt as _;
use x11rb::protocol::xproto::{
    Allow, AtomEnum, BackPixmap, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
    CloseDown, ConfigWindow, ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _,
    CreateWindowAux, Cursor, EventMask, Grab, GrabMode, GrabStatus, InputFocus, MapState, Mapping,
    ModMask, NotifyDetail, NotifyMode, PropMode, Property as PropertyState, StackMode, Window,
    WindowClass, CONFIGURE_NOTIFY_EVENT,
};
use x11rb::resource_manager;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        UTF8_STRING,
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        WM_STATE,
        WM_TAKE_FOCUS,
        _NET_ACTIVE_WINDOW,
        _NET_SUPPORTED,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_SUPPORTING_WM_CHECK,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DIALOG,
        _NET_CLIENT_LIST,
    }
}

const POINTER_ROOT: Window = 1;
const INPUT_HINT: u32 = 1;
const URGENCY_HINT: u32 = 1 << 8;

fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::POINTER_MOTION
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::PROPERTY_CHANGE
}

struct KeyboardMapping {
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<Keysym>,
}

struct Cursors {
    normal: Cursor,
    resize: Cursor,
    moving: Cursor,
}

pub struct X11rbConnection {
    connection: RustConnection,
    screen_number: usize,
    root: Window,
    atoms: Atoms,
    cursors: Cursors,
    keyboard: RefCell<KeyboardMapping>,
    pending: RefCell<VecDeque<Event>>,
    check_window: Cell<Option<Window>>,
}

impl X11rbConnection {
    pub fn connect() -> WmResult<Self> {
        let (connection, screen_number) = x11rb::connect(None)?;
        let root = connection.setup().roots[screen_number].root;
        let atoms = Atoms::new(&connection)?.reply()?;

        let database = resource_manager::new_from_default(&connection)?;
        let handle = CursorHandle::new(&connection, screen_number, &database)?.reply()?;
        let cursors = Cursors {
            normal: handle.load_cursor(&connection, "left_ptr")?,
            resize: handle.load_cursor(&connection, "sizing")?,
            moving: handle.load_cursor(&connection, "fleur")?,
        };

        let keyboard = RefCell::new(Self::fetch_keyboard_mapping(&connection)?);

        Ok(Self {
            connection,
            screen_number,
            root,
            atoms,
            cursors,
            keyboard,
            pending: RefCell::new(VecDeque::new()),
            check_window: Cell::new(None),
        })
    }

    fn fetch_keyboard_mapping(connection: &RustConnection) -> WmResult<KeyboardMapping> {
        let setup = connection.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let reply = connection
            .get_keyboard_mapping(min_keycode, count)?
            .reply()?;
        Ok(KeyboardMapping {
            min_keycode,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn keycodes_for(&self, keysym: Keysym) -> Vec<u8> {
        let mapping = self.keyboard.borrow();
        let per = mapping.keysyms_per_keycode.max(1) as usize;
        mapping
            .keysyms
            .chunks(per)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .filter_map(|(index, _)| u8::try_from(index + mapping.min_keycode as usize).ok())
            .collect()
    }

    fn property32(&self, window: Window, property: impl Into<u32>, kind: impl Into<u32>) -> Option<Vec<u32>> {
        let reply = self
            .connection
            .get_property(false, window, property, kind, 0, u32::MAX / 4)
            .ok()?
            .reply()
            .ok()?;
        Some(reply.value32()?.collect())
    }

    fn text_property(&self, window: Window, property: impl Into<u32>) -> Option<String> {
        let reply = self
            .connection
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX / 4)
            .ok()?
            .reply()
            .ok()?;
        let text = String::from_utf8_lossy(&reply.value)
            .trim_end_matches('\0')
            .to_string();
        (!text.is_empty()).then_some(text)
    }

    fn first_atom(&self, window: Window, property: u32) -> Option<u32> {
        self.property32(window, property, AtomEnum::ATOM)?.first().copied()
    }

    fn convert_event(&self, event: Event) -> Option<XEvent> {
        let atoms = &self.atoms;
        let converted = match event {
            Event::ButtonPress(e) => XEvent::ButtonPress(ButtonEvent {
                window: e.event,
                button: e.detail,
                state: u16::from(e.state),
                x: e.event_x.into(),
                y: e.event_y.into(),
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
                time: e.time,
            }),
            Event::ButtonRelease(e) => XEvent::ButtonRelease(ButtonEvent {
                window: e.event,
                button: e.detail,
                state: u16::from(e.state),
                x: e.event_x.into(),
                y: e.event_y.into(),
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
                time: e.time,
            }),
            Event::ClientMessage(e) => {
                let data = e.data.as_data32();
                let message = if e.type_ == atoms._NET_WM_STATE {
                    let fullscreen = atoms._NET_WM_STATE_FULLSCREEN;
                    match StateAction::from_raw(data[0]) {
                        Some(action) if data[1] == fullscreen || data[2] == fullscreen => {
                            ClientMessage::Fullscreen(action)
                        }
                        _ => ClientMessage::Other,
                    }
                } else if e.type_ == atoms._NET_ACTIVE_WINDOW {
                    ClientMessage::ActiveWindow
                } else {
                    ClientMessage::Other
                };
                XEvent::ClientMessage {
                    window: e.window,
                    message,
                }
            }
            Event::ConfigureNotify(e) => XEvent::ConfigureNotify {
                window: e.window,
                width: e.width.into(),
                height: e.height.into(),
            },
            Event::ConfigureRequest(e) => {
                let mask = e.value_mask;
                XEvent::ConfigureRequest(ConfigureRequest {
                    window: e.window,
                    x: mask.contains(ConfigWindow::X).then_some(e.x.into()),
                    y: mask.contains(ConfigWindow::Y).then_some(e.y.into()),
                    width: mask.contains(ConfigWindow::WIDTH).then_some(e.width.into()),
                    height: mask.contains(ConfigWindow::HEIGHT).then_some(e.height.into()),
                    border_width: mask
                        .contains(ConfigWindow::BORDER_WIDTH)
                        .then_some(e.border_width.into()),
                    sibling: mask.contains(ConfigWindow::SIBLING).then_some(e.sibling),
                    stack_mode: mask
                        .contains(ConfigWindow::STACK_MODE)
                        .then_some(u32::from(e.stack_mode)),
                })
            }
            Event::DestroyNotify(e) => XEvent::DestroyNotify { window: e.window },
            Event::EnterNotify(e) => XEvent::EnterNotify {
                window: e.event,
                ordinary: e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR,
            },
            Event::Expose(e) => XEvent::Expose {
                window: e.window,
                count: e.count,
            },
            Event::FocusIn(e) => XEvent::FocusIn { window: e.event },
            Event::KeyPress(e) => XEvent::KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
            },
            Event::MappingNotify(e) => XEvent::MappingNotify {
                keyboard: e.request == Mapping::KEYBOARD,
            },
            Event::MapRequest(e) => XEvent::MapRequest { window: e.window },
            Event::MotionNotify(e) => XEvent::MotionNotify {
                window: e.event,
                root_x: e.root_x.into(),
                root_y: e.root_y.into(),
                time: e.time,
            },
            Event::PropertyNotify(e) => {
                let property = match e.atom {
                    atom if atom == u32::from(AtomEnum::WM_NAME) => Property::WmName,
                    atom if atom == atoms._NET_WM_NAME => Property::NetWmName,
                    atom if atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) => {
                        Property::WmTransientFor
                    }
                    atom if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) => {
                        Property::WmNormalHints
                    }
                    atom if atom == u32::from(AtomEnum::WM_HINTS) => Property::WmHints,
                    atom if atom == atoms._NET_WM_WINDOW_TYPE => Property::NetWmWindowType,
                    _ => Property::Other,
                };
                XEvent::PropertyNotify {
                    window: e.window,
                    property,
                    deleted: e.state == PropertyState::DELETE,
                }
            }
            Event::UnmapNotify(e) => XEvent::UnmapNotify {
                window: e.window,
                synthetic: e.response_type & 0x80 != 0,
            },
            Event::Error(e) => XEvent::Error(ProtocolError {
                major_opcode: e.major_opcode,
                error_code: e.error_code,
            }),
            _ => return None,
        };
        Some(converted)
    }
}

impl XConn for X11rbConnection {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_size(&self) -> (i32, i32) {
        let screen = &self.connection.setup().roots[self.screen_number];
        (screen.width_in_pixels.into(), screen.height_in_pixels.into())
    }

    fn screen_rects(&self) -> WmResult<Vec<Rect>> {
        let active = match self.connection.xinerama_is_active() {
            Ok(cookie) => cookie.reply().map(|reply| reply.state != 0).unwrap_or(false),
            Err(_) => false,
        };

        if active {
            let reply = self.connection.xinerama_query_screens()?.reply()?;
            return Ok(reply
                .screen_info
                .iter()
                .map(|info| {
                    Rect::new(
                        info.x_org.into(),
                        info.y_org.into(),
                        info.width.into(),
                        info.height.into(),
                    )
                })
                .collect());
        }

        let (width, height) = self.screen_size();
        Ok(vec![Rect::new(0, 0, width, height)])
    }

    fn next_event(&self) -> WmResult<XEvent> {
        loop {
            let pending = self.pending.borrow_mut().pop_front();
            let event = match pending {
                Some(event) => event,
                None => self.connection.wait_for_event()?,
            };
            if let Some(event) = self.convert_event(event) {
                return Ok(event);
            }
        }
    }

    fn flush(&self) -> WmResult<()> {
        self.connection.flush()?;
        Ok(())
    }

    fn discard_enter_events(&self) -> WmResult<()> {
        // A round trip guarantees every event caused by earlier requests has arrived.
        self.connection.get_input_focus()?.reply()?;
        let mut pending = self.pending.borrow_mut();
        while let Some(event) = self.connection.poll_for_event()? {
            if !matches!(event, Event::EnterNotify(_)) {
                pending.push_back(event);
            }
        }
        pending.retain(|event| !matches!(event, Event::EnterNotify(_)));
        Ok(())
    }

    fn become_wm(&self) -> WmResult<()> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);
        match self.connection.change_window_attributes(self.root, &aux)?.check() {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(_)) => Err(X11Error::OtherWmRunning.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn init_root(&self, wm_name: &str) -> WmResult<()> {
        let atoms = &self.atoms;
        let check = self.connection.generate_id()?;
        self.connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            check,
            self.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::COPY_FROM_PARENT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;
        self.check_window.set(Some(check));

        for window in [check, self.root] {
            self.connection.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_SUPPORTING_WM_CHECK,
                AtomEnum::WINDOW,
                &[check],
            )?;
        }
        self.connection.change_property8(
            PropMode::REPLACE,
            check,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            wm_name.as_bytes(),
        )?;

        let supported = [
            atoms._NET_SUPPORTED,
            atoms._NET_WM_NAME,
            atoms._NET_WM_STATE,
            atoms._NET_SUPPORTING_WM_CHECK,
            atoms._NET_WM_STATE_FULLSCREEN,
            atoms._NET_ACTIVE_WINDOW,
            atoms._NET_WM_WINDOW_TYPE,
            atoms._NET_WM_WINDOW_TYPE_DIALOG,
            atoms._NET_CLIENT_LIST,
        ];
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            atoms._NET_SUPPORTED,
            AtomEnum::ATOM,
            &supported,
        )?;
        self.connection
            .delete_property(self.root, atoms._NET_CLIENT_LIST)?;

        self.connection.change_window_attributes(
            self.root,
            &ChangeWindowAttributesAux::new()
                .event_mask(root_event_mask())
                .cursor(self.cursors.normal),
        )?;
        self.connection.flush()?;
        Ok(())
    }

    fn cleanup(&self) -> WmResult<()> {
        self.connection
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        if let Some(check) = self.check_window.take() {
            self.connection.destroy_window(check)?;
        }
        for cursor in [self.cursors.normal, self.cursors.resize, self.cursors.moving] {
            self.connection.free_cursor(cursor)?;
        }
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, POINTER_ROOT, CURRENT_TIME)?;
        self.connection
            .delete_property(self.root, self.atoms._NET_ACTIVE_WINDOW)?;
        self.connection.get_input_focus()?.reply()?;
        Ok(())
    }

    fn query_tree(&self) -> WmResult<Vec<Window>> {
        Ok(self.connection.query_tree(self.root)?.reply()?.children)
    }

    fn window_attributes(&self, window: Window) -> Option<WindowAttributes> {
        let attributes = self
            .connection
            .get_window_attributes(window)
            .ok()?
            .reply()
            .ok()?;
        let geometry = self.connection.get_geometry(window).ok()?.reply().ok()?;
        Some(WindowAttributes {
            override_redirect: attributes.override_redirect,
            viewable: attributes.map_state == MapState::VIEWABLE,
            geometry: Rect::new(
                geometry.x.into(),
                geometry.y.into(),
                geometry.width.into(),
                geometry.height.into(),
            ),
            border_width: geometry.border_width.into(),
        })
    }

    fn client_state(&self, window: Window) -> Option<ClientState> {
        let state = self.atoms.WM_STATE;
        let values = self.property32(window, state, state)?;
        ClientState::from_raw(*values.first()?)
    }

    fn set_client_state(&self, window: Window, state: ClientState) -> WmResult<()> {
        let atom = self.atoms.WM_STATE;
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            atom,
            atom,
            &[state.as_raw(), NONE],
        )?;
        Ok(())
    }

    fn select_client_input(&self, window: Window) -> WmResult<()> {
        let mask = EventMask::ENTER_WINDOW
            | EventMask::FOCUS_CHANGE
            | EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY;
        self.connection
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn move_resize(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()> {
        let aux = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.w.max(1) as u32)
            .height(geometry.h.max(1) as u32)
            .border_width(border_width.max(0) as u32);
        self.connection.configure_window(window, &aux)?;
        Ok(())
    }

    fn move_window(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn send_configure_notify(&self, window: Window, geometry: Rect, border_width: i32) -> WmResult<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: geometry.x as i16,
            y: geometry.y as i16,
            width: geometry.w as u16,
            height: geometry.h as u16,
            border_width: border_width as u16,
            override_redirect: false,
        };
        self.connection
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn forward_configure_request(&self, request: &ConfigureRequest) -> WmResult<()> {
        let aux = ConfigureWindowAux::new()
            .x(request.x)
            .y(request.y)
            .width(request.width.map(|w| w.max(1) as u32))
            .height(request.height.map(|h| h.max(1) as u32))
            .border_width(request.border_width.map(|bw| bw.max(0) as u32))
            .sibling(request.sibling)
            .stack_mode(request.stack_mode.map(|mode| StackMode::from(mode as u8)));
        self.connection.configure_window(request.window, &aux)?;
        Ok(())
    }

    fn set_border_width(&self, window: Window, border_width: i32) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().border_width(border_width.max(0) as u32),
        )?;
        Ok(())
    }

    fn set_border_color(&self, window: Window, pixel: u32) -> WmResult<()> {
        self.connection.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(pixel),
        )?;
        Ok(())
    }

    fn map(&self, window: Window) -> WmResult<()> {
        self.connection.map_window(window)?;
        Ok(())
    }

    fn raise(&self, window: Window) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn stack_below(&self, window: Window, sibling: Window) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .sibling(sibling)
                .stack_mode(StackMode::BELOW),
        )?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> WmResult<()> {
        self.connection
            .set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn set_active_window(&self, window: Option<Window>) -> WmResult<()> {
        let atom = self.atoms._NET_ACTIVE_WINDOW;
        match window {
            Some(window) => {
                self.connection.change_property32(
                    PropMode::REPLACE,
                    self.root,
                    atom,
                    AtomEnum::WINDOW,
                    &[window],
                )?;
            }
            None => {
                self.connection.delete_property(self.root, atom)?;
            }
        }
        Ok(())
    }

    fn append_client_list(&self, window: Window) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::APPEND,
            self.root,
            self.atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            &[window],
        )?;
        Ok(())
    }

    fn set_client_list(&self, windows: &[Window]) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            self.root,
            self.atoms._NET_CLIENT_LIST,
            AtomEnum::WINDOW,
            windows,
        )?;
        Ok(())
    }

    fn set_fullscreen_state(&self, window: Window, fullscreen: bool) -> WmResult<()> {
        let data: &[u32] = if fullscreen {
            &[self.atoms._NET_WM_STATE_FULLSCREEN]
        } else {
            &[]
        };
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_STATE,
            AtomEnum::ATOM,
            data,
        )?;
        Ok(())
    }

    fn supports_protocol(&self, window: Window, protocol: WmProtocol) -> bool {
        let wanted = match protocol {
            WmProtocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
            WmProtocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
        };
        self.property32(window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM)
            .is_some_and(|protocols| protocols.contains(&wanted))
    }

    fn send_protocol(&self, window: Window, protocol: WmProtocol) -> WmResult<()> {
        let atom = match protocol {
            WmProtocol::DeleteWindow => self.atoms.WM_DELETE_WINDOW,
            WmProtocol::TakeFocus => self.atoms.WM_TAKE_FOCUS,
        };
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.WM_PROTOCOLS,
            [atom, CURRENT_TIME, 0, 0, 0],
        );
        self.connection
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn kill_client(&self, window: Window) -> WmResult<()> {
        self.connection.grab_server()?;
        self.connection.set_close_down_mode(CloseDown::DESTROY_ALL)?;
        self.connection.kill_client(window)?;
        self.connection.ungrab_server()?;
        self.connection.flush()?;
        Ok(())
    }

    fn window_title(&self, window: Window) -> Option<String> {
        self.text_property(window, self.atoms._NET_WM_NAME)
            .or_else(|| self.text_property(window, AtomEnum::WM_NAME))
    }

    fn root_name(&self) -> Option<String> {
        self.text_property(self.root, AtomEnum::WM_NAME)
    }

    fn class_hint(&self, window: Window) -> Option<(String, String)> {
        let reply = self
            .connection
            .get_property(false, window, AtomEnum::WM_CLASS, AtomEnum::STRING, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        let mut parts = reply
            .value
            .split(|&byte| byte == 0)
            .map(|part| String::from_utf8_lossy(part).into_owned());
        let instance = parts.next()?;
        let class = parts.next().unwrap_or_default();
        Some((instance, class))
    }

    fn transient_for(&self, window: Window) -> Option<Window> {
        self.property32(window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW)?
            .first()
            .copied()
            .filter(|&parent| parent != NONE)
    }

    fn size_hints(&self, window: Window) -> Option<SizeHints> {
        let values = self.property32(window, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS)?;
        SizeHints::from_raw(&values)
    }

    fn wm_hints(&self, window: Window) -> Option<WmHints> {
        let values = self.property32(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS)?;
        let flags = *values.first()?;
        Some(WmHints {
            urgent: flags & URGENCY_HINT != 0,
            input: (flags & INPUT_HINT != 0).then(|| values.get(1).copied().unwrap_or(1) != 0),
        })
    }

    fn set_urgency_hint(&self, window: Window, urgent: bool) -> WmResult<()> {
        let Some(mut values) = self.property32(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS)
        else {
            return Ok(());
        };
        let Some(flags) = values.first_mut() else {
            return Ok(());
        };
        if urgent {
            *flags |= URGENCY_HINT;
        } else {
            *flags &= !URGENCY_HINT;
        }
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &values,
        )?;
        Ok(())
    }

    fn window_type(&self, window: Window) -> WindowType {
        WindowType {
            fullscreen: self.first_atom(window, self.atoms._NET_WM_STATE)
                == Some(self.atoms._NET_WM_STATE_FULLSCREEN),
            dialog: self.first_atom(window, self.atoms._NET_WM_WINDOW_TYPE)
                == Some(self.atoms._NET_WM_WINDOW_TYPE_DIALOG),
        }
    }

    fn refresh_keyboard_mapping(&self) -> WmResult<()> {
        *self.keyboard.borrow_mut() = Self::fetch_keyboard_mapping(&self.connection)?;
        Ok(())
    }

    fn keycode_to_keysym(&self, keycode: u8) -> Keysym {
        let mapping = self.keyboard.borrow();
        let per = mapping.keysyms_per_keycode as usize;
        keycode
            .checked_sub(mapping.min_keycode)
            .and_then(|offset| mapping.keysyms.get(offset as usize * per))
            .copied()
            .unwrap_or(0)
    }

    fn numlock_mask(&self) -> u16 {
        let numlock_codes = self.keycodes_for(keysyms::XK_NUM_LOCK);
        let reply = self
            .connection
            .get_modifier_mapping()
            .ok()
            .and_then(|cookie| cookie.reply().ok());
        let Some(reply) = reply else {
            warn!("could not read the modifier mapping");
            return 0;
        };

        let per = reply.keycodes_per_modifier() as usize;
        reply
            .keycodes
            .chunks(per.max(1))
            .take(8)
            .position(|codes| codes.iter().any(|code| numlock_codes.contains(code)))
            .map(|modifier| 1 << modifier)
            .unwrap_or(0)
    }

    fn grab_keys(&self, keys: &[(u16, Keysym)]) -> WmResult<()> {
        let numlock = self.numlock_mask();
        let lock = u16::from(ModMask::LOCK);
        self.connection
            .ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;

        for &(modifiers, keysym) in keys {
            for keycode in self.keycodes_for(keysym) {
                for extra in [0, lock, numlock, numlock | lock] {
                    self.connection.grab_key(
                        true,
                        self.root,
                        ModMask::from(modifiers | extra),
                        keycode,
                        GrabMode::ASYNC,
                        GrabMode::ASYNC,
                    )?;
                }
            }
        }
        debug!("grabbed {} key bindings", keys.len());
        Ok(())
    }

    fn grab_buttons(&self, window: Window, focused: bool, buttons: &[(u16, u8)]) -> WmResult<()> {
        let numlock = self.numlock_mask();
        let lock = u16::from(ModMask::LOCK);
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;

        self.connection
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;
        if !focused {
            self.connection.grab_button(
                false,
                window,
                mask,
                GrabMode::SYNC,
                GrabMode::SYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }
        for &(modifiers, button) in buttons {
            for extra in [0, lock, numlock, numlock | lock] {
                self.connection.grab_button(
                    false,
                    window,
                    mask,
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    NONE,
                    NONE,
                    ButtonIndex::from(button),
                    ModMask::from(modifiers | extra),
                )?;
            }
        }
        Ok(())
    }

    fn allow_replay_pointer(&self, time: u32) -> WmResult<()> {
        self.connection.allow_events(Allow::REPLAY_POINTER, time)?;
        Ok(())
    }

    fn grab_pointer(&self, cursor: CursorKind) -> WmResult<bool> {
        let cursor = match cursor {
            CursorKind::Normal => self.cursors.normal,
            CursorKind::Resize => self.cursors.resize,
            CursorKind::Move => self.cursors.moving,
        };
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;
        let reply = self
            .connection
            .grab_pointer(
                false,
                self.root,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                cursor,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(reply.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&self) -> WmResult<()> {
        self.connection.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn query_pointer(&self) -> Option<(i32, i32)> {
        let reply = self.connection.query_pointer(self.root).ok()?.reply().ok()?;
        Some((reply.root_x.into(), reply.root_y.into()))
    }

    fn warp_pointer(&self, window: Window, x: i32, y: i32) -> WmResult<()> {
        self.connection
            .warp_pointer(NONE, window, 0, 0, 0, 0, x as i16, y as i16)?;
        Ok(())
    }

    fn create_bar(&self, geometry: Rect) -> WmResult<Window> {
        let screen = &self.connection.setup().roots[self.screen_number];
        let window = self.connection.generate_id()?;
        self.connection.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            self.root,
            geometry.x as i16,
            geometry.y as i16,
            geometry.w.max(1) as u16,
            geometry.h.max(1) as u16,
            0,
            WindowClass::COPY_FROM_PARENT,
            screen.root_visual,
            &CreateWindowAux::new()
                .override_redirect(1)
                .background_pixmap(u32::from(BackPixmap::PARENT_RELATIVE))
                .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE)
                .cursor(self.cursors.normal),
        )?;
        self.connection.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"dynwm\0dynwm\0",
        )?;
        self.connection.map_window(window)?;
        self.raise(window)?;
        Ok(window)
    }

    fn destroy_window(&self, window: Window) -> WmResult<()> {
        self.connection.unmap_window(window)?;
        self.connection.destroy_window(window)?;
        Ok(())
    }
}
