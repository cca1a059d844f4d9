//! The event loop and everything that ties the in-memory state to the
//! display: managing windows, arranging them, focus, bindings and bars.

mod actions;
mod arrange;
mod drag;
mod events;
mod focus;
mod manage;

pub use drag::DragState;

use crate::bar::{self, BarContent, ClientTitle, Draw};
use crate::errors::{WmResult, X11Error};
use crate::geometry::Rect;
use crate::keyboard::KeyBinding;
use crate::spawn;
use crate::state::WmState;
use crate::xconnection::{EventKind, XConn, XEvent};
use crate::{Config, VERSION};
use log::{debug, error, info, warn};
use std::collections::VecDeque;

pub const WM_NAME: &str = "dynwm";

pub struct WindowManager<X: XConn> {
    conn: X,
    draw: Box<dyn Draw>,
    config: Config,
    state: WmState,
    drag: DragState,
    /// Events that arrived during a drag and are replayed once it ends.
    deferred: VecDeque<XEvent>,
    status: String,
    /// Monitor the pointer was last seen on while crossing the root window.
    motion_monitor: Option<usize>,
    running: bool,
    restart: bool,
}

impl<X: XConn> WindowManager<X> {
    pub fn new(conn: X, draw: Box<dyn Draw>, config: Config) -> WmResult<Self> {
        conn.become_wm()?;

        let bar_height = bar::bar_height(draw.as_ref());
        let mut state = WmState::new(
            config.tags.len(),
            config.layouts.clone(),
            config.mfact,
            config.nmaster,
            config.show_bar,
            config.top_bar,
            bar_height,
        );
        (state.screen_width, state.screen_height) = conn.screen_size();

        let mut wm = Self {
            conn,
            draw,
            config,
            state,
            drag: DragState::Idle,
            deferred: VecDeque::new(),
            status: default_status(),
            motion_monitor: None,
            running: true,
            restart: false,
        };
        wm.setup()?;
        Ok(wm)
    }

    fn setup(&mut self) -> WmResult<()> {
        self.draw
            .resize(self.state.screen_width, self.state.bar_height);
        self.update_geometry()?;
        self.conn.init_root(WM_NAME)?;
        self.update_status();
        self.grab_keys()?;
        self.focus(None)?;
        self.conn.flush()?;
        info!(
            "managing {} monitor(s) on a {}x{} screen",
            self.state.monitors.len(),
            self.state.screen_width,
            self.state.screen_height
        );
        Ok(())
    }

    /// Manages pre-existing windows, starts the autostart commands and then
    /// processes events until quit or restart. Returns whether to restart.
    pub fn run(&mut self) -> WmResult<bool> {
        self.scan()?;
        self.autostart();
        self.conn.flush()?;

        while self.running {
            let event = match self.drag {
                DragState::Idle => match self.deferred.pop_front() {
                    Some(event) => event,
                    None => self.conn.next_event()?,
                },
                _ => self.conn.next_event()?,
            };
            self.handle_event(event)?;
            self.conn.flush()?;
        }

        Ok(self.restart)
    }

    /// Releases every client and the root window so another window manager
    /// can take over.
    pub fn cleanup(&mut self) -> WmResult<()> {
        self.state.view(!0);
        self.arrange(None)?;
        for window in self.state.all_windows() {
            self.unmanage(window, false)?;
        }
        for monitor in &mut self.state.monitors {
            if let Some(bar) = monitor.bar_window.take() {
                self.conn.destroy_window(bar)?;
            }
        }
        self.conn.cleanup()?;
        self.conn.flush()
    }

    pub fn state(&self) -> &WmState {
        &self.state
    }

    fn autostart(&self) {
        for command in &self.config.autostart {
            if let Err(e) = spawn::spawn_shell(command) {
                warn!("autostart command {command:?} failed: {e}");
            }
        }
    }

    fn handle_event(&mut self, event: XEvent) -> WmResult<()> {
        if !matches!(self.drag, DragState::Idle) {
            match event.kind() {
                EventKind::MotionNotify => return self.drag_motion(&event),
                EventKind::ButtonRelease => return self.end_drag(),
                EventKind::Expose
                | EventKind::ConfigureRequest
                | EventKind::MapRequest
                | EventKind::Error => {}
                EventKind::EnterNotify => return Ok(()),
                _ => {
                    self.deferred.push_back(event);
                    return Ok(());
                }
            }
        }
        self.dispatch(event)
    }

    fn dispatch(&mut self, event: XEvent) -> WmResult<()> {
        match event {
            XEvent::ButtonPress(event) => self.on_button_press(&event),
            XEvent::ButtonRelease(_) => Ok(()),
            XEvent::ClientMessage { window, message } => self.on_client_message(window, message),
            XEvent::ConfigureNotify {
                window,
                width,
                height,
            } => self.on_configure_notify(window, width, height),
            XEvent::ConfigureRequest(request) => self.on_configure_request(&request),
            XEvent::DestroyNotify { window } => {
                if self.state.client(window).is_some() {
                    self.unmanage(window, true)?;
                }
                Ok(())
            }
            XEvent::EnterNotify { window, ordinary } => self.on_enter_notify(window, ordinary),
            XEvent::Expose { window, count } => {
                if count == 0 {
                    if let Some(monitor) = self.state.monitor_of_bar(window) {
                        self.draw_bar(monitor);
                    }
                }
                Ok(())
            }
            XEvent::FocusIn { window } => {
                // some clients grab focus on their own
                match self.state.selected_client() {
                    Some(selected) if selected != window => self.set_focus(selected),
                    _ => Ok(()),
                }
            }
            XEvent::KeyPress { keycode, state } => self.on_key_press(keycode, state),
            XEvent::MappingNotify { keyboard } => {
                self.conn.refresh_keyboard_mapping()?;
                if keyboard {
                    self.grab_keys()?;
                }
                Ok(())
            }
            XEvent::MapRequest { window } => self.on_map_request(window),
            XEvent::MotionNotify {
                window,
                root_x,
                root_y,
                ..
            } => self.on_root_motion(window, root_x, root_y),
            XEvent::PropertyNotify {
                window,
                property,
                deleted,
            } => self.on_property_notify(window, property, deleted),
            XEvent::UnmapNotify { window, synthetic } => {
                if self.state.client(window).is_some() {
                    if synthetic {
                        self.conn
                            .set_client_state(window, crate::xconnection::ClientState::Withdrawn)?;
                    } else {
                        self.unmanage(window, false)?;
                    }
                }
                Ok(())
            }
            XEvent::Error(error) => {
                if error.is_benign() {
                    debug!(
                        "ignoring protocol error {} for request {}",
                        error.error_code, error.major_opcode
                    );
                    Ok(())
                } else {
                    error!(
                        "fatal protocol error {} for request {}",
                        error.error_code, error.major_opcode
                    );
                    Err(X11Error::Protocol {
                        request: format!("opcode {}", error.major_opcode),
                        error_code: error.error_code,
                    }
                    .into())
                }
            }
        }
    }

    pub(crate) fn grab_keys(&mut self) -> WmResult<()> {
        let keys: Vec<(u16, crate::keyboard::keysyms::Keysym)> = self
            .config
            .keybindings
            .iter()
            .map(|binding: &KeyBinding| (binding.mask(), binding.keysym))
            .collect();
        self.conn.grab_keys(&keys)
    }

    fn update_status(&mut self) {
        self.status = self.conn.root_name().unwrap_or_else(default_status);
    }

    /// Re-reads the display layout. Returns whether monitors changed.
    fn update_geometry(&mut self) -> WmResult<bool> {
        let rects = self.conn.screen_rects()?;
        let outcome = self.state.reconcile(&rects);
        for bar in outcome.removed_bars {
            self.conn.destroy_window(bar)?;
        }
        self.update_bars()?;

        if outcome.dirty {
            if let Some((x, y)) = self.conn.query_pointer() {
                self.state.selected_monitor = self.state.rect_to_monitor(Rect::new(x, y, 1, 1));
            }
        }
        Ok(outcome.dirty)
    }

    /// Creates bar windows for monitors that lack one.
    fn update_bars(&mut self) -> WmResult<()> {
        let bar_height = self.state.bar_height;
        for monitor in &mut self.state.monitors {
            if monitor.bar_window.is_none() {
                let window = self.conn.create_bar(monitor.bar_geometry(bar_height))?;
                monitor.bar_window = Some(window);
            }
        }
        Ok(())
    }

    fn draw_bar(&mut self, monitor_index: usize) {
        let Some(monitor) = self.state.monitors.get(monitor_index) else {
            return;
        };
        let Some(window) = monitor.bar_window else {
            return;
        };
        if !monitor.show_bar {
            return;
        }

        let is_selected_monitor = monitor_index == self.state.selected_monitor;
        let (occupied, urgent) = self.state.occupied_and_urgent(monitor_index);
        let focused = monitor.selected.and_then(|window| self.state.client(window));

        let content = BarContent {
            window,
            width: monitor.window_area.w,
            height: self.state.bar_height,
            tags: &self.config.tags,
            active_tags: monitor.active_tags(),
            occupied,
            urgent,
            focused_tags: focused
                .filter(|_| is_selected_monitor)
                .map(|client| client.tags),
            layout_symbol: &monitor.layout_symbol,
            title: focused.map(|client| ClientTitle {
                name: &client.name,
                is_floating: client.is_floating,
                is_fixed: client.is_fixed,
            }),
            is_selected_monitor,
            status: &self.status,
        };
        bar::draw_bar(self.draw.as_mut(), &content);
    }

    fn draw_bars(&mut self) {
        for monitor_index in 0..self.state.monitors.len() {
            self.draw_bar(monitor_index);
        }
    }
}

fn default_status() -> String {
    format!("{WM_NAME}-{VERSION}")
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::bar::test_util::RecordingDraw;
    use crate::xconnection::mock::MockXConn;

    pub type TestWm = WindowManager<MockXConn>;

    pub fn wm_with(rects: &[Rect], config: Config) -> TestWm {
        let conn = MockXConn::new(rects);
        WindowManager::new(conn, Box::new(RecordingDraw::default()), config).unwrap()
    }

    pub fn wm(rects: &[Rect]) -> TestWm {
        wm_with(rects, Config::default())
    }

    /// Maps a regular window through the normal map-request path.
    pub fn map(wm: &mut TestWm, window: u32, geometry: Rect) {
        wm.conn.add_window(window, geometry);
        wm.dispatch(XEvent::MapRequest { window }).unwrap();
    }

    pub fn single() -> TestWm {
        wm(&[Rect::new(0, 0, 1000, 916)])
    }

    /// Every managed client appears exactly once in both orders of its
    /// monitor and nowhere else.
    pub fn assert_registry_consistent(wm: &TestWm) {
        for (window, client) in &wm.state.clients {
            for (index, monitor) in wm.state.monitors.iter().enumerate() {
                let expected = usize::from(index == client.monitor_index);
                let in_clients = monitor.clients.iter().filter(|&&w| w == *window).count();
                let in_stack = monitor.stack.iter().filter(|&&w| w == *window).count();
                assert_eq!(in_clients, expected, "attachment order of {window}");
                assert_eq!(in_stack, expected, "recency order of {window}");
            }
        }
        for monitor in &wm.state.monitors {
            assert_eq!(monitor.clients.len(), monitor.stack.len());
            if let Some(selected) = monitor.selected {
                assert!(wm.state.is_visible(selected), "selection {selected} is hidden");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::xconnection::ProtocolError;
    use crate::xconnection::mock::Call;
    use crate::xconnection::protocol;
    use pretty_assertions::assert_eq;

    #[test]
    fn setup_creates_one_bar_per_monitor() {
        let wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 800, 600)]);
        let bars: Vec<_> = wm
            .conn
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::CreateBar(..)))
            .collect();
        assert_eq!(bars.len(), 2);
        assert_eq!(wm.state.monitors[1].bar_window, Some(10_001));
        // 14 pixel font plus two
        assert_eq!(wm.state.bar_height, 16);
        assert_eq!(wm.state.monitors[0].window_area, Rect::new(0, 16, 1000, 784));
    }

    #[test]
    fn status_falls_back_to_version() {
        let mut wm = single();
        assert_eq!(wm.status, format!("dynwm-{VERSION}"));
        *wm.conn.root_name.borrow_mut() = Some("12:00".into());
        wm.dispatch(XEvent::PropertyNotify {
            window: crate::xconnection::mock::ROOT,
            property: crate::xconnection::Property::WmName,
            deleted: false,
        })
        .unwrap();
        assert_eq!(wm.status, "12:00");
    }

    #[test]
    fn benign_errors_are_ignored_and_others_are_fatal() {
        let mut wm = single();
        let benign = ProtocolError {
            major_opcode: protocol::X_SET_INPUT_FOCUS,
            error_code: protocol::BAD_MATCH,
        };
        assert!(wm.dispatch(XEvent::Error(benign)).is_ok());

        let fatal = ProtocolError {
            major_opcode: 1,
            error_code: 2,
        };
        assert!(wm.dispatch(XEvent::Error(fatal)).is_err());
    }

    #[test]
    fn run_manages_existing_windows_and_stops_on_quit() {
        let conn = crate::xconnection::mock::MockXConn::new(&[Rect::new(0, 0, 1000, 916)]);
        conn.add_window(5, Rect::new(0, 0, 100, 100));
        conn.keysyms.borrow_mut().insert(24, crate::keyboard::keysyms::XK_Q);
        conn.push_event(XEvent::KeyPress {
            keycode: 24,
            state: (x11rb::protocol::xproto::KeyButMask::MOD1
                | x11rb::protocol::xproto::KeyButMask::SHIFT)
                .into(),
        });
        let mut wm = WindowManager::new(
            conn,
            Box::new(crate::bar::test_util::RecordingDraw::default()),
            Config::default(),
        )
        .unwrap();

        assert_eq!(wm.run().unwrap(), false);
        assert!(wm.state.client(5).is_some());
    }

    #[test]
    fn cleanup_releases_clients_and_bars() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.clear();
        wm.cleanup().unwrap();

        assert!(wm.state.clients.is_empty());
        let calls = wm.conn.calls();
        assert!(calls.contains(&Call::SetState(5, crate::xconnection::ClientState::Withdrawn)));
        assert!(calls.contains(&Call::Destroy(10_000)));
    }
}
