use super::WindowManager;
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::xconnection::{CursorKind, XConn, XEvent};
use log::debug;
use x11rb::protocol::xproto::Window;

/// Motion samples closer together than this many milliseconds are dropped.
const MOTION_INTERVAL_MS: u32 = 1000 / 60;

/// An interactive move or resize in progress. While not idle the pointer is
/// grabbed and most events wait until the gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Moving {
        window: Window,
        /// Client position when the gesture started.
        origin: (i32, i32),
        /// Pointer position when the gesture started.
        pointer: (i32, i32),
        last_time: u32,
    },
    Resizing {
        window: Window,
        origin: (i32, i32),
        last_time: u32,
    },
}

impl<X: XConn> WindowManager<X> {
    /// The selected client, if it may be dragged.
    fn drag_target(&mut self) -> WmResult<Option<Window>> {
        let Some(window) = self.state.selected_client() else {
            return Ok(None);
        };
        if self.state.client(window).is_none_or(|c| c.is_fullscreen) {
            return Ok(None);
        }
        self.restack(self.state.selected_monitor)?;
        Ok(Some(window))
    }

    pub(crate) fn start_move(&mut self) -> WmResult<()> {
        let Some(window) = self.drag_target()? else {
            return Ok(());
        };
        if !self.conn.grab_pointer(CursorKind::Move)? {
            return Ok(());
        }
        let Some(pointer) = self.conn.query_pointer() else {
            return self.conn.ungrab_pointer();
        };
        let Some(client) = self.state.client(window) else {
            return self.conn.ungrab_pointer();
        };
        debug!("moving {window:#x}");
        self.drag = DragState::Moving {
            window,
            origin: (client.x, client.y),
            pointer,
            last_time: 0,
        };
        Ok(())
    }

    pub(crate) fn start_resize(&mut self) -> WmResult<()> {
        let Some(window) = self.drag_target()? else {
            return Ok(());
        };
        if !self.conn.grab_pointer(CursorKind::Resize)? {
            return Ok(());
        }
        let Some(client) = self.state.client(window) else {
            return self.conn.ungrab_pointer();
        };
        debug!("resizing {window:#x}");
        let origin = (client.x, client.y);
        self.warp_to_corner(window)?;
        self.drag = DragState::Resizing {
            window,
            origin,
            last_time: 0,
        };
        Ok(())
    }

    fn warp_to_corner(&mut self, window: Window) -> WmResult<()> {
        if let Some(client) = self.state.client(window) {
            let bw = client.border_width;
            self.conn
                .warp_pointer(window, client.width + bw - 1, client.height + bw - 1)?;
        }
        Ok(())
    }

    pub(super) fn drag_motion(&mut self, event: &XEvent) -> WmResult<()> {
        let XEvent::MotionNotify {
            root_x,
            root_y,
            time,
            ..
        } = *event
        else {
            return Ok(());
        };

        match self.drag {
            DragState::Idle => Ok(()),
            DragState::Moving {
                window,
                origin,
                pointer,
                last_time,
            } => {
                if time.wrapping_sub(last_time) <= MOTION_INTERVAL_MS {
                    return Ok(());
                }
                self.drag = DragState::Moving {
                    window,
                    origin,
                    pointer,
                    last_time: time,
                };
                let x = origin.0 + (root_x - pointer.0);
                let y = origin.1 + (root_y - pointer.1);
                self.drag_move_to(window, x, y)
            }
            DragState::Resizing {
                window,
                origin,
                last_time,
            } => {
                if time.wrapping_sub(last_time) <= MOTION_INTERVAL_MS {
                    return Ok(());
                }
                self.drag = DragState::Resizing {
                    window,
                    origin,
                    last_time: time,
                };
                self.drag_resize_to(window, origin, root_x, root_y)
            }
        }
    }

    fn drag_move_to(&mut self, window: Window, x: i32, y: i32) -> WmResult<()> {
        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let area = self.state.selmon().window_area;
        let snap = self.config.snap;
        let (width, height) = (client.width_with_border(), client.height_with_border());

        let mut x = x;
        let mut y = y;
        if (area.x - x).abs() < snap {
            x = area.x;
        } else if (area.right() - (x + width)).abs() < snap {
            x = area.right() - width;
        }
        if (area.y - y).abs() < snap {
            y = area.y;
        } else if (area.bottom() - (y + height)).abs() < snap {
            y = area.bottom() - height;
        }

        let arranges = self.state.layout_kind(self.state.selected_monitor).arranges();
        let torn_off = (x - client.x).abs() > snap || (y - client.y).abs() > snap;
        if !client.is_floating && arranges && torn_off {
            self.toggle_floating_client(window)?;
        }

        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        if !arranges || client.is_floating {
            let geometry = Rect::new(x, y, client.width, client.height);
            self.resize(window, geometry, true)?;
        }
        Ok(())
    }

    fn drag_resize_to(
        &mut self,
        window: Window,
        origin: (i32, i32),
        root_x: i32,
        root_y: i32,
    ) -> WmResult<()> {
        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let bw = client.border_width;
        let width = (root_x - origin.0 - 2 * bw + 1).max(1);
        let height = (root_y - origin.1 - 2 * bw + 1).max(1);

        let own_area = self.state.monitors[client.monitor_index].window_area;
        let area = self.state.selmon().window_area;
        let snap = self.config.snap;
        let arranges = self.state.layout_kind(self.state.selected_monitor).arranges();

        let corner_x = own_area.x + width;
        let corner_y = own_area.y + height;
        let inside = corner_x >= area.x
            && corner_x <= area.right()
            && corner_y >= area.y
            && corner_y <= area.bottom();
        let torn_off = (width - client.width).abs() > snap || (height - client.height).abs() > snap;
        if inside && !client.is_floating && arranges && torn_off {
            self.toggle_floating_client(window)?;
        }

        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        if !arranges || client.is_floating {
            let geometry = Rect::new(client.x, client.y, width, height);
            self.resize(window, geometry, true)?;
        }
        Ok(())
    }

    /// Releases the pointer and hands the client to whichever monitor it now
    /// mostly covers.
    pub(super) fn end_drag(&mut self) -> WmResult<()> {
        let window = match self.drag {
            DragState::Idle => return Ok(()),
            DragState::Moving { window, .. } => window,
            DragState::Resizing { window, .. } => {
                self.warp_to_corner(window)?;
                window
            }
        };
        self.drag = DragState::Idle;
        self.conn.ungrab_pointer()?;
        self.conn.discard_enter_events()?;

        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let target = self.state.rect_to_monitor(client.geometry());
        if target != self.state.selected_monitor {
            self.send_to_monitor(window, target)?;
            self.state.selected_monitor = target;
            self.focus(None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::DragState;
    use crate::geometry::Rect;
    use crate::keyboard::{Arg, KeyAction};
    use crate::xconnection::mock::{Call, ROOT};
    use crate::xconnection::{ButtonEvent, CursorKind, Property, XEvent};
    use pretty_assertions::assert_eq;

    fn motion(x: i32, y: i32, time: u32) -> XEvent {
        XEvent::MotionNotify {
            window: ROOT,
            root_x: x,
            root_y: y,
            time,
        }
    }

    fn release() -> XEvent {
        XEvent::ButtonRelease(ButtonEvent {
            window: ROOT,
            button: 1,
            state: 0,
            x: 0,
            y: 0,
            root_x: 0,
            root_y: 0,
            time: 0,
        })
    }

    #[test]
    fn dragging_a_tiled_client_floats_it_once() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.pointer.set(Some((100, 100)));

        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();
        assert!(matches!(wm.drag, DragState::Moving { window: 5, .. }));
        assert!(wm.conn.calls().contains(&Call::GrabPointer(CursorKind::Move)));

        wm.handle_event(motion(300, 300, 100)).unwrap();
        assert!(wm.state.client(5).unwrap().is_floating);
        wm.handle_event(motion(400, 350, 200)).unwrap();
        assert!(wm.state.client(5).unwrap().is_floating);
        let client = wm.state.client(5).unwrap();
        assert_eq!((client.x, client.y), (300, 266));

        wm.handle_event(release()).unwrap();
        assert_eq!(wm.drag, DragState::Idle);
        assert!(wm.conn.calls().contains(&Call::UngrabPointer));
    }

    #[test]
    fn small_moves_keep_a_client_tiled() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.pointer.set(Some((100, 100)));
        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();

        wm.handle_event(motion(110, 110, 100)).unwrap();
        assert!(!wm.state.client(5).unwrap().is_floating);
    }

    #[test]
    fn rapid_motion_is_throttled() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.resize_client(5, Rect::new(200, 200, 100, 100)).unwrap();
        wm.conn.pointer.set(Some((0, 0)));
        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();

        wm.handle_event(motion(50, 50, 100)).unwrap();
        wm.handle_event(motion(90, 90, 110)).unwrap();
        let client = wm.state.client(5).unwrap();
        assert_eq!((client.x, client.y), (250, 250));
    }

    #[test]
    fn moves_snap_to_the_work_area_edges() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.resize_client(5, Rect::new(200, 200, 100, 100)).unwrap();
        wm.conn.pointer.set(Some((0, 0)));
        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();

        wm.handle_event(motion(-180, 600, 100)).unwrap();
        let client = wm.state.client(5).unwrap();
        // the work area ends at y = 916 and the client is 102 high
        assert_eq!((client.x, client.y), (0, 916 - 102));
    }

    #[test]
    fn resize_follows_the_pointer_from_the_corner() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.resize_client(5, Rect::new(100, 100, 200, 100)).unwrap();

        wm.run_action(KeyAction::ResizeMouse, &Arg::None).unwrap();
        assert!(wm.conn.calls().contains(&Call::Warp(5, 200, 100)));

        wm.handle_event(motion(500, 400, 100)).unwrap();
        let client = wm.state.client(5).unwrap();
        assert_eq!((client.width, client.height), (399, 299));
    }

    #[test]
    fn refused_grab_leaves_the_state_idle() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.refuse_pointer_grab.set(true);
        wm.run_action(KeyAction::ResizeMouse, &Arg::None).unwrap();
        assert_eq!(wm.drag, DragState::Idle);
    }

    #[test]
    fn other_events_wait_until_the_drag_ends() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.pointer.set(Some((0, 0)));
        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();

        wm.conn.titles.borrow_mut().insert(5, "late".into());
        wm.handle_event(XEvent::PropertyNotify {
            window: 5,
            property: Property::WmName,
            deleted: false,
        })
        .unwrap();
        wm.handle_event(XEvent::EnterNotify {
            window: 5,
            ordinary: true,
        })
        .unwrap();
        assert_eq!(wm.deferred.len(), 1);
        assert_ne!(wm.state.client(5).unwrap().name, "late");

        wm.conn.add_window(6, Rect::new(0, 0, 100, 100));
        wm.handle_event(XEvent::MapRequest { window: 6 }).unwrap();
        assert!(wm.state.client(6).is_some());

        wm.handle_event(release()).unwrap();
        let deferred = wm.deferred.pop_front().unwrap();
        wm.handle_event(deferred).unwrap();
        assert_eq!(wm.state.client(5).unwrap().name, "late");
    }

    #[test]
    fn window_mapped_mid_drag_does_not_steal_the_tear_off() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.pointer.set(Some((100, 100)));
        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();

        wm.conn.add_window(6, Rect::new(0, 0, 100, 100));
        wm.handle_event(XEvent::MapRequest { window: 6 }).unwrap();
        assert_eq!(wm.state.selected_client(), Some(6));

        for (step, time) in [(300, 100), (320, 200), (340, 300)] {
            wm.handle_event(motion(step, step, time)).unwrap();
            assert!(wm.state.client(5).unwrap().is_floating);
            assert!(!wm.state.client(6).unwrap().is_floating);
        }
        let client = wm.state.client(5).unwrap();
        assert_eq!((client.x, client.y), (240, 256));

        wm.handle_event(release()).unwrap();
        assert_registry_consistent(&wm);
    }

    #[test]
    fn dropping_on_another_monitor_sends_the_client_there() {
        let mut wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 1000, 800)]);
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.resize_client(5, Rect::new(100, 100, 100, 100)).unwrap();
        wm.conn.pointer.set(Some((150, 150)));

        wm.run_action(KeyAction::MoveMouse, &Arg::None).unwrap();
        wm.handle_event(motion(1450, 350, 100)).unwrap();
        wm.handle_event(release()).unwrap();

        assert_eq!(wm.state.client(5).unwrap().monitor_index, 1);
        assert_eq!(wm.state.selected_monitor, 1);
        assert_eq!(wm.state.selected_client(), Some(5));
        assert_registry_consistent(&wm);
    }
}
