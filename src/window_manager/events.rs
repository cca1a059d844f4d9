use super::WindowManager;
use crate::bar;
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::keyboard::{Arg, KeyAction, clean_mask, matching_bindings};
use crate::mouse::ClickTarget;
use crate::xconnection::{
    ButtonEvent, ClientMessage, ConfigureRequest, Property, StateAction, XConn,
};
use log::debug;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// The monitor a window belongs to: the pointer's for the root window,
    /// the owner of a bar or client, and the selected one otherwise.
    fn window_to_monitor(&self, window: Window) -> usize {
        if window == self.conn.root() {
            if let Some((x, y)) = self.conn.query_pointer() {
                return self.state.rect_to_monitor(Rect::new(x, y, 1, 1));
            }
        }
        if let Some(monitor) = self.state.monitor_of_bar(window) {
            return monitor;
        }
        self.state
            .client(window)
            .map_or(self.state.selected_monitor, |client| client.monitor_index)
    }

    pub(super) fn on_button_press(&mut self, event: &ButtonEvent) -> WmResult<()> {
        let mut click = ClickTarget::RootWindow;
        let mut clicked_tag = None;

        let monitor = self.window_to_monitor(event.window);
        if monitor != self.state.selected_monitor {
            if let Some(selected) = self.state.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.state.selected_monitor = monitor;
            self.focus(None)?;
        }

        let selmon = self.state.selmon();
        if selmon.bar_window == Some(event.window) {
            (click, clicked_tag) = bar::click_target(
                self.draw.as_ref(),
                &self.config.tags,
                &selmon.layout_symbol,
                &self.status,
                selmon.window_area.w,
                event.x,
            );
        } else if self.state.client(event.window).is_some() {
            self.focus(Some(event.window))?;
            self.restack(self.state.selected_monitor)?;
            self.conn.allow_replay_pointer(event.time)?;
            click = ClickTarget::ClientWindow;
        }

        let numlock = self.conn.numlock_mask();
        let state = clean_mask(event.state, numlock);
        let actions: Vec<(KeyAction, Arg)> = self
            .config
            .buttons
            .iter()
            .filter(|binding| {
                binding.click == click
                    && binding.button == event.button
                    && clean_mask(binding.mask(), numlock) == state
            })
            .map(|binding| match clicked_tag {
                Some(tag) if click == ClickTarget::TagBar && binding.arg.as_uint() == 0 => {
                    (binding.func, Arg::UInt(1 << tag))
                }
                _ => (binding.func, binding.arg.clone()),
            })
            .collect();

        for (action, arg) in actions {
            self.run_action(action, &arg)?;
        }
        Ok(())
    }

    pub(super) fn on_key_press(&mut self, keycode: u8, state: u16) -> WmResult<()> {
        let keysym = self.conn.keycode_to_keysym(keycode);
        let numlock = self.conn.numlock_mask();
        let actions: Vec<(KeyAction, Arg)> =
            matching_bindings(&self.config.keybindings, keysym, state, numlock)
                .map(|binding| (binding.func, binding.arg.clone()))
                .collect();

        for (action, arg) in actions {
            self.run_action(action, &arg)?;
        }
        Ok(())
    }

    pub(super) fn on_client_message(
        &mut self,
        window: Window,
        message: ClientMessage,
    ) -> WmResult<()> {
        let Some(client) = self.state.client(window) else {
            return Ok(());
        };

        match message {
            ClientMessage::Fullscreen(action) => {
                let fullscreen = match action {
                    StateAction::Add => true,
                    StateAction::Remove => false,
                    StateAction::Toggle => !client.is_fullscreen,
                };
                self.set_fullscreen(window, fullscreen)
            }
            ClientMessage::ActiveWindow => {
                if self.state.selected_client() != Some(window) && !client.is_urgent {
                    self.set_urgent(window, true)?;
                }
                Ok(())
            }
            ClientMessage::Other => Ok(()),
        }
    }

    pub(super) fn on_configure_request(&mut self, request: &ConfigureRequest) -> WmResult<()> {
        let window = request.window;
        let Some(client) = self.state.client(window) else {
            return self.conn.forward_configure_request(request);
        };

        if let Some(border_width) = request.border_width {
            if let Some(client) = self.state.client_mut(window) {
                client.border_width = border_width;
            }
            return Ok(());
        }

        let floating_layout = !self.state.layout_kind(self.state.selected_monitor).arranges();
        if !client.is_floating && !floating_layout {
            let (geometry, border_width) = (client.geometry(), client.border_width);
            return self
                .conn
                .send_configure_notify(window, geometry, border_width);
        }

        let area = self.state.monitors[client.monitor_index].area;
        let visible = self.state.is_visible(window);
        let Some(client) = self.state.client_mut(window) else {
            return Ok(());
        };
        if let Some(x) = request.x {
            client.old_x = client.x;
            client.x = area.x + x;
        }
        if let Some(y) = request.y {
            client.old_y = client.y;
            client.y = area.y + y;
        }
        if let Some(width) = request.width {
            client.old_width = client.width;
            client.width = width;
        }
        if let Some(height) = request.height {
            client.old_height = client.height;
            client.height = height;
        }
        if client.is_floating {
            if client.x + client.width > area.right() {
                client.x = area.x + (area.w / 2 - client.width_with_border() / 2);
            }
            if client.y + client.height > area.bottom() {
                client.y = area.y + (area.h / 2 - client.height_with_border() / 2);
            }
        }

        let (geometry, border_width) = (client.geometry(), client.border_width);
        let moved = request.x.is_some() || request.y.is_some();
        let resized = request.width.is_some() || request.height.is_some();
        if moved && !resized {
            self.conn
                .send_configure_notify(window, geometry, border_width)?;
        }
        if visible {
            self.conn.move_resize(window, geometry, border_width)?;
        }
        Ok(())
    }

    /// Only root size changes matter: they may add or remove monitors.
    pub(super) fn on_configure_notify(
        &mut self,
        window: Window,
        width: i32,
        height: i32,
    ) -> WmResult<()> {
        if window != self.conn.root() {
            return Ok(());
        }
        let resized = (width, height) != (self.state.screen_width, self.state.screen_height);
        (self.state.screen_width, self.state.screen_height) = (width, height);

        if self.update_geometry()? || resized {
            debug!("screen reconfigured to {width}x{height}");
            self.draw.resize(width, self.state.bar_height);
            let bar_height = self.state.bar_height;
            for index in 0..self.state.monitors.len() {
                let monitor = &self.state.monitors[index];
                let area = monitor.area;
                let fullscreen: Vec<Window> = monitor
                    .clients
                    .iter()
                    .copied()
                    .filter(|&w| self.state.client(w).is_some_and(|c| c.is_fullscreen))
                    .collect();
                if let Some(bar) = monitor.bar_window {
                    self.conn
                        .move_resize(bar, monitor.bar_geometry(bar_height), 0)?;
                }
                for window in fullscreen {
                    self.resize_client(window, area)?;
                }
            }
            self.focus(None)?;
            self.arrange(None)?;
        }
        Ok(())
    }

    pub(super) fn on_enter_notify(&mut self, window: Window, ordinary: bool) -> WmResult<()> {
        if !ordinary && window != self.conn.root() {
            return Ok(());
        }
        let client = self.state.client(window).map(|c| c.window);
        let monitor = self.window_to_monitor(window);

        if monitor != self.state.selected_monitor {
            if let Some(selected) = self.state.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.state.selected_monitor = monitor;
        } else if client.is_none() || client == self.state.selected_client() {
            return Ok(());
        }
        self.focus(client)
    }

    pub(super) fn on_root_motion(&mut self, window: Window, root_x: i32, root_y: i32) -> WmResult<()> {
        if window != self.conn.root() {
            return Ok(());
        }
        let monitor = self.state.rect_to_monitor(Rect::new(root_x, root_y, 1, 1));
        if self.motion_monitor.is_some_and(|previous| previous != monitor) {
            if let Some(selected) = self.state.selected_client() {
                self.unfocus(selected, true)?;
            }
            self.state.selected_monitor = monitor;
            self.focus(None)?;
        }
        self.motion_monitor = Some(monitor);
        Ok(())
    }

    pub(super) fn on_map_request(&mut self, window: Window) -> WmResult<()> {
        let Some(attributes) = self.conn.window_attributes(window) else {
            return Ok(());
        };
        if attributes.override_redirect || self.state.client(window).is_some() {
            return Ok(());
        }
        self.manage(window, &attributes)
    }

    pub(super) fn on_property_notify(
        &mut self,
        window: Window,
        property: Property,
        deleted: bool,
    ) -> WmResult<()> {
        if window == self.conn.root() && property == Property::WmName {
            self.update_status();
            self.draw_bar(self.state.selected_monitor);
            return Ok(());
        }
        if deleted {
            return Ok(());
        }
        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let monitor_index = client.monitor_index;

        match property {
            Property::WmTransientFor => {
                let parent_managed = self
                    .conn
                    .transient_for(window)
                    .is_some_and(|parent| self.state.client(parent).is_some());
                if !client.is_floating && parent_managed {
                    if let Some(client) = self.state.client_mut(window) {
                        client.is_floating = true;
                    }
                    self.arrange(Some(monitor_index))?;
                }
            }
            Property::WmNormalHints => {
                if let Some(client) = self.state.client_mut(window) {
                    client.hints_valid = false;
                }
            }
            Property::WmHints => {
                self.update_wm_hints(window)?;
                self.draw_bars();
            }
            Property::WmName | Property::NetWmName => {
                self.update_title(window);
                if self.state.monitors[monitor_index].selected == Some(window) {
                    self.draw_bar(monitor_index);
                }
            }
            Property::NetWmWindowType => self.update_window_type(window)?,
            Property::Other => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::Config;
    use crate::geometry::Rect;
    use crate::keyboard::{Arg, KeyAction, KeyBinding, keysyms};
    use crate::mouse::{ButtonBinding, ClickTarget};
    use crate::xconnection::mock::{Call, ROOT};
    use crate::xconnection::{
        ButtonEvent, ClientMessage, ConfigureRequest, Property, StateAction, XEvent,
    };
    use pretty_assertions::assert_eq;
    use x11rb::protocol::xproto::KeyButMask;

    fn press(window: u32, button: u8, state: u16, x: i32) -> XEvent {
        XEvent::ButtonPress(ButtonEvent {
            window,
            button,
            state,
            x,
            y: 5,
            root_x: x,
            root_y: 5,
            time: 0,
        })
    }

    #[test]
    fn every_matching_key_binding_runs() {
        let mut config = Config::default();
        config.keybindings = vec![
            KeyBinding::new(vec![KeyButMask::MOD4], keysyms::XK_B, KeyAction::ToggleBar, Arg::None),
            KeyBinding::new(vec![KeyButMask::MOD4], keysyms::XK_B, KeyAction::View, Arg::UInt(4)),
            KeyBinding::new(vec![KeyButMask::MOD1], keysyms::XK_B, KeyAction::Quit, Arg::None),
        ];
        let mut wm = wm_with(&[Rect::new(0, 0, 1000, 916)], config);
        wm.conn.keysyms.borrow_mut().insert(56, keysyms::XK_B);

        let state = u16::from(KeyButMask::MOD4) | u16::from(KeyButMask::LOCK);
        wm.dispatch(XEvent::KeyPress { keycode: 56, state }).unwrap();

        assert!(!wm.state.monitors[0].show_bar);
        assert_eq!(wm.state.monitors[0].active_tags(), 4);
        assert!(wm.running);
    }

    #[test]
    fn tag_bar_click_views_the_clicked_tag() {
        let mut wm = single();
        // tag cells are one character plus 14 pixels of padding wide
        wm.dispatch(press(10_000, 1, 0, 24 * 2 + 3)).unwrap();
        assert_eq!(wm.state.monitors[0].active_tags(), 1 << 2);
    }

    #[test]
    fn clicking_a_client_focuses_and_replays() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        map(&mut wm, 6, Rect::new(0, 0, 100, 100));
        wm.conn.clear();

        wm.dispatch(press(5, 1, 0, 10)).unwrap();
        assert_eq!(wm.state.selected_client(), Some(5));
        assert!(wm.conn.calls().contains(&Call::ReplayPointer));
    }

    #[test]
    fn modified_client_click_runs_the_binding() {
        let mut config = Config::default();
        config.buttons = vec![ButtonBinding::new(
            ClickTarget::ClientWindow,
            vec![KeyButMask::MOD1],
            2,
            KeyAction::ToggleFloating,
            Arg::None,
        )];
        let mut wm = wm_with(&[Rect::new(0, 0, 1000, 916)], config);
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));

        wm.dispatch(press(5, 2, KeyButMask::MOD1.into(), 10)).unwrap();
        assert!(wm.state.client(5).unwrap().is_floating);
    }

    #[test]
    fn clicking_root_on_another_monitor_selects_it() {
        let mut wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 1000, 800)]);
        wm.conn.pointer.set(Some((1500, 400)));
        wm.dispatch(press(ROOT, 1, 0, 1500)).unwrap();
        assert_eq!(wm.state.selected_monitor, 1);
    }

    #[test]
    fn fullscreen_messages_add_remove_and_toggle() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        let message = |action| XEvent::ClientMessage {
            window: 5,
            message: ClientMessage::Fullscreen(action),
        };

        wm.dispatch(message(StateAction::Add)).unwrap();
        assert!(wm.state.client(5).unwrap().is_fullscreen);
        wm.dispatch(message(StateAction::Toggle)).unwrap();
        assert!(!wm.state.client(5).unwrap().is_fullscreen);
        wm.dispatch(message(StateAction::Toggle)).unwrap();
        wm.dispatch(message(StateAction::Remove)).unwrap();
        assert!(!wm.state.client(5).unwrap().is_fullscreen);
    }

    #[test]
    fn activation_request_marks_unfocused_client_urgent() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        map(&mut wm, 6, Rect::new(0, 0, 100, 100));
        for window in [5, 6] {
            wm.dispatch(XEvent::ClientMessage {
                window,
                message: ClientMessage::ActiveWindow,
            })
            .unwrap();
        }
        assert!(wm.state.client(5).unwrap().is_urgent);
        assert!(!wm.state.client(6).unwrap().is_urgent);
    }

    #[test]
    fn unmanaged_configure_request_is_forwarded() {
        let mut wm = single();
        let request = ConfigureRequest {
            window: 77,
            width: Some(640),
            ..Default::default()
        };
        wm.dispatch(XEvent::ConfigureRequest(request)).unwrap();
        assert_eq!(wm.conn.calls().last(), Some(&Call::Forward(request)));
    }

    #[test]
    fn tiled_client_only_gets_its_geometry_confirmed() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.conn.clear();
        let geometry = wm.state.client(5).unwrap().geometry();
        wm.dispatch(XEvent::ConfigureRequest(ConfigureRequest {
            window: 5,
            x: Some(300),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(wm.conn.calls(), vec![Call::ConfigureNotify(5, geometry, 1)]);
    }

    #[test]
    fn floating_client_moves_relative_to_its_monitor() {
        let mut wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 1000, 800)]);
        wm.state.selected_monitor = 1;
        map(&mut wm, 5, Rect::new(1000, 100, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.resize_client(5, Rect::new(1000, 100, 100, 100)).unwrap();
        wm.conn.clear();

        wm.dispatch(XEvent::ConfigureRequest(ConfigureRequest {
            window: 5,
            x: Some(10),
            y: Some(20),
            ..Default::default()
        }))
        .unwrap();
        let client = wm.state.client(5).unwrap();
        assert_eq!((client.x, client.y), (1010, 20));
        let calls = wm.conn.calls();
        assert!(calls.contains(&Call::ConfigureNotify(5, client.geometry(), 1)));
        assert!(calls.contains(&Call::MoveResize(5, client.geometry(), 1)));
    }

    #[test]
    fn oversized_floating_request_is_centred() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.state.client_mut(5).unwrap().is_floating = true;
        wm.dispatch(XEvent::ConfigureRequest(ConfigureRequest {
            window: 5,
            x: Some(900),
            width: Some(400),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(wm.state.client(5).unwrap().x, 500 - 201);
    }

    #[test]
    fn border_width_request_is_recorded() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        wm.dispatch(XEvent::ConfigureRequest(ConfigureRequest {
            window: 5,
            border_width: Some(4),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(wm.state.client(5).unwrap().border_width, 4);
    }

    #[test]
    fn removing_a_monitor_migrates_its_clients() {
        let mut wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 1000, 800)]);
        wm.state.selected_monitor = 1;
        wm.state.view(1 << 3);
        map(&mut wm, 5, Rect::new(1000, 0, 100, 100));
        map(&mut wm, 6, Rect::new(1000, 0, 100, 100));

        *wm.conn.rects.borrow_mut() = vec![Rect::new(0, 0, 1000, 800)];
        wm.dispatch(XEvent::ConfigureNotify {
            window: ROOT,
            width: 1000,
            height: 800,
        })
        .unwrap();

        assert_eq!(wm.state.monitors.len(), 1);
        assert_eq!(wm.state.selected_monitor, 0);
        for window in [5, 6] {
            let client = wm.state.client(window).unwrap();
            assert_eq!(client.monitor_index, 0);
            assert_eq!(client.tags, 1 << 3);
        }
        assert!(wm.conn.calls().contains(&Call::Destroy(10_001)));
        assert_registry_consistent(&wm);
    }

    #[test]
    fn entering_a_client_focuses_it() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        map(&mut wm, 6, Rect::new(0, 0, 100, 100));
        wm.dispatch(XEvent::EnterNotify {
            window: 5,
            ordinary: false,
        })
        .unwrap();
        assert_eq!(wm.state.selected_client(), Some(6));

        wm.dispatch(XEvent::EnterNotify {
            window: 5,
            ordinary: true,
        })
        .unwrap();
        assert_eq!(wm.state.selected_client(), Some(5));
    }

    #[test]
    fn pointer_crossing_monitors_selects_the_new_one() {
        let mut wm = wm(&[Rect::new(0, 0, 1000, 800), Rect::new(1000, 0, 1000, 800)]);
        let motion = |x| XEvent::MotionNotify {
            window: ROOT,
            root_x: x,
            root_y: 300,
            time: 0,
        };
        wm.dispatch(motion(100)).unwrap();
        assert_eq!(wm.state.selected_monitor, 0);
        wm.dispatch(motion(1100)).unwrap();
        assert_eq!(wm.state.selected_monitor, 1);
    }

    #[test]
    fn property_changes_update_the_client() {
        let mut wm = single();
        map(&mut wm, 5, Rect::new(0, 0, 100, 100));
        map(&mut wm, 6, Rect::new(0, 0, 100, 100));

        wm.conn.titles.borrow_mut().insert(5, "vim".into());
        wm.dispatch(XEvent::PropertyNotify {
            window: 5,
            property: Property::NetWmName,
            deleted: false,
        })
        .unwrap();
        assert_eq!(wm.state.client(5).unwrap().name, "vim");

        wm.dispatch(XEvent::PropertyNotify {
            window: 5,
            property: Property::WmNormalHints,
            deleted: false,
        })
        .unwrap();
        assert!(!wm.state.client(5).unwrap().hints_valid);

        wm.conn.transients.borrow_mut().insert(5, 6);
        wm.dispatch(XEvent::PropertyNotify {
            window: 5,
            property: Property::WmTransientFor,
            deleted: true,
        })
        .unwrap();
        assert!(!wm.state.client(5).unwrap().is_floating);
        wm.dispatch(XEvent::PropertyNotify {
            window: 5,
            property: Property::WmTransientFor,
            deleted: false,
        })
        .unwrap();
        assert!(wm.state.client(5).unwrap().is_floating);
    }
}
