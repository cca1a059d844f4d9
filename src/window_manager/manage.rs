use super::WindowManager;
use crate::client::Client;
use crate::errors::WmResult;
use crate::rules::{WindowIdentity, apply_rules};
use crate::xconnection::{ClientState, WindowAttributes, XConn};
use log::debug;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Takes over every window that was already mapped when we started.
    /// Transients come last so their parents are known by then.
    pub(crate) fn scan(&mut self) -> WmResult<()> {
        let candidates: Vec<(Window, WindowAttributes, bool)> = self
            .conn
            .query_tree()?
            .into_iter()
            .filter_map(|window| {
                let attributes = self.conn.window_attributes(window)?;
                if attributes.override_redirect {
                    return None;
                }
                let mapped = attributes.viewable
                    || self.conn.client_state(window) == Some(ClientState::Iconic);
                let transient = self.conn.transient_for(window).is_some();
                mapped.then_some((window, attributes, transient))
            })
            .collect();

        for pass_transients in [false, true] {
            for &(window, attributes, transient) in &candidates {
                if transient == pass_transients {
                    self.manage(window, &attributes)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn manage(&mut self, window: Window, attributes: &WindowAttributes) -> WmResult<()> {
        let mut client = Client::new(window, self.state.selected_monitor, 0);
        // the old geometry starts out equal to the current one
        client.set_geometry(attributes.geometry);
        client.set_geometry(attributes.geometry);
        client.old_border_width = attributes.border_width;
        if let Some(title) = self.conn.window_title(window) {
            client.name = title;
        }

        let transient_for = self.conn.transient_for(window);
        let parent = transient_for.and_then(|parent| self.state.client(parent));
        match parent {
            Some(parent) => {
                client.monitor_index = parent.monitor_index;
                client.tags = parent.tags;
            }
            None => {
                let identity = WindowIdentity::new(self.conn.class_hint(window), &client.name);
                let outcome = apply_rules(&self.config.rules, &identity, self.state.monitors.len());
                client.is_floating = outcome.is_floating;
                if let Some(monitor) = outcome.monitor {
                    client.monitor_index = monitor;
                }
                let tags = outcome.tags & self.state.tag_mask;
                client.tags = if tags != 0 {
                    tags
                } else {
                    self.state.monitors[client.monitor_index].active_tags()
                };
            }
        }

        let area = self.state.monitors[client.monitor_index].window_area;
        if client.x + client.width_with_border() > area.right() {
            client.x = area.right() - client.width_with_border();
        }
        if client.y + client.height_with_border() > area.bottom() {
            client.y = area.bottom() - client.height_with_border();
        }
        client.x = client.x.max(area.x);
        client.y = client.y.max(area.y);
        client.border_width = self.config.border_width;

        let geometry = client.geometry();
        let monitor_index = client.monitor_index;
        debug!(
            "managing {window:#x} {:?} on monitor {monitor_index} with tags {:#b}",
            client.name, client.tags
        );
        self.state.insert_client(client);

        self.conn
            .set_border_width(window, self.config.border_width)?;
        self.conn
            .set_border_color(window, self.config.scheme_normal.border)?;
        self.conn
            .send_configure_notify(window, geometry, self.config.border_width)?;
        self.update_window_type(window)?;
        self.update_size_hints(window);
        self.update_wm_hints(window)?;
        self.conn.select_client_input(window)?;
        self.grab_buttons(window, false)?;

        if let Some(client) = self.state.client_mut(window) {
            if !client.is_floating {
                client.is_floating = transient_for.is_some() || client.is_fixed;
                client.old_state = client.is_floating;
            }
            if client.is_floating {
                self.conn.raise(window)?;
            }
        }

        self.state.attach(window);
        self.state.attach_stack(window);
        self.conn.append_client_list(window)?;
        let parked = crate::geometry::Rect {
            x: geometry.x + 2 * self.state.screen_width,
            ..geometry
        };
        self.conn
            .move_resize(window, parked, self.config.border_width)?;
        self.conn.set_client_state(window, ClientState::Normal)?;

        if monitor_index == self.state.selected_monitor {
            if let Some(previous) = self.state.selected_client() {
                self.unfocus(previous, false)?;
            }
        }
        if self.state.is_visible(window) {
            self.state.monitors[monitor_index].selected = Some(window);
        }
        self.arrange(Some(monitor_index))?;
        self.conn.map(window)?;
        self.focus(None)
    }

    /// Forgets a client. A window that still exists gets its original border
    /// back and is marked withdrawn.
    pub(crate) fn unmanage(&mut self, window: Window, destroyed: bool) -> WmResult<()> {
        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let monitor_index = client.monitor_index;
        let old_border_width = client.old_border_width;

        self.state.detach(window);
        self.state.detach_stack(window);
        self.state.remove_client(window);
        debug!("unmanaged {window:#x} (destroyed: {destroyed})");

        if !destroyed {
            self.conn.set_border_width(window, old_border_width)?;
            self.conn.grab_buttons(window, true, &[])?;
            self.conn.set_client_state(window, ClientState::Withdrawn)?;
        }

        self.focus(None)?;
        self.update_client_list()?;
        self.arrange(Some(monitor_index))
    }

    pub(crate) fn update_client_list(&mut self) -> WmResult<()> {
        let windows = self.state.all_windows();
        self.conn.set_client_list(&windows)
    }

    pub(crate) fn update_title(&mut self, window: Window) {
        let title = self.conn.window_title(window);
        if let Some(client) = self.state.client_mut(window) {
            client.name = title.unwrap_or_else(|| crate::client::BROKEN.to_string());
        }
    }

    pub(crate) fn update_size_hints(&mut self, window: Window) {
        let hints = self.conn.size_hints(window);
        if let Some(client) = self.state.client_mut(window) {
            client.update_size_hints(hints.as_ref());
        }
    }

    pub(crate) fn update_window_type(&mut self, window: Window) -> WmResult<()> {
        let window_type = self.conn.window_type(window);
        if window_type.fullscreen {
            self.set_fullscreen(window, true)?;
        }
        if window_type.dialog {
            if let Some(client) = self.state.client_mut(window) {
                client.is_floating = true;
            }
        }
        Ok(())
    }

    /// Urgency on the focused client is cleared right away instead of shown.
    pub(crate) fn update_wm_hints(&mut self, window: Window) -> WmResult<()> {
        let Some(hints) = self.conn.wm_hints(window) else {
            return Ok(());
        };
        let is_selected = self.state.selected_client() == Some(window);
        if is_selected && hints.urgent {
            self.conn.set_urgency_hint(window, false)?;
        }
        if let Some(client) = self.state.client_mut(window) {
            if !is_selected {
                client.is_urgent = hints.urgent;
            }
            client.never_focus = hints.input.is_some_and(|input| !input);
        }
        Ok(())
    }

    pub(crate) fn set_fullscreen(&mut self, window: Window, fullscreen: bool) -> WmResult<()> {
        let Some(monitor_index) = self.state.client(window).map(|c| c.monitor_index) else {
            return Ok(());
        };
        let area = self.state.monitors[monitor_index].area;
        let Some(client) = self.state.client_mut(window) else {
            return Ok(());
        };

        if fullscreen && !client.is_fullscreen {
            client.is_fullscreen = true;
            client.old_state = client.is_floating;
            client.old_border_width = client.border_width;
            client.border_width = 0;
            client.is_floating = true;
            self.conn.set_fullscreen_state(window, true)?;
            self.resize_client(window, area)?;
            self.conn.raise(window)?;
        } else if !fullscreen && client.is_fullscreen {
            client.is_fullscreen = false;
            client.is_floating = client.old_state;
            client.border_width = client.old_border_width;
            let previous = client.old_geometry();
            self.conn.set_fullscreen_state(window, false)?;
            self.resize_client(window, previous)?;
            self.arrange(Some(monitor_index))?;
        }
        Ok(())
    }
}
