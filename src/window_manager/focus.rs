use super::WindowManager;
use crate::errors::WmResult;
use crate::mouse::client_buttons;
use crate::xconnection::{WmProtocol, XConn};
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Focuses `window`, or the most recent visible client of the selected
    /// monitor when `window` is `None` or hidden.
    pub(crate) fn focus(&mut self, window: Option<Window>) -> WmResult<()> {
        let selected_monitor = self.state.selected_monitor;
        let window = window
            .filter(|&w| self.state.is_visible(w))
            .or_else(|| self.state.first_visible_in_stack(selected_monitor));

        if let Some(previous) = self.state.selected_client() {
            if Some(previous) != window {
                self.unfocus(previous, false)?;
            }
        }

        match window {
            Some(window) => {
                let Some(client) = self.state.client(window) else {
                    return Ok(());
                };
                let monitor_index = client.monitor_index;
                let urgent = client.is_urgent;

                self.state.selected_monitor = monitor_index;
                if urgent {
                    self.set_urgent(window, false)?;
                }
                self.state.raise_in_stack(window);
                self.grab_buttons(window, true)?;
                self.conn
                    .set_border_color(window, self.config.scheme_selected.border)?;
                self.set_focus(window)?;
            }
            None => {
                self.conn.set_input_focus(self.conn.root())?;
                self.conn.set_active_window(None)?;
            }
        }

        self.state.selmon_mut().selected = window;
        self.draw_bars();
        Ok(())
    }

    pub(crate) fn unfocus(&mut self, window: Window, reset_focus: bool) -> WmResult<()> {
        if self.state.client(window).is_none() {
            return Ok(());
        }
        self.grab_buttons(window, false)?;
        self.conn
            .set_border_color(window, self.config.scheme_normal.border)?;
        if reset_focus {
            self.conn.set_input_focus(self.conn.root())?;
            self.conn.set_active_window(None)?;
        }
        Ok(())
    }

    /// Hands input focus to a client. Clients that refuse input only get the
    /// take-focus message.
    pub(crate) fn set_focus(&mut self, window: Window) -> WmResult<()> {
        let never_focus = self.state.client(window).is_some_and(|c| c.never_focus);
        if !never_focus {
            self.conn.set_input_focus(window)?;
            self.conn.set_active_window(Some(window))?;
        }
        if self.conn.supports_protocol(window, WmProtocol::TakeFocus) {
            self.conn.send_protocol(window, WmProtocol::TakeFocus)?;
        }
        Ok(())
    }

    pub(crate) fn set_urgent(&mut self, window: Window, urgent: bool) -> WmResult<()> {
        if let Some(client) = self.state.client_mut(window) {
            client.is_urgent = urgent;
        }
        self.conn.set_urgency_hint(window, urgent)
    }

    /// Unfocused clients grab every button so a click focuses them.
    pub(crate) fn grab_buttons(&mut self, window: Window, focused: bool) -> WmResult<()> {
        let buttons = client_buttons(&self.config.buttons);
        self.conn.grab_buttons(window, focused, &buttons)
    }
}
