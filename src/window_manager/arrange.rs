use super::WindowManager;
use crate::errors::WmResult;
use crate::geometry::Rect;
use crate::layout::ArrangeParams;
use crate::size_hints::{HintContext, apply_size_hints};
use crate::xconnection::XConn;
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    /// Requests `geometry` for a client, subject to its size hints. Nothing is
    /// sent when the result matches the current geometry.
    pub(crate) fn resize(&mut self, window: Window, geometry: Rect, interact: bool) -> WmResult<()> {
        if self.state.client(window).is_some_and(|c| !c.hints_valid) {
            let hints = self.conn.size_hints(window);
            if let Some(client) = self.state.client_mut(window) {
                client.update_size_hints(hints.as_ref());
            }
        }

        let Some(client) = self.state.client(window) else {
            return Ok(());
        };
        let monitor = &self.state.monitors[client.monitor_index];
        let context = HintContext {
            interact,
            screen_width: self.state.screen_width,
            screen_height: self.state.screen_height,
            work_area: monitor.window_area,
            bar_height: self.state.bar_height,
            respect_hints: self.config.resize_hints
                || client.is_floating
                || !self.state.layout_kind(client.monitor_index).arranges(),
        };

        let mut geometry = geometry;
        if apply_size_hints(client, &mut geometry, &context) {
            self.resize_client(window, geometry)?;
        }
        Ok(())
    }

    /// Applies `geometry` unconditionally and tells the client about it.
    pub(crate) fn resize_client(&mut self, window: Window, geometry: Rect) -> WmResult<()> {
        let Some(client) = self.state.client_mut(window) else {
            return Ok(());
        };
        client.set_geometry(geometry);
        let border_width = client.border_width;
        self.conn.move_resize(window, geometry, border_width)?;
        self.conn
            .send_configure_notify(window, geometry, border_width)
    }

    /// Re-runs the layout of one monitor, or of all of them when `None`.
    pub(crate) fn arrange(&mut self, monitor: Option<usize>) -> WmResult<()> {
        match monitor {
            Some(index) => {
                self.show_hide(index)?;
                self.arrange_monitor(index)?;
                self.restack(index)
            }
            None => {
                for index in 0..self.state.monitors.len() {
                    self.show_hide(index)?;
                }
                for index in 0..self.state.monitors.len() {
                    self.arrange_monitor(index)?;
                }
                Ok(())
            }
        }
    }

    fn arrange_monitor(&mut self, index: usize) -> WmResult<()> {
        let layout = self.state.layout_of(index).clone();
        self.state.monitors[index].layout_symbol = layout.symbol;
        let monitor = &self.state.monitors[index];
        let params = ArrangeParams {
            window_area: monitor.window_area,
            mfact: monitor.mfact,
            nmaster: monitor.nmaster,
            visible_count: self.state.visible_count(index),
        };
        let tiled = self.state.tiled_clients(index);

        let mut failure = None;
        let symbol = layout.kind.arrange(&params, &tiled, &mut |window, geometry| {
            if let Err(e) = self.resize(window, geometry, false) {
                failure.get_or_insert(e);
            }
            self.state
                .client(window)
                .map_or(geometry, |client| client.geometry())
        });
        if let Some(e) = failure {
            return Err(e);
        }

        if let Some(symbol) = symbol {
            self.state.monitors[index].layout_symbol = symbol;
        }
        Ok(())
    }

    /// Moves visible clients into place, most recent first, then parks hidden
    /// ones off-screen, least recent first.
    fn show_hide(&mut self, index: usize) -> WmResult<()> {
        let floating_layout = !self.state.layout_kind(index).arranges();
        let (visible, hidden): (Vec<Window>, Vec<Window>) = self.state.monitors[index]
            .stack
            .iter()
            .copied()
            .partition(|window| self.state.is_visible(*window));

        for window in visible {
            let Some(client) = self.state.client(window) else {
                continue;
            };
            let geometry = client.geometry();
            let refit = (floating_layout || client.is_floating) && !client.is_fullscreen;
            self.conn.move_window(window, geometry.x, geometry.y)?;
            if refit {
                self.resize(window, geometry, false)?;
            }
        }

        for window in hidden.into_iter().rev() {
            if let Some(client) = self.state.client(window) {
                let x = -2 * client.width_with_border();
                self.conn.move_window(window, x, client.y)?;
            }
        }
        Ok(())
    }

    /// Raises the selection when it floats and stacks the tiled clients below
    /// the bar in recency order.
    pub(crate) fn restack(&mut self, index: usize) -> WmResult<()> {
        self.draw_bar(index);
        let monitor = &self.state.monitors[index];
        let Some(selected) = monitor.selected else {
            return Ok(());
        };
        let arranges = self.state.layout_kind(index).arranges();

        if self.state.client(selected).is_some_and(|c| c.is_floating) || !arranges {
            self.conn.raise(selected)?;
        }
        if arranges {
            let mut sibling = monitor.bar_window;
            for &window in &monitor.stack {
                let tiled = self.state.client(window).is_some_and(|c| !c.is_floating);
                if !tiled || !self.state.is_visible(window) {
                    continue;
                }
                if let Some(sibling) = sibling {
                    self.conn.stack_below(window, sibling)?;
                }
                sibling = Some(window);
            }
        }
        self.conn.discard_enter_events()
    }
}
