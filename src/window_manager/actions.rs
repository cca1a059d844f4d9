use super::WindowManager;
use crate::errors::WmResult;
use crate::keyboard::{Arg, KeyAction};
use crate::spawn;
use crate::xconnection::{WmProtocol, XConn};
use log::{info, warn};
use x11rb::protocol::xproto::Window;

impl<X: XConn> WindowManager<X> {
    pub(crate) fn run_action(&mut self, action: KeyAction, arg: &Arg) -> WmResult<()> {
        let selmon = self.state.selected_monitor;

        match action {
            KeyAction::Spawn => self.spawn(arg),
            KeyAction::KillClient => self.kill_client(),
            KeyAction::FocusStack => self.focus_stack(arg.as_int()),
            KeyAction::FocusMonitor => self.focus_monitor(arg.as_int()),
            KeyAction::TagMonitor => {
                if let Some(window) = self.state.selected_client() {
                    if self.state.monitors.len() > 1 {
                        let target = self.state.direction_to_monitor(arg.as_int());
                        self.send_to_monitor(window, target)?;
                    }
                }
                Ok(())
            }
            KeyAction::IncNMaster => {
                self.state.inc_nmaster(arg.as_int());
                self.arrange(Some(selmon))
            }
            KeyAction::SetMFact => {
                if matches!(arg, Arg::None) || !self.state.set_mfact(arg.as_float()) {
                    return Ok(());
                }
                self.arrange(Some(selmon))
            }
            KeyAction::SetLayout => {
                let index = match arg {
                    Arg::Int(index) => usize::try_from(*index).ok(),
                    Arg::UInt(index) => Some(*index as usize),
                    _ => None,
                };
                self.state.set_layout(index);
                if self.state.selected_client().is_some() {
                    self.arrange(Some(selmon))
                } else {
                    self.draw_bar(selmon);
                    Ok(())
                }
            }
            KeyAction::View => {
                let changed = self.state.view(arg.as_uint());
                self.refocus_if(changed)
            }
            KeyAction::ToggleView => {
                let changed = self.state.toggle_view(arg.as_uint());
                self.refocus_if(changed)
            }
            KeyAction::Tag => {
                let changed = self.state.tag_selected(arg.as_uint());
                self.refocus_if(changed)
            }
            KeyAction::ToggleTag => {
                let changed = self.state.toggle_tag_selected(arg.as_uint());
                self.refocus_if(changed)
            }
            KeyAction::ToggleBar => {
                self.state.toggle_bar();
                let monitor = self.state.selmon();
                if let Some(bar) = monitor.bar_window {
                    let geometry = monitor.bar_geometry(self.state.bar_height);
                    self.conn.move_resize(bar, geometry, 0)?;
                }
                self.arrange(Some(selmon))
            }
            KeyAction::ToggleFloating => self.toggle_floating(),
            KeyAction::ToggleFullScreen => {
                let Some(window) = self.state.selected_client() else {
                    return Ok(());
                };
                let fullscreen = self.state.client(window).is_some_and(|c| c.is_fullscreen);
                self.set_fullscreen(window, !fullscreen)
            }
            KeyAction::Zoom => self.zoom(),
            KeyAction::MoveMouse => self.start_move(),
            KeyAction::ResizeMouse => self.start_resize(),
            KeyAction::Quit => {
                info!("quit requested");
                self.running = false;
                Ok(())
            }
            KeyAction::Restart => {
                info!("restart requested");
                self.restart = true;
                self.running = false;
                Ok(())
            }
        }
    }

    fn refocus_if(&mut self, changed: bool) -> WmResult<()> {
        if !changed {
            return Ok(());
        }
        self.focus(None)?;
        self.arrange(Some(self.state.selected_monitor))
    }

    /// dmenu is pointed at the selected monitor.
    fn spawn(&mut self, arg: &Arg) -> WmResult<()> {
        let Some(mut argv) = arg.as_command() else {
            warn!("spawn without a command");
            return Ok(());
        };
        if argv[0].starts_with("dmenu") {
            if let Some(position) = argv.iter().position(|a| a == "-m") {
                if let Some(value) = argv.get_mut(position + 1) {
                    *value = self.state.selmon().num.to_string();
                }
            }
        }
        if let Err(e) = spawn::spawn(&argv) {
            warn!("failed to spawn {:?}: {e}", argv[0]);
        }
        Ok(())
    }

    /// Asks politely when the client supports it, otherwise kills its
    /// connection.
    fn kill_client(&mut self) -> WmResult<()> {
        let Some(window) = self.state.selected_client() else {
            return Ok(());
        };
        if self.conn.supports_protocol(window, WmProtocol::DeleteWindow) {
            self.conn.send_protocol(window, WmProtocol::DeleteWindow)
        } else {
            self.conn.kill_client(window)
        }
    }

    fn focus_stack(&mut self, direction: i32) -> WmResult<()> {
        let Some(selected) = self.state.selected_client() else {
            return Ok(());
        };
        let fullscreen = self.state.client(selected).is_some_and(|c| c.is_fullscreen);
        if fullscreen && self.config.lock_fullscreen {
            return Ok(());
        }
        if let Some(next) = self.state.stack_neighbour(direction) {
            self.focus(Some(next))?;
            self.restack(self.state.selected_monitor)?;
        }
        Ok(())
    }

    fn focus_monitor(&mut self, direction: i32) -> WmResult<()> {
        if self.state.monitors.len() <= 1 {
            return Ok(());
        }
        let target = self.state.direction_to_monitor(direction);
        if target == self.state.selected_monitor {
            return Ok(());
        }
        if let Some(selected) = self.state.selected_client() {
            self.unfocus(selected, false)?;
        }
        self.state.selected_monitor = target;
        self.focus(None)
    }

    /// Moves a client to another monitor, where it shows up on whatever tags
    /// that monitor is viewing.
    pub(crate) fn send_to_monitor(&mut self, window: Window, target: usize) -> WmResult<()> {
        if self.state.client(window).is_none_or(|c| c.monitor_index == target) {
            return Ok(());
        }
        self.unfocus(window, true)?;
        self.state.migrate(window, target);
        let tags = self.state.monitors[target].active_tags();
        if let Some(client) = self.state.client_mut(window) {
            client.tags = tags;
        }
        self.focus(None)?;
        self.arrange(None)
    }

    pub(crate) fn toggle_floating(&mut self) -> WmResult<()> {
        match self.state.selected_client() {
            Some(window) => self.toggle_floating_client(window),
            None => Ok(()),
        }
    }

    pub(crate) fn toggle_floating_client(&mut self, window: Window) -> WmResult<()> {
        let Some(client) = self.state.client_mut(window) else {
            return Ok(());
        };
        // fullscreen clients keep floating until they leave fullscreen
        if client.is_fullscreen {
            return Ok(());
        }
        client.is_floating = !client.is_floating || client.is_fixed;
        if client.is_floating {
            let geometry = client.geometry();
            self.resize(window, geometry, false)?;
        }
        let monitor_index = self
            .state
            .client(window)
            .map_or(self.state.selected_monitor, |c| c.monitor_index);
        self.arrange(Some(monitor_index))
    }

    /// Swaps the selection into the master area, or the next tiled client
    /// when the selection is already there.
    fn zoom(&mut self) -> WmResult<()> {
        let selmon = self.state.selected_monitor;
        let Some(mut window) = self.state.selected_client() else {
            return Ok(());
        };
        let floating = self.state.client(window).is_some_and(|c| c.is_floating);
        if !self.state.layout_kind(selmon).arranges() || floating {
            return Ok(());
        }
        if self.state.first_tiled(selmon) == Some(window) {
            match self.state.next_tiled_after(window) {
                Some(next) => window = next,
                None => return Ok(()),
            }
        }
        self.state.pop(window);
        self.focus(Some(window))?;
        self.arrange(Some(selmon))
    }
}
