use super::WmState;
use crate::client::Client;
use x11rb::protocol::xproto::Window;

impl WmState {
    pub fn insert_client(&mut self, client: Client) {
        self.clients.insert(client.window, client);
    }

    /// Drops a client from the arena. It must already be detached from both
    /// orders of its monitor.
    pub fn remove_client(&mut self, window: Window) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        if let Some(monitor) = self.monitors.get(client.monitor_index) {
            assert!(
                !monitor.clients.contains(&window) && !monitor.stack.contains(&window),
                "client {window:#x} removed while still attached"
            );
        }
        Some(client)
    }

    fn owner_of(&self, window: Window) -> usize {
        match self.clients.get(&window) {
            Some(client) => client.monitor_index,
            None => panic!("window {window:#x} is not a managed client"),
        }
    }

    /// Inserts the client at the head of its monitor's attachment order.
    pub fn attach(&mut self, window: Window) {
        let owner = self.owner_of(window);
        let monitor = &mut self.monitors[owner];
        assert!(
            !monitor.clients.contains(&window),
            "client {window:#x} attached twice"
        );
        monitor.clients.insert(0, window);
    }

    pub fn detach(&mut self, window: Window) {
        let owner = self.owner_of(window);
        let monitor = &mut self.monitors[owner];
        monitor.clients.retain(|&w| w != window);
    }

    /// Inserts the client at the head of its monitor's recency order.
    pub fn attach_stack(&mut self, window: Window) {
        let owner = self.owner_of(window);
        let monitor = &mut self.monitors[owner];
        assert!(
            !monitor.stack.contains(&window),
            "client {window:#x} stacked twice"
        );
        monitor.stack.insert(0, window);
    }

    /// Removes the client from the recency order. When it was the monitor's
    /// selection, the most recent visible client takes over.
    pub fn detach_stack(&mut self, window: Window) {
        let monitor_index = self.owner_of(window);
        self.monitors[monitor_index].stack.retain(|&w| w != window);

        if self.monitors[monitor_index].selected == Some(window) {
            self.monitors[monitor_index].selected = self.first_visible_in_stack(monitor_index);
        }
    }

    /// Moves a client to the head of the recency order only.
    pub fn raise_in_stack(&mut self, window: Window) {
        let monitor_index = self.owner_of(window);
        let monitor = &mut self.monitors[monitor_index];
        monitor.stack.retain(|&w| w != window);
        monitor.stack.insert(0, window);
    }

    /// Re-homes a client: leaves both orders of its monitor, changes owner and
    /// joins the head of both orders on `target`.
    pub fn migrate(&mut self, window: Window, target: usize) {
        self.detach(window);
        self.detach_stack(window);
        if let Some(client) = self.clients.get_mut(&window) {
            client.monitor_index = target;
        }
        self.attach(window);
        self.attach_stack(window);
    }

    /// Promotes a client to the head of the attachment order.
    pub fn pop(&mut self, window: Window) {
        self.detach(window);
        self.attach(window);
    }

    pub fn next_tiled_after(&self, window: Window) -> Option<Window> {
        let monitor = &self.monitors[self.owner_of(window)];
        let position = monitor.clients.iter().position(|&w| w == window)?;
        monitor.clients[position + 1..]
            .iter()
            .copied()
            .find(|w| self.clients.get(w).is_some_and(|c| !c.is_floating) && self.is_visible(*w))
    }

    pub fn first_tiled(&self, monitor_index: usize) -> Option<Window> {
        self.tiled_clients(monitor_index)
            .first()
            .map(|client| client.window)
    }

    /// Cycles focus through visible clients of the selected monitor in
    /// attachment order, wrapping at either end.
    pub fn stack_neighbour(&self, direction: i32) -> Option<Window> {
        let monitor = self.selmon();
        let selected = monitor.selected?;
        let position = monitor.clients.iter().position(|&w| w == selected)?;
        let visible = |w: &&Window| self.is_visible(**w);

        if direction > 0 {
            monitor.clients[position + 1..]
                .iter()
                .find(visible)
                .or_else(|| monitor.clients.iter().find(visible))
                .copied()
        } else {
            monitor.clients[..position]
                .iter()
                .rev()
                .find(visible)
                .or_else(|| monitor.clients[position..].iter().rev().find(visible))
                .copied()
        }
    }
}
