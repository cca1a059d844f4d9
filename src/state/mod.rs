//! In-memory model of everything the window manager knows: the client arena,
//! the monitors with their attachment and recency orders, and which monitor
//! is selected. Nothing in here talks to the X server.

mod reconcile;
mod registry;
mod tags;

pub use reconcile::ReconcileOutcome;

use crate::client::{Client, TagMask};
use crate::geometry::Rect;
use crate::layout::{Layout, LayoutType, TiledClient};
use crate::monitor::{Monitor, MonitorDefaults};
use std::collections::HashMap;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone)]
pub struct WmState {
    pub clients: HashMap<Window, Client>,
    pub monitors: Vec<Monitor>,
    pub selected_monitor: usize,
    pub layouts: Vec<Layout>,
    pub tag_mask: TagMask,
    pub monitor_defaults: MonitorDefaults,
    pub bar_height: i32,
    pub screen_width: i32,
    pub screen_height: i32,
}

impl WmState {
    pub fn new(
        tag_count: usize,
        layouts: Vec<Layout>,
        mfact: f32,
        nmaster: i32,
        show_bar: bool,
        top_bar: bool,
        bar_height: i32,
    ) -> Self {
        let layouts = if layouts.is_empty() {
            Layout::defaults()
        } else {
            layouts
        };
        let tag_count = tag_count.clamp(1, 31);

        let monitor_defaults = MonitorDefaults {
            mfact,
            nmaster,
            show_bar,
            top_bar,
            layout_symbol: layouts[0].symbol.clone(),
            layout_count: layouts.len(),
        };

        Self {
            clients: HashMap::new(),
            monitors: Vec::new(),
            selected_monitor: 0,
            layouts,
            tag_mask: (1 << tag_count) - 1,
            monitor_defaults,
            bar_height,
            screen_width: 0,
            screen_height: 0,
        }
    }

    pub fn selmon(&self) -> &Monitor {
        &self.monitors[self.selected_monitor]
    }

    pub fn selmon_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.selected_monitor]
    }

    pub fn selected_client(&self) -> Option<Window> {
        self.monitors
            .get(self.selected_monitor)
            .and_then(|monitor| monitor.selected)
    }

    pub fn client(&self, window: Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn client_mut(&mut self, window: Window) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn layout_of(&self, monitor_index: usize) -> &Layout {
        let monitor = &self.monitors[monitor_index];
        &self.layouts[monitor.layout_index().min(self.layouts.len() - 1)]
    }

    pub fn layout_kind(&self, monitor_index: usize) -> LayoutType {
        self.layout_of(monitor_index).kind
    }

    pub fn is_visible(&self, window: Window) -> bool {
        self.clients.get(&window).is_some_and(|client| {
            self.monitors
                .get(client.monitor_index)
                .is_some_and(|monitor| client.is_visible_on(monitor.active_tags()))
        })
    }

    /// Most recently focused client that is visible on the monitor.
    pub fn first_visible_in_stack(&self, monitor_index: usize) -> Option<Window> {
        self.monitors[monitor_index]
            .stack
            .iter()
            .copied()
            .find(|&window| self.is_visible(window))
    }

    /// Visible, non-floating clients in attachment order.
    pub fn tiled_clients(&self, monitor_index: usize) -> Vec<TiledClient> {
        self.monitors[monitor_index]
            .clients
            .iter()
            .filter_map(|window| self.clients.get(window))
            .filter(|client| !client.is_floating && self.is_visible(client.window))
            .map(|client| TiledClient {
                window: client.window,
                border_width: client.border_width,
            })
            .collect()
    }

    pub fn visible_count(&self, monitor_index: usize) -> usize {
        self.monitors[monitor_index]
            .clients
            .iter()
            .filter(|&&window| self.is_visible(window))
            .count()
    }

    /// Tags in use and tags with an urgent client, for the bar.
    pub fn occupied_and_urgent(&self, monitor_index: usize) -> (TagMask, TagMask) {
        self.monitors[monitor_index]
            .clients
            .iter()
            .filter_map(|window| self.clients.get(window))
            .fold((0, 0), |(occupied, urgent), client| {
                let urgent_tags = if client.is_urgent { client.tags } else { 0 };
                (occupied | client.tags, urgent | urgent_tags)
            })
    }

    /// The monitor whose window area overlaps `rect` the most, falling back to
    /// the selected monitor.
    pub fn rect_to_monitor(&self, rect: Rect) -> usize {
        let mut best = self.selected_monitor;
        let mut best_area = 0;
        for (index, monitor) in self.monitors.iter().enumerate() {
            let area = rect.intersection_area(&monitor.window_area);
            if area > best_area {
                best_area = area;
                best = index;
            }
        }
        best
    }

    /// Next (`direction > 0`) or previous monitor, wrapping around.
    pub fn direction_to_monitor(&self, direction: i32) -> usize {
        let count = self.monitors.len();
        if direction > 0 {
            (self.selected_monitor + 1) % count
        } else {
            (self.selected_monitor + count - 1) % count
        }
    }

    pub fn monitor_of_bar(&self, window: Window) -> Option<usize> {
        self.monitors
            .iter()
            .position(|monitor| monitor.bar_window == Some(window))
    }

    /// Every client window, monitor by monitor in attachment order.
    pub fn all_windows(&self) -> Vec<Window> {
        self.monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter().copied())
            .collect()
    }
}
