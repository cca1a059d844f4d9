use super::WmState;
use crate::geometry::Rect;
use crate::monitor::{Monitor, unique_geometries};
use log::{debug, info};
use x11rb::protocol::xproto::Window;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub dirty: bool,
    /// Bars of monitors that no longer exist and must be destroyed.
    pub removed_bars: Vec<Window>,
}

impl WmState {
    /// Brings the monitor list in line with the display rectangles currently
    /// reported by the server.
    pub fn reconcile(&mut self, rects: &[Rect]) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let mut unique = unique_geometries(rects);
        if unique.is_empty() {
            unique.push(Rect::new(0, 0, self.screen_width, self.screen_height));
        }

        let existing = self.monitors.len();
        for num in existing..unique.len() {
            debug!("adding monitor {num}");
            self.monitors.push(Monitor::new(num, &self.monitor_defaults));
        }

        for (index, rect) in unique.iter().enumerate() {
            let monitor = &mut self.monitors[index];
            if index >= existing || monitor.area != *rect {
                outcome.dirty = true;
                monitor.num = index;
                monitor.area = *rect;
                monitor.update_bar_position(self.bar_height);
            }
        }

        while self.monitors.len() > unique.len() {
            let index = self.monitors.len() - 1;
            outcome.dirty = true;
            info!("monitor {index} disappeared, moving its clients to monitor 0");

            while let Some(&window) = self.monitors[index].clients.first() {
                self.migrate(window, 0);
            }

            let removed = self.monitors.remove(index);
            if let Some(bar) = removed.bar_window {
                outcome.removed_bars.push(bar);
            }
            if self.selected_monitor == index {
                self.selected_monitor = 0;
            }
        }

        if outcome.dirty && self.selected_monitor >= self.monitors.len() {
            self.selected_monitor = 0;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::geometry::Rect;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_run_creates_one_monitor_per_unique_display() {
        let state = state_with_monitors(&[
            Rect::new(0, 0, 1920, 1080),
            Rect::new(0, 0, 1920, 1080),
            Rect::new(1920, 0, 1280, 1024),
        ]);
        assert_eq!(state.monitors.len(), 2);
        assert_eq!(state.monitors[1].area, Rect::new(1920, 0, 1280, 1024));
        assert_eq!(state.monitors[1].window_area, Rect::new(1920, 20, 1280, 1004));
        assert_eq!(state.monitors[1].num, 1);
    }

    #[test]
    fn unchanged_layout_is_not_dirty() {
        let rects = [Rect::new(0, 0, 800, 600)];
        let mut state = state_with_monitors(&rects);
        assert!(!state.reconcile(&rects).dirty);
    }

    #[test]
    fn no_rectangles_falls_back_to_the_screen() {
        let mut state = state_with_monitors(&[Rect::new(0, 0, 800, 600)]);
        state.screen_width = 1024;
        state.screen_height = 768;
        assert!(state.reconcile(&[]).dirty);
        assert_eq!(state.monitors[0].area, Rect::new(0, 0, 1024, 768));
    }

    #[test]
    fn removed_monitor_hands_clients_to_the_first_with_tags_intact() {
        let mut state = state_with_monitors(&[
            Rect::new(0, 0, 1000, 800),
            Rect::new(1000, 0, 1000, 800),
        ]);
        add_client(&mut state, 1, 0, 1);
        add_client(&mut state, 2, 1, 1 << 2);
        add_client(&mut state, 3, 1, 1 << 4);
        state.monitors[1].bar_window = Some(99);
        state.monitors[1].selected = Some(3);
        state.selected_monitor = 1;

        let outcome = state.reconcile(&[Rect::new(0, 0, 1000, 800)]);

        assert!(outcome.dirty);
        assert_eq!(outcome.removed_bars, vec![99]);
        assert_eq!(state.monitors.len(), 1);
        assert_eq!(state.selected_monitor, 0);
        let mut clients = state.monitors[0].clients.clone();
        clients.sort();
        assert_eq!(clients, vec![1, 2, 3]);
        assert_eq!(state.monitors[0].stack.len(), 3);
        assert_eq!(state.client(2).unwrap().tags, 1 << 2);
        assert_eq!(state.client(3).unwrap().tags, 1 << 4);
        assert!(state.clients.values().all(|c| c.monitor_index == 0));
    }

    #[test]
    fn resized_display_updates_geometry_in_place() {
        let mut state = state_with_monitors(&[
            Rect::new(0, 0, 1000, 800),
            Rect::new(1000, 0, 1000, 800),
        ]);
        let outcome = state.reconcile(&[Rect::new(0, 0, 1280, 1024)]);
        assert!(outcome.dirty);
        assert_eq!(state.monitors[0].area, Rect::new(0, 0, 1280, 1024));
        assert_eq!(state.monitors[0].window_area, Rect::new(0, 20, 1280, 1004));
    }
}
