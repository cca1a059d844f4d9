use super::WmState;
use crate::client::TagMask;
use crate::monitor::{MFACT_MAX, MFACT_MIN};

impl WmState {
    /// Shows `mask` on the selected monitor. A zero mask switches back to the
    /// previously viewed tag set. Returns whether anything changed.
    pub fn view(&mut self, mask: TagMask) -> bool {
        let tag_mask = self.tag_mask;
        let monitor = self.selmon_mut();
        if mask & tag_mask == monitor.active_tags() {
            return false;
        }
        monitor.selected_tags ^= 1;
        if mask & tag_mask != 0 {
            monitor.tagset[monitor.selected_tags] = mask & tag_mask;
        }
        true
    }

    pub fn toggle_view(&mut self, mask: TagMask) -> bool {
        let tag_mask = self.tag_mask;
        let monitor = self.selmon_mut();
        let new_tagset = monitor.active_tags() ^ (mask & tag_mask);
        if new_tagset == 0 {
            return false;
        }
        let selected = monitor.selected_tags;
        monitor.tagset[selected] = new_tagset;
        true
    }

    /// Retags the selected client.
    pub fn tag_selected(&mut self, mask: TagMask) -> bool {
        let mask = mask & self.tag_mask;
        if mask == 0 {
            return false;
        }
        let Some(window) = self.selected_client() else {
            return false;
        };
        match self.client_mut(window) {
            Some(client) => {
                client.tags = mask;
                true
            }
            None => false,
        }
    }

    pub fn toggle_tag_selected(&mut self, mask: TagMask) -> bool {
        let tag_mask = self.tag_mask;
        let Some(window) = self.selected_client() else {
            return false;
        };
        let Some(client) = self.client_mut(window) else {
            return false;
        };
        let new_tags = client.tags ^ (mask & tag_mask);
        if new_tags == 0 {
            return false;
        }
        client.tags = new_tags;
        true
    }

    /// Values below 1.0 adjust the master factor, values from 1.0 up set it to
    /// `value - 1.0`. Results outside the allowed range are rejected, as is
    /// any change under a layout that does not arrange.
    pub fn set_mfact(&mut self, value: f32) -> bool {
        if !self.layout_kind(self.selected_monitor).arranges() {
            return false;
        }
        let monitor = self.selmon_mut();
        let mfact = if value < 1.0 {
            value + monitor.mfact
        } else {
            value - 1.0
        };
        if !(MFACT_MIN..=MFACT_MAX).contains(&mfact) {
            return false;
        }
        monitor.mfact = mfact;
        true
    }

    pub fn inc_nmaster(&mut self, delta: i32) {
        let monitor = self.selmon_mut();
        monitor.nmaster = (monitor.nmaster + delta).max(0);
    }

    /// Selects layout `index`, or flips to the other layout slot when `index`
    /// is `None` or already the current layout.
    pub fn set_layout(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.layouts.len());
        let monitor = &mut self.monitors[self.selected_monitor];
        if index != Some(monitor.layout_index()) {
            monitor.selected_layout ^= 1;
        }
        if let Some(index) = index {
            monitor.layouts[monitor.selected_layout] = index;
        }
        let symbol = self.layouts[self.monitors[self.selected_monitor].layout_index()]
            .symbol
            .clone();
        self.selmon_mut().layout_symbol = symbol;
    }

    pub fn toggle_bar(&mut self) {
        let bar_height = self.bar_height;
        let monitor = self.selmon_mut();
        monitor.show_bar = !monitor.show_bar;
        monitor.update_bar_position(bar_height);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::super::WmState;
    use crate::geometry::Rect;
    use crate::layout::LayoutType;
    use pretty_assertions::assert_eq;

    fn state() -> WmState {
        let mut state = state_with_monitors(&[Rect::new(0, 0, 1000, 800)]);
        add_client(&mut state, 1, 0, 1);
        state.monitors[0].selected = Some(1);
        state
    }

    #[test]
    fn view_flips_selector_and_zero_returns_to_previous() {
        let mut state = state();
        assert!(state.view(1 << 3));
        assert_eq!(state.selmon().active_tags(), 1 << 3);
        assert!(state.view(0));
        assert_eq!(state.selmon().active_tags(), 1);
        assert!(!state.view(1));
    }

    #[test]
    fn view_masks_out_unknown_tags() {
        let mut state = state();
        assert!(state.view(u32::MAX));
        assert_eq!(state.selmon().active_tags(), state.tag_mask);
    }

    #[test]
    fn toggle_view_never_empties_the_tag_set() {
        let mut state = state();
        assert!(!state.toggle_view(1));
        assert_eq!(state.selmon().active_tags(), 1);
        assert!(state.toggle_view(0b110));
        assert_eq!(state.selmon().active_tags(), 0b111);
    }

    #[test]
    fn tagging_never_leaves_a_client_without_tags() {
        let mut state = state();
        assert!(!state.tag_selected(0));
        assert!(!state.tag_selected(1 << 20));
        assert_eq!(state.client(1).unwrap().tags, 1);

        assert!(!state.toggle_tag_selected(1));
        assert!(state.toggle_tag_selected(0b10));
        assert_eq!(state.client(1).unwrap().tags, 0b11);
        assert!(state.tag_selected(0b100));
        assert_eq!(state.client(1).unwrap().tags, 0b100);
    }

    #[test]
    fn tagging_without_selection_is_a_no_op() {
        let mut state = state();
        state.monitors[0].selected = None;
        assert!(!state.tag_selected(2));
        assert!(!state.toggle_tag_selected(2));
    }

    #[test]
    fn mfact_is_relative_below_one_and_absolute_above() {
        let mut state = state();
        assert!(state.set_mfact(0.05));
        assert!((state.selmon().mfact - 0.60).abs() < 1e-6);
        assert!(state.set_mfact(1.30));
        assert!((state.selmon().mfact - 0.30).abs() < 1e-6);
    }

    #[test]
    fn mfact_out_of_range_is_rejected() {
        let mut state = state();
        assert!(!state.set_mfact(0.5));
        assert!(!state.set_mfact(1.99));
        assert!(!state.set_mfact(-0.54));
        assert_eq!(state.selmon().mfact, 0.55);
    }

    #[test]
    fn mfact_ignored_under_floating_layout() {
        let mut state = state();
        let floating = state
            .layouts
            .iter()
            .position(|layout| layout.kind == LayoutType::Floating);
        state.set_layout(floating);
        assert!(!state.set_mfact(0.05));
    }

    #[test]
    fn nmaster_stops_at_zero() {
        let mut state = state();
        state.inc_nmaster(-5);
        assert_eq!(state.selmon().nmaster, 0);
        state.inc_nmaster(2);
        assert_eq!(state.selmon().nmaster, 2);
    }

    #[test]
    fn set_layout_toggles_between_slots() {
        let mut state = state();
        assert_eq!(state.layout_kind(0), LayoutType::Tile);
        state.set_layout(Some(2));
        assert_eq!(state.layout_kind(0), LayoutType::Monocle);
        assert_eq!(state.selmon().layout_symbol, "[M]");
        state.set_layout(None);
        assert_eq!(state.layout_kind(0), LayoutType::Tile);
        state.set_layout(None);
        assert_eq!(state.layout_kind(0), LayoutType::Monocle);
    }

    #[test]
    fn toggle_bar_gives_the_bar_space_back() {
        let mut state = state();
        assert_eq!(state.selmon().window_area, Rect::new(0, 20, 1000, 780));
        state.toggle_bar();
        assert_eq!(state.selmon().window_area, Rect::new(0, 0, 1000, 800));
    }
}
