//! Windowing engine for long attendee lists.
//!
//! Only the rows around the scroll position are rendered once the list grows
//! past [`WINDOWING_THRESHOLD`]. The total scrollable height always covers the
//! whole list so scrollbar proportions stay correct.

use serde::Serialize;

/// Lists at or below this many rows are rendered whole.
pub const WINDOWING_THRESHOLD: usize = 100;

/// Rows rendered before the viewport has been measured.
pub const UNMEASURED_ROWS: usize = 20;

pub const DEFAULT_OVERSCAN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    /// Fixed row height in pixels
    pub item_height: f64,
    /// Extra rows rendered on each side of the viewport
    pub overscan: usize,
}

impl WindowConfig {
    pub fn new(item_height: f64) -> Self {
        Self {
            item_height,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

/// Visible slice of the list, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub start: usize,
    pub end: usize,
    /// Translation applied to the rendered slice
    pub offset: f64,
    pub total_height: f64,
}

impl Window {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Compute the visible window for the given list and viewport state.
pub fn compute_window(
    config: &WindowConfig,
    item_count: usize,
    scroll_offset: f64,
    viewport_height: Option<f64>,
) -> Window {
    let total_height = item_count as f64 * config.item_height;

    if item_count <= WINDOWING_THRESHOLD {
        return Window {
            start: 0,
            end: item_count,
            offset: 0.0,
            total_height,
        };
    }

    let Some(viewport_height) = viewport_height.filter(|h| *h > 0.0) else {
        return Window {
            start: 0,
            end: item_count.min(UNMEASURED_ROWS),
            offset: 0.0,
            total_height,
        };
    };

    let item_height = config.item_height.max(f64::MIN_POSITIVE);
    let first_visible = (scroll_offset.max(0.0) / item_height).floor() as usize;
    let start = first_visible
        .saturating_sub(config.overscan)
        .min(item_count);
    let visible_count = (viewport_height / item_height).ceil() as usize;
    let end = item_count.min(start + visible_count + 2 * config.overscan);

    Window {
        start,
        end,
        offset: start as f64 * config.item_height,
        total_height,
    }
}

/// Cached window over a list, recomputed only when an input changes.
#[derive(Debug, Clone)]
pub struct VirtualList {
    config: WindowConfig,
    item_count: usize,
    scroll_offset: f64,
    viewport_height: Option<f64>,
    window: Window,
    recomputations: u64,
}

impl VirtualList {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            item_count: 0,
            scroll_offset: 0.0,
            viewport_height: None,
            window: compute_window(&config, 0, 0.0, None),
            recomputations: 0,
        }
    }

    /// Current visible window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Number of times the window has been recomputed.
    #[cfg(test)]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        if self.item_count != item_count {
            self.item_count = item_count;
            self.recompute();
        }
    }

    pub fn on_scroll(&mut self, scroll_offset: f64) {
        if self.scroll_offset != scroll_offset {
            self.scroll_offset = scroll_offset;
            self.recompute();
        }
    }

    /// Container measurement handle; called on first layout and every resize.
    pub fn measure(&mut self, viewport_height: f64) {
        let height = Some(viewport_height);
        if self.viewport_height != height {
            self.viewport_height = height;
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        self.window = compute_window(
            &self.config,
            self.item_count,
            self.scroll_offset,
            self.viewport_height,
        );
        self.recomputations += 1;
        tracing::trace!(
            start = self.window.start,
            end = self.window.end,
            count = self.recomputations,
            "Window recomputed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WindowConfig {
        WindowConfig::new(40.0)
    }

    #[test]
    fn test_small_lists_render_whole() {
        for count in [0, 1, 57, 100] {
            for scroll in [0.0, 400.0, 10_000.0] {
                let window = compute_window(&config(), count, scroll, Some(300.0));
                assert_eq!(window.range(), 0..count);
                assert_eq!(window.offset, 0.0);
            }
        }
    }

    #[test]
    fn test_unmeasured_viewport_renders_default_rows() {
        let window = compute_window(&config(), 500, 0.0, None);
        assert_eq!(window.range(), 0..UNMEASURED_ROWS);
        assert_eq!(window.total_height, 500.0 * 40.0);
    }

    #[test]
    fn test_just_over_threshold() {
        let window = compute_window(&config(), 101, 0.0, Some(400.0));
        assert_eq!(window.start, 0);
        assert!(window.end <= 101);
        assert_eq!(window.end, 20);
    }

    #[test]
    fn test_scrolled_window() {
        // Row 50 at the top, 10 rows visible, 5 overscan each side
        let window = compute_window(&config(), 1000, 2000.0, Some(400.0));
        assert_eq!(window.start, 45);
        assert_eq!(window.end, 65);
        assert_eq!(window.offset, 45.0 * 40.0);
        assert_eq!(window.total_height, 40_000.0);
    }

    #[test]
    fn test_window_clamped_at_end() {
        let window = compute_window(&config(), 200, 7900.0, Some(400.0));
        assert_eq!(window.start, 192);
        assert_eq!(window.end, 200);
    }

    #[test]
    fn test_partial_rows_round_up() {
        let window = compute_window(&config(), 1000, 0.0, Some(410.0));
        assert_eq!(window.end, 11 + 10);
    }

    #[test]
    fn test_virtual_list_recomputes_only_on_change() {
        let mut list = VirtualList::new(config());
        list.set_item_count(1000);
        assert_eq!(list.window().range(), 0..UNMEASURED_ROWS);

        list.measure(400.0);
        list.on_scroll(2000.0);
        let after_scroll = list.recomputations();
        assert_eq!(list.window().start, 45);

        list.set_item_count(1000);
        list.measure(400.0);
        list.on_scroll(2000.0);
        let _ = list.window();
        assert_eq!(list.recomputations(), after_scroll);

        list.measure(800.0);
        assert_eq!(list.recomputations(), after_scroll + 1);
        assert_eq!(list.window().end, 45 + 20 + 10);
    }
}
