/// Simulated page scrolling for a terminal that has no document

/// Pixels moved per wheel notch or key press (three 40px lines)
pub const SCROLL_STEP_PX: f32 = 120.0;

/// Pixel height assumed for one terminal row
pub const ROW_HEIGHT_PX: f32 = 16.0;

/// Tracks the offset of a virtual page's top edge relative to the
/// viewport. It starts at zero and grows more negative as the reader
/// scrolls down, bounded by the page length.
#[derive(Debug, Clone)]
pub struct PageScroll {
    top: f32,
    page_height: f32,
    viewport_height: f32,
}

impl PageScroll {
    pub fn new(page_height: f32, rows: u16) -> Self {
        Self {
            top: 0.0,
            page_height: page_height.max(0.0),
            viewport_height: rows as f32 * ROW_HEIGHT_PX,
        }
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    fn max_scroll(&self) -> f32 {
        (self.page_height - self.viewport_height).max(0.0)
    }

    /// Scroll by `notches` (positive is down). Returns the new top offset
    /// when it changed.
    pub fn scroll_by(&mut self, notches: i32) -> Option<f32> {
        let next = (self.top - notches as f32 * SCROLL_STEP_PX).clamp(-self.max_scroll(), 0.0);
        if next == self.top {
            return None;
        }
        self.top = next;
        Some(next)
    }

    /// Re-clamp after the viewport changed. Returns the new offset if the
    /// page had to move.
    pub fn set_rows(&mut self, rows: u16) -> Option<f32> {
        self.viewport_height = rows as f32 * ROW_HEIGHT_PX;
        let clamped = self.top.max(-self.max_scroll());
        if clamped == self.top {
            return None;
        }
        self.top = clamped;
        Some(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrolling_down_goes_negative() {
        let mut page = PageScroll::new(4000.0, 40);
        assert_eq!(page.scroll_by(1), Some(-SCROLL_STEP_PX));
        assert_eq!(page.scroll_by(2), Some(-3.0 * SCROLL_STEP_PX));
        assert_eq!(page.scroll_by(-1), Some(-2.0 * SCROLL_STEP_PX));
    }

    #[test]
    fn test_cannot_scroll_above_top() {
        let mut page = PageScroll::new(4000.0, 40);
        assert_eq!(page.scroll_by(-1), None);
        assert_eq!(page.top(), 0.0);
    }

    #[test]
    fn test_bottom_is_clamped() {
        // 4000px page, 640px viewport: at most 3360px of travel
        let mut page = PageScroll::new(4000.0, 40);
        page.scroll_by(1000);
        assert_eq!(page.top(), -3360.0);
        assert_eq!(page.scroll_by(1), None);
    }

    #[test]
    fn test_taller_viewport_reclamps() {
        let mut page = PageScroll::new(4000.0, 40);
        page.scroll_by(1000);
        assert_eq!(page.set_rows(200), Some(-800.0));
        assert_eq!(page.set_rows(200), None);
    }

    #[test]
    fn test_short_page_never_scrolls() {
        let mut page = PageScroll::new(100.0, 40);
        assert_eq!(page.scroll_by(5), None);
    }
}
