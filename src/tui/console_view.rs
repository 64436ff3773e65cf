use crate::buffer::{OutputBuffer, OutputLine};

/// Scrollable console log
pub struct ConsoleView {
    buffer: OutputBuffer,
    scroll_offset: usize,
    auto_scroll: bool,
    visible_lines: usize,
}

impl ConsoleView {
    pub fn new(max_buffer_lines: usize) -> Self {
        Self {
            buffer: OutputBuffer::new(max_buffer_lines),
            scroll_offset: 0,
            auto_scroll: true,
            visible_lines: 0,
        }
    }

    /// Add a line, following it when auto scroll is on
    pub fn push_line(&mut self, line: OutputLine) {
        self.buffer.push(line);
        if self.auto_scroll {
            self.scroll_to_bottom();
        } else {
            // Keep the offset in range when the buffer dropped old lines
            self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
        }
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// Set the number of lines the log area can show
    pub fn set_visible_lines(&mut self, lines: usize) {
        self.visible_lines = lines;
        if self.auto_scroll {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Lines currently in view
    pub fn visible(&self) -> Vec<&OutputLine> {
        self.buffer.get_range(self.scroll_offset, self.visible_lines)
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = (self.visible_lines / 2).max(1);
        self.scroll_offset = (self.scroll_offset + half_page).min(self.max_scroll_offset());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = (self.visible_lines / 2).max(1);
        self.scroll_offset = self.scroll_offset.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll_offset();
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn toggle_auto_scroll(&mut self) {
        self.set_auto_scroll(!self.auto_scroll);
    }

    /// Turning auto scroll on jumps to the newest line
    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
        if enabled {
            self.scroll_to_bottom();
        }
    }

    fn max_scroll_offset(&self) -> usize {
        self.buffer.len().saturating_sub(self.visible_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::OutputKind;
    use rstest::rstest;

    fn view_with_lines(count: usize, visible: usize) -> ConsoleView {
        let mut view = ConsoleView::new(100);
        view.set_visible_lines(visible);
        for i in 0..count {
            view.push_line(OutputLine::new(OutputKind::Quest, format!("line{i}")));
        }
        view
    }

    #[test]
    fn console_view_new_follows_output() {
        let view = view_with_lines(20, 5);

        assert!(view.auto_scroll());
        assert_eq!(view.scroll_offset(), 15);
        let visible: Vec<_> = view.visible().iter().map(|l| l.plain()).collect();
        assert_eq!(visible, vec!["line15", "line16", "line17", "line18", "line19"]);
    }

    #[rstest]
    #[case(true, 15)]
    #[case(false, 0)]
    fn console_view_push_line_respects_auto_scroll(
        #[case] auto_scroll: bool,
        #[case] expected_offset: usize,
    ) {
        let mut view = ConsoleView::new(100);
        view.set_visible_lines(5);
        view.set_auto_scroll(auto_scroll);

        for i in 0..20 {
            view.push_line(OutputLine::new(OutputKind::Quest, format!("line{i}")));
        }

        assert_eq!(view.scroll_offset(), expected_offset);
    }

    #[test]
    fn console_view_half_page_scroll_stays_in_range() {
        let mut view = view_with_lines(50, 10);
        view.scroll_to_top();

        view.scroll_half_page_down();
        assert_eq!(view.scroll_offset(), 5);

        for _ in 0..20 {
            view.scroll_half_page_down();
        }
        assert_eq!(view.scroll_offset(), 40);

        view.scroll_half_page_up();
        assert_eq!(view.scroll_offset(), 35);

        for _ in 0..20 {
            view.scroll_half_page_up();
        }
        assert_eq!(view.scroll_offset(), 0);
    }

    #[test]
    fn console_view_enabling_auto_scroll_jumps_to_bottom() {
        let mut view = view_with_lines(20, 5);
        view.set_auto_scroll(false);
        view.scroll_to_top();

        view.toggle_auto_scroll();

        assert!(view.auto_scroll());
        assert_eq!(view.scroll_offset(), 15);
    }

    #[test]
    fn console_view_offset_follows_ring_buffer_eviction() {
        let mut view = ConsoleView::new(10);
        view.set_visible_lines(5);
        view.set_auto_scroll(false);
        for i in 0..10 {
            view.push_line(OutputLine::new(OutputKind::Quest, format!("line{i}")));
        }
        view.scroll_to_bottom();

        view.push_line(OutputLine::new(OutputKind::Quest, "line10".into()));

        assert_eq!(view.scroll_offset(), 5);
    }
}
