use std::collections::VecDeque;

use ansi_to_tui::IntoText;
use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::console::{ClassifiedLine, LogColor, Severity};

/// Origin of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Unstructured output printed by the quest scripts
    Quest,
    /// Engine log line
    Engine(Severity),
    /// Echo of a command typed in the console
    Command,
    /// Quest lifecycle notice
    Status,
    /// Warning raised by the console itself
    Warning,
}

/// Line shown in the console log
#[derive(Debug, Clone)]
pub struct OutputLine {
    pub kind: OutputKind,
    /// Pre-parsed spans with styles (for rendering)
    spans: Vec<Span<'static>>,
}

impl OutputLine {
    /// Create a line from raw text
    ///
    /// Parses ANSI escape sequences into styled spans.
    pub fn new(kind: OutputKind, content: String) -> Self {
        let spans = match content.as_str().into_text() {
            Ok(text) => text
                .lines
                .into_iter()
                .next()
                .map(|line| line.spans)
                .unwrap_or_else(Vec::new),
            Err(_) => vec![Span::raw(content)],
        };

        Self { kind, spans }
    }

    /// Create a single-span line in one color
    pub fn colored(kind: OutputKind, content: String, color: Color) -> Self {
        Self {
            kind,
            spans: vec![Span::styled(content, Style::default().fg(color))],
        }
    }

    /// Console line for a classified quest output line, `None` if suppressed
    pub fn from_classified(line: ClassifiedLine) -> Option<Self> {
        if line.suppressed {
            return None;
        }
        let line = match line.color {
            Some(color) => Self::colored(
                OutputKind::Engine(line.severity),
                line.text,
                rgb(color),
            ),
            None => Self::new(OutputKind::Quest, line.text),
        };
        Some(line)
    }

    /// Echo of a submitted command
    pub fn command_echo(command: &str) -> Self {
        Self::colored(
            OutputKind::Command,
            format!("> {command}"),
            Color::Reset,
        )
    }

    /// Return pre-parsed spans for rendering
    pub fn spans(&self) -> &[Span<'static>] {
        &self.spans
    }

    /// Return plain text without styling (derived from spans)
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.content.as_ref()).collect()
    }
}

fn rgb(color: LogColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Ring buffer for console lines
///
/// When max lines is exceeded, old lines are automatically discarded.
pub struct OutputBuffer {
    lines: VecDeque<OutputLine>,
    max_lines: usize,
}

impl OutputBuffer {
    /// Create a buffer with specified max lines
    ///
    /// # Arguments
    /// * `max_lines` - Maximum number of lines to keep (0 for unlimited)
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines,
        }
    }

    /// Add a line, discarding the oldest one when full
    pub fn push(&mut self, line: OutputLine) {
        if self.max_lines > 0 && self.lines.len() >= self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Get lines in specified range
    ///
    /// Empty or partial result if out of bounds.
    pub fn get_range(&self, start: usize, count: usize) -> Vec<&OutputLine> {
        self.lines.iter().skip(start).take(count).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputLine> {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::classify;

    fn quest_line(content: &str) -> OutputLine {
        OutputLine::new(OutputKind::Quest, content.into())
    }

    #[test]
    fn output_buffer_push_discards_oldest_line_when_max_exceeded() {
        let mut buffer = OutputBuffer::new(3);
        for i in 1..=4 {
            buffer.push(quest_line(&format!("line{i}")));
        }

        assert_eq!(buffer.len(), 3);
        let lines: Vec<_> = buffer.iter().map(|l| l.plain()).collect();
        assert_eq!(lines, vec!["line2", "line3", "line4"]);
    }

    #[test]
    fn output_buffer_push_unlimited_when_max_lines_is_zero() {
        let mut buffer = OutputBuffer::new(0);
        for i in 0..1000 {
            buffer.push(quest_line(&format!("line{i}")));
        }

        assert_eq!(buffer.len(), 1000);
    }

    #[test]
    fn output_buffer_get_range_returns_partial_when_exceeds_buffer() {
        let mut buffer = OutputBuffer::new(100);
        for i in 0..5 {
            buffer.push(quest_line(&format!("line{i}")));
        }

        let lines = buffer.get_range(3, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].plain(), "line3");
        assert_eq!(lines[1].plain(), "line4");
        assert!(buffer.get_range(10, 5).is_empty());
    }

    #[test]
    fn output_line_from_classified_engine_line_uses_severity_color() {
        let line = OutputLine::from_classified(classify("[Solarus] [1] Warning: low memory"))
            .unwrap();

        assert_eq!(line.kind, OutputKind::Engine(Severity::Warning));
        assert_eq!(line.plain(), "Warning: low memory");
        assert_eq!(line.spans()[0].style.fg, Some(Color::Rgb(0xb0, 0x50, 0x00)));
    }

    #[test]
    fn output_line_from_classified_skips_suppressed_lines() {
        let classified = classify("[Solarus] [1] Info: ====== End Lua command #2 ======");

        assert!(OutputLine::from_classified(classified).is_none());
    }

    #[test]
    fn output_line_from_classified_parses_ansi_in_quest_output() {
        let line = OutputLine::from_classified(classify("\x1b[31mERROR\x1b[0m: timeout")).unwrap();

        assert_eq!(line.kind, OutputKind::Quest);
        assert_eq!(line.spans()[0].content, "ERROR");
        assert_eq!(line.spans()[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn output_line_command_echo_prefixes_command() {
        let line = OutputLine::command_echo("sol.main.exit()");

        assert_eq!(line.kind, OutputKind::Command);
        assert_eq!(line.plain(), "> sol.main.exit()");
    }
}
