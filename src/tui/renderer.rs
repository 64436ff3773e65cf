use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::app::{App, QuestStatus};
use crate::config::SettingsProvider;

/// Rows used by everything but the log lines: log borders, input box, status bar
pub const CHROME_HEIGHT: u16 = 6;

/// TUI rendering handler
pub struct Renderer;

impl Renderer {
    /// Render application state
    pub fn render<P: SettingsProvider>(frame: &mut Frame, app: &App<P>) {
        let [log_area, input_area, status_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let lines: Vec<Line> = app
            .console()
            .visible()
            .into_iter()
            .map(|line| Line::from(line.spans().to_vec()))
            .collect();
        let title = match app.quest_path() {
            Some(path) => format!(" {path} "),
            None => " questrun ".to_string(),
        };
        frame.render_widget(
            Paragraph::new(lines).block(Block::bordered().title(title)),
            log_area,
        );

        // Keep the cursor visible on long commands
        let inner_width = input_area.width.saturating_sub(3) as usize;
        let scroll = app.input().visual_scroll(inner_width);
        frame.render_widget(
            Paragraph::new(app.input().value())
                .scroll((0, scroll as u16))
                .block(Block::bordered().title(" Lua ")),
            input_area,
        );
        let cursor = app.input().visual_cursor().saturating_sub(scroll) as u16;
        frame.set_cursor_position((input_area.x + 1 + cursor, input_area.y + 1));

        frame.render_widget(Self::status_line(app), status_area);
    }

    fn status_line<P: SettingsProvider>(app: &App<P>) -> Line<'static> {
        let (label, color) = match app.status() {
            QuestStatus::Idle => ("idle", Color::Gray),
            QuestStatus::Running => ("running", Color::Green),
            QuestStatus::Finished => ("finished", Color::Yellow),
        };
        let auto_scroll = if app.console().auto_scroll() { "on" } else { "off" };

        Line::from(vec![
            Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::Black).bg(color),
            ),
            Span::raw(format!(" follow: {auto_scroll} ")),
            Span::styled(
                " F5 start  F6 stop  Enter run  Ctrl-C quit",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{OutputKind, OutputLine};
    use crate::config::Settings;
    use crate::quest::QuestRunner;
    use ratatui::{Terminal, backend::TestBackend};

    fn render_to_string(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal.draw(|frame| Renderer::render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn renderer_shows_quest_path_log_and_status() {
        let runner = QuestRunner::new(None, Settings::default());
        let mut app = App::new(runner, Some("my_quest".into()), 100);
        app.console_mut().set_visible_lines(12 - CHROME_HEIGHT as usize);
        app.console_mut().push_line(OutputLine::new(
            OutputKind::Quest,
            "hello from the quest".into(),
        ));

        let screen = render_to_string(&app);

        assert!(screen.contains("my_quest"));
        assert!(screen.contains("hello from the quest"));
        assert!(screen.contains("idle"));
        assert!(screen.contains("Lua"));
    }
}
