use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tui_input::backend::crossterm::to_input_request;

use crate::app::App;
use crate::config::SettingsProvider;

/// Handle key event and update app state
pub fn handle_key<P: SettingsProvider>(app: &mut App<P>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.quit(),

        // Quest lifecycle
        KeyCode::F(5) => app.start_quest(),
        KeyCode::F(6) => app.stop_quest(),

        // Command line
        KeyCode::Enter => app.submit_command(),
        KeyCode::Up => app.history_previous(),
        KeyCode::Down => app.history_next(),

        // Log scrolling
        KeyCode::PageUp => {
            app.console_mut().set_auto_scroll(false);
            app.console_mut().scroll_half_page_up();
        }
        KeyCode::PageDown => app.console_mut().scroll_half_page_down(),
        KeyCode::Home if ctrl => {
            app.console_mut().set_auto_scroll(false);
            app.console_mut().scroll_to_top();
        }
        KeyCode::End if ctrl => app.console_mut().scroll_to_bottom(),
        KeyCode::Char('f') if ctrl => app.console_mut().toggle_auto_scroll(),

        // Delegate to tui-input for text editing (Emacs-like keybindings)
        _ => {
            if let Some(req) = to_input_request(&Event::Key(key)) {
                app.handle_input(req);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{OutputKind, OutputLine};
    use crate::config::Settings;
    use crate::quest::QuestRunner;

    fn create_app() -> App {
        let runner = QuestRunner::new(None, Settings::default());
        App::new(runner, None, 100)
    }

    fn create_app_with_output() -> App {
        let mut app = create_app();
        app.console_mut().set_visible_lines(10);
        for i in 0..20 {
            app.console_mut()
                .push_line(OutputLine::new(OutputKind::Quest, format!("line{i}")));
        }
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_with_ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn input_ctrl_c_quits() {
        let mut app = create_app();

        handle_key(&mut app, key_with_ctrl(KeyCode::Char('c')));

        assert!(app.should_quit());
    }

    #[test]
    fn input_chars_edit_command_line() {
        let mut app = create_app();

        type_text(&mut app, "sol.main");
        handle_key(&mut app, key(KeyCode::Backspace));

        assert_eq!(app.input().value(), "sol.mai");
    }

    #[test]
    fn input_plain_c_and_f_are_typed() {
        let mut app = create_app();

        type_text(&mut app, "cf");

        assert_eq!(app.input().value(), "cf");
        assert!(!app.should_quit());
    }

    #[test]
    fn input_ctrl_u_clears_command_line() {
        let mut app = create_app();
        type_text(&mut app, "print(1)");

        handle_key(&mut app, key_with_ctrl(KeyCode::Char('u')));

        assert_eq!(app.input().value(), "");
    }

    #[test]
    fn input_enter_without_running_quest_keeps_command() {
        let mut app = create_app();
        type_text(&mut app, "print(1)");

        handle_key(&mut app, key(KeyCode::Enter));

        assert!(app.history().is_empty());
        assert_eq!(app.input().value(), "print(1)");
    }

    #[test]
    fn input_f5_without_quest_path_warns() {
        let mut app = create_app();

        handle_key(&mut app, key(KeyCode::F(5)));

        assert_eq!(app.console().buffer().len(), 1);
    }

    #[test]
    fn input_page_up_disables_auto_scroll_and_scrolls() {
        let mut app = create_app_with_output();
        assert_eq!(app.console().scroll_offset(), 10);

        handle_key(&mut app, key(KeyCode::PageUp));

        assert!(!app.console().auto_scroll());
        assert_eq!(app.console().scroll_offset(), 5);
    }

    #[test]
    fn input_page_down_scrolls_down() {
        let mut app = create_app_with_output();
        handle_key(&mut app, key_with_ctrl(KeyCode::Home));
        assert_eq!(app.console().scroll_offset(), 0);

        handle_key(&mut app, key(KeyCode::PageDown));

        assert_eq!(app.console().scroll_offset(), 5);
    }

    #[test]
    fn input_ctrl_end_scrolls_to_bottom() {
        let mut app = create_app_with_output();
        handle_key(&mut app, key_with_ctrl(KeyCode::Home));

        handle_key(&mut app, key_with_ctrl(KeyCode::End));

        assert_eq!(app.console().scroll_offset(), 10);
    }

    #[test]
    fn input_ctrl_f_toggles_auto_scroll() {
        let mut app = create_app_with_output();
        assert!(app.console().auto_scroll());

        handle_key(&mut app, key_with_ctrl(KeyCode::Char('f')));
        assert!(!app.console().auto_scroll());

        handle_key(&mut app, key_with_ctrl(KeyCode::Char('f')));
        assert!(app.console().auto_scroll());
    }

    #[test]
    fn input_up_with_empty_history_keeps_command_line() {
        let mut app = create_app();
        type_text(&mut app, "x");

        handle_key(&mut app, key(KeyCode::Up));

        assert_eq!(app.input().value(), "x");
    }
}
