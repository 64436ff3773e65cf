mod console_view;
mod input;
mod renderer;

pub use console_view::ConsoleView;
pub use input::handle_key;
pub use renderer::{CHROME_HEIGHT, Renderer};
