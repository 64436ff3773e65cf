use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Structured engine log line: `[Solarus] [<pid>] <Level>: <message>`
static ENGINE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[Solarus\] \[(\d+)\] (\w+): (.+)$").expect("valid engine line pattern")
});

/// Chunk attribution prepended by the engine to errors raised by console commands
static LUA_COMMAND_ERROR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"In Lua command: \[string ".*"\]:\d+: "#).expect("valid error prefix pattern")
});

const COMMAND_BEGIN_MARKER: &str = "====== Begin Lua command #";
const COMMAND_END_MARKER: &str = "====== End Lua command #";

/// Severity of an engine log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
    Unknown,
}

impl Severity {
    pub fn from_level(level: &str) -> Self {
        match level {
            "Debug" => Severity::Debug,
            "Info" => Severity::Info,
            "Warning" => Severity::Warning,
            "Error" => Severity::Error,
            "Fatal" => Severity::Fatal,
            _ => Severity::Unknown,
        }
    }

    /// Display color, `None` for unknown levels
    pub fn color(self) -> Option<LogColor> {
        match self {
            Severity::Debug => Some(LogColor::new(0x80, 0x80, 0x80)),
            Severity::Info => Some(LogColor::new(0x00, 0x00, 0xff)),
            Severity::Warning => Some(LogColor::new(0xb0, 0x50, 0x00)),
            Severity::Error | Severity::Fatal => Some(LogColor::new(0xff, 0x00, 0x00)),
            Severity::Unknown => None,
        }
    }
}

/// RGB color, displayed as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LogColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for LogColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A quest output line after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// `Unknown` for lines that are not engine log lines
    pub severity: Severity,
    /// Message part, cleaned up for errors
    pub message: String,
    /// Text to display
    pub text: String,
    /// Color of the text, `None` for plain lines
    pub color: Option<LogColor>,
    /// Internal lines that must not be displayed
    pub suppressed: bool,
}

impl ClassifiedLine {
    fn plain(line: &str) -> Self {
        Self {
            severity: Severity::Unknown,
            message: line.to_string(),
            text: line.to_string(),
            color: None,
            suppressed: false,
        }
    }

    /// HTML rendering: colored lines are escaped and wrapped in a span
    pub fn to_markup(&self) -> String {
        match self.color {
            Some(color) => format!(
                "<span style=\"color: {color}\">{}</span>",
                escape_html(&self.text)
            ),
            None => self.text.clone(),
        }
    }
}

/// Parse a raw line of quest output
///
/// Lines that do not look like engine log lines come from the quest
/// scripts and are kept verbatim.
pub fn classify(line: &str) -> ClassifiedLine {
    let Some(captures) = ENGINE_LINE.captures(line) else {
        return ClassifiedLine::plain(line);
    };
    let (Some(level), Some(message)) = (captures.get(2), captures.get(3)) else {
        return ClassifiedLine::plain(line);
    };
    let level = level.as_str();
    let mut message = message.as_str().to_string();

    if message.starts_with(COMMAND_BEGIN_MARKER) || message.starts_with(COMMAND_END_MARKER) {
        return ClassifiedLine {
            severity: Severity::from_level(level),
            text: String::new(),
            message,
            color: None,
            suppressed: true,
        };
    }

    let severity = Severity::from_level(level);
    if severity == Severity::Error {
        message = LUA_COMMAND_ERROR_PREFIX
            .replace_all(&message, "")
            .into_owned();
    }

    let (text, color) = match severity.color() {
        Some(color) => (format!("{level}: {message}"), Some(color)),
        None => (message.clone(), None),
    };

    ClassifiedLine {
        severity,
        message,
        text,
        color,
        suppressed: false,
    }
}

/// Markup for a raw line, or `None` when the line must not be displayed
pub fn decorate(line: &str) -> Option<String> {
    if line.is_empty() {
        return Some(String::new());
    }
    let classified = classify(line);
    if classified.suppressed {
        None
    } else {
        Some(classified.to_markup())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
