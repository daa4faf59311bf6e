//! User-facing progress output

use std::cell::RefCell;

use colored::Colorize;

/// Kind of console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// A change that was made
    Tick,
    /// Something the user still has to do
    Todo,
    Warn,
    Error,
}

impl Style {
    fn marker(&self) -> &'static str {
        match self {
            Self::Tick => "✔",
            Self::Todo => "☐",
            Self::Warn => "⚠",
            Self::Error => "✗",
        }
    }
}

/// Console sink. Prints to the terminal, or records lines for inspection.
#[derive(Debug, Default)]
pub struct Console {
    captured: Option<RefCell<Vec<String>>>,
}

impl Console {
    /// Print to stdout (errors to stderr)
    pub fn terminal() -> Self {
        Self { captured: None }
    }

    /// Record lines instead of printing them
    pub fn captured() -> Self {
        Self {
            captured: Some(RefCell::new(Vec::new())),
        }
    }

    /// Emit one line. Only errors are shown when `quiet` is set.
    pub fn emit(&self, style: Style, message: &str, quiet: bool) {
        if quiet && style != Style::Error {
            return;
        }
        let marker = style.marker();
        match &self.captured {
            Some(lines) => lines.borrow_mut().push(format!("{marker} {message}")),
            None => match style {
                Style::Tick => println!("{} {}", marker.green(), message),
                Style::Todo => println!("{} {}", marker.red(), message),
                Style::Warn => println!("{} {}", marker.yellow(), message.yellow()),
                Style::Error => eprintln!("{} {}", marker.red().bold(), message.red()),
            },
        }
    }

    /// Lines recorded so far; empty for a terminal console
    pub fn lines(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .map(|lines| lines.borrow().clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_keeps_errors_only() {
        let console = Console::captured();
        console.emit(Style::Tick, "done", true);
        console.emit(Style::Warn, "careful", true);
        console.emit(Style::Error, "broken", true);
        assert_eq!(console.lines(), vec!["✗ broken"]);
    }

    #[test]
    fn test_markers() {
        let console = Console::captured();
        console.emit(Style::Tick, "a", false);
        console.emit(Style::Todo, "b", false);
        assert_eq!(console.lines(), vec!["✔ a", "☐ b"]);
    }
}
