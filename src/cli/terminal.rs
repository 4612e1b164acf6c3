//! Terminal capability detection and colouring

use owo_colors::{colors::css, OwoColorize};

/// Detects whether coloured output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Shortens text to fit a column, marking the cut with an ellipsis.
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Extension trait for colouring output
pub trait Colorize {
    /// The text to colour.
    fn text(&self) -> &str;

    /// Colour as success (green)
    fn success(&self) -> String {
        paint(self.text(), |t| t.fg::<css::Green>().to_string())
    }

    /// Colour as warning (amber)
    fn warning(&self) -> String {
        paint(self.text(), |t| t.fg::<css::Orange>().to_string())
    }

    /// Colour as an identifier (blue)
    fn info(&self) -> String {
        paint(self.text(), |t| t.fg::<css::LightBlue>().to_string())
    }

    /// Dim the text
    fn dim(&self) -> String {
        paint(self.text(), |t| t.dimmed().to_string())
    }
}

impl Colorize for str {
    fn text(&self) -> &str {
        self
    }
}

impl Colorize for String {
    fn text(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::fit;

    #[test_case("Fred Smith", 20, "Fred Smith"; "fits")]
    #[test_case("Frederick Smith", 8, "Frederi…"; "cut")]
    #[test_case("Zoë", 3, "Zoë"; "multibyte")]
    fn fitting(text: &str, width: usize, expected: &str) {
        assert_eq!(fit(text, width), expected);
    }
}
