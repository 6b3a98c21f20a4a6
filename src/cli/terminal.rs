//! Terminal colour helpers
//!
//! Only the headers and summaries written to stderr are coloured. Results on
//! stdout stay plain so they can be piped.

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

/// The stream coloured text is written to.
const STREAM: Stream = Stream::Stderr;

/// Detects whether coloured output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(STREAM).is_some()
}

fn styled(text: &str, style: Style, enabled: bool) -> String {
    if enabled {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Extension trait for colourising stderr output
pub trait Colorize: AsRef<str> {
    /// Apply `style` when stderr supports colour
    fn paint(&self, style: Style) -> String {
        styled(self.as_ref(), style, supports_color())
    }

    /// Colour as success (green)
    fn success(&self) -> String {
        self.paint(Style::new().green())
    }

    /// Dim the text
    fn dim(&self) -> String {
        self.paint(Style::new().dimmed())
    }
}

impl<T: AsRef<str> + ?Sized> Colorize for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_follows_stderr() {
        assert!(matches!(STREAM, Stream::Stderr));
    }

    #[test]
    fn plain_when_disabled() {
        assert_eq!(styled("header", Style::new().dimmed(), false), "header");
    }

    #[test]
    fn escaped_when_enabled() {
        let text = styled("header", Style::new().green(), true);

        assert!(text.starts_with('\u{1b}'));
        assert!(text.contains("header"));
    }
}
