//! Output rendering for the chat loop.
//!
//! This module provides the renderer trait and a plain-text implementation
//! with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::persona::{BANNER, BOT_LABEL, EXIT_HINT, FAREWELL};

/// ANSI escape code for bold text (used for the bot label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for green text (used for the bot label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Captured output in tests
pub trait Renderer: Send {
    /// Print the greeting shown before the first prompt.
    fn print_banner(&mut self);

    /// Print one reply from the model, behind the bot label.
    fn print_reply(&mut self, text: &str);

    /// Print the goodbye message.
    fn print_farewell(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when a request is abandoned by the user.
    fn print_interrupted(&mut self) {
        self.print_info("[interrupted]");
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Conversation output goes to the wrapped writer (stdout by default);
/// errors go to stderr.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::to_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes conversation output to `out`.
    pub fn to_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Returns whether ANSI styling is on.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn label(&self) -> String {
        if self.use_color {
            format!("{ANSI_BOLD}{ANSI_GREEN}{BOT_LABEL}{ANSI_RESET}")
        } else {
            BOT_LABEL.to_string()
        }
    }

    /// Writes and flushes.  A closed terminal is not worth failing the chat over.
    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_banner(&mut self) {
        self.write(&format!("{BANNER}\n{EXIT_HINT}\n\n"));
    }

    fn print_reply(&mut self, text: &str) {
        let label = self.label();
        self.write(&format!("{label} {text}\n\n"));
    }

    fn print_farewell(&mut self) {
        let label = self.label();
        self.write(&format!("{label} {FAREWELL}\n"));
    }

    fn print_error(&mut self, error: &str) {
        let _ = self.out.flush();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            self.write(&format!("{ANSI_DIM}{info}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("{info}\n"));
        }
    }
}
