//! The read-send-print loop.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use crate::chat::control::{Event, Input, SessionState};
use crate::chat::render::Renderer;
use crate::chat::session::ChatSession;
use crate::error::{Error, Result};
use crate::generator::TextGenerator;
use crate::persona::USER_PROMPT;

/// What a read from the terminal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line, without its line terminator.
    Line(String),

    /// Ctrl-C while editing the line.
    Interrupted,

    /// Input was closed.
    Eof,
}

/// A source of user input lines.
pub trait LineSource {
    /// Show `prompt` and block until a line is available.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
}

/// Line editor on the controlling terminal, with in-memory history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    /// Creates a line editor.
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(readline_error(err)),
        }
    }
}

/// Reads lines from any buffered reader.  The prompt is not shown.
pub struct ReaderSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|err| Error::io("failed to read input", err))?;
        if read == 0 {
            return Ok(ReadOutcome::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(ReadOutcome::Line(line))
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(err) => Error::io("failed to read input", err),
        other => Error::unknown(format!("input error: {other}")),
    }
}

/// Runs the chat until an exit keyword or end of input.
///
/// Each non-exit line becomes one exchange with the session.  `interrupted`
/// is cleared before every prompt; setting it abandons the request in
/// flight and returns to the prompt.
///
/// # Errors
///
/// Any failure other than a user interrupt ends the loop.  The transcript
/// still alternates, but the conversation is over.
pub async fn run<G, S, R>(
    session: &mut ChatSession<G>,
    source: &mut S,
    renderer: &mut R,
    interrupted: &AtomicBool,
) -> Result<SessionState>
where
    G: TextGenerator,
    S: LineSource + ?Sized,
    R: Renderer + ?Sized,
{
    renderer.print_banner();

    let mut state = SessionState::default();
    while !state.is_terminated() {
        interrupted.store(false, Ordering::Relaxed);

        let event = match source.read_line(USER_PROMPT)? {
            ReadOutcome::Eof => {
                renderer.print_farewell();
                Event::EndOfInput
            }
            ReadOutcome::Interrupted => Event::PromptInterrupted,
            ReadOutcome::Line(line) => match Input::parse(&line) {
                Input::Exit => {
                    renderer.print_farewell();
                    Event::ExitRequested
                }
                Input::Message(text) => {
                    match session.send_interruptible(&text, interrupted).await {
                        Ok(reply) => renderer.print_reply(&reply),
                        Err(err) if err.is_abort() => renderer.print_interrupted(),
                        Err(err) => return Err(err),
                    }
                    Event::TurnFinished
                }
            },
        };
        state = state.next(event);
    }

    info!(turns = session.transcript().len(), "chat finished");
    Ok(state)
}
