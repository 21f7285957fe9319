//! Chat application module for talking with the startup advisor.
//!
//! This module provides the terminal chat built on top of the Gemini
//! client.  It supports:
//!
//! - A transcript that is resent in full on every request
//! - Exit keywords (`quit`, `exit`) recognized in any case
//! - Ctrl-C to abandon a slow reply
//! - Configurable model, system instruction, and limits
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`transcript`]: the alternating list of turns
//! - [`control`]: input classification and the loop's state machine
//! - [`session`]: one request/response exchange at a time
//! - [`render`]: terminal output
//! - [`repl`]: the terminal loop

mod config;
mod control;
mod render;
mod repl;
mod session;
mod transcript;

pub use config::{ChatArgs, ChatConfig};
pub use control::{EXIT_KEYWORDS, Event, Input, SessionState};
pub use render::{PlainTextRenderer, Renderer};
pub use repl::{EditorSource, LineSource, ReadOutcome, ReaderSource, run};
pub use session::{ChatSession, SessionStats};
pub use transcript::{Transcript, Turn};
