//! Exit keyword recognition and the loop's state machine.
//!
//! Every line read at the prompt is classified into an [`Input`]; the
//! [`SessionState`] only moves from `AwaitingInput` to `Terminated`.

/// Words that end the conversation when typed on their own.
pub const EXIT_KEYWORDS: [&str; 2] = ["quit", "exit"];

/// A classified line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// One of the exit keywords, in any case, with surrounding whitespace.
    Exit,

    /// Anything else, kept exactly as typed.
    Message(String),
}

impl Input {
    /// Classify a line read from the terminal.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ogstartup::chat::Input;
    /// assert_eq!(Input::parse("  QUIT "), Input::Exit);
    /// assert_eq!(Input::parse("quit now"), Input::Message("quit now".to_string()));
    /// ```
    pub fn parse(line: &str) -> Self {
        let word = line.trim().to_lowercase();
        if EXIT_KEYWORDS.contains(&word.as_str()) {
            Input::Exit
        } else {
            Input::Message(line.to_string())
        }
    }
}

/// Where the loop is.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next line.
    #[default]
    AwaitingInput,

    /// The conversation is over.  Absorbing.
    Terminated,
}

/// Something that happened to the loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// An exit keyword was typed.
    ExitRequested,

    /// Standard input was closed.
    EndOfInput,

    /// A message was answered, or abandoned by an interrupt.
    TurnFinished,

    /// Ctrl-C at the prompt.
    PromptInterrupted,
}

impl SessionState {
    /// The state after `event`.
    pub fn next(self, event: Event) -> Self {
        match (self, event) {
            (SessionState::Terminated, _) => SessionState::Terminated,
            (SessionState::AwaitingInput, Event::ExitRequested | Event::EndOfInput) => {
                SessionState::Terminated
            }
            (SessionState::AwaitingInput, Event::TurnFinished | Event::PromptInterrupted) => {
                SessionState::AwaitingInput
            }
        }
    }

    /// Returns true once the conversation is over.
    pub fn is_terminated(self) -> bool {
        self == SessionState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_any_case_and_padding() {
        for line in ["quit", "QUIT", "  exit ", "Exit", "\tqUiT\n"] {
            assert_eq!(Input::parse(line), Input::Exit, "{line:?}");
        }
    }

    #[test]
    fn everything_else_is_a_message() {
        for line in ["", "   ", "quitting", "/quit", "exit please", "q"] {
            assert_eq!(Input::parse(line), Input::Message(line.to_string()));
        }
    }

    #[test]
    fn message_is_not_trimmed() {
        assert_eq!(
            Input::parse("  How do I start?  "),
            Input::Message("  How do I start?  ".to_string())
        );
    }

    #[test]
    fn state_machine() {
        let state = SessionState::default();
        assert_eq!(state, SessionState::AwaitingInput);
        assert_eq!(state.next(Event::TurnFinished), SessionState::AwaitingInput);
        assert_eq!(
            state.next(Event::PromptInterrupted),
            SessionState::AwaitingInput
        );
        assert!(state.next(Event::ExitRequested).is_terminated());
        assert!(state.next(Event::EndOfInput).is_terminated());
    }

    #[test]
    fn terminated_is_absorbing() {
        let state = SessionState::Terminated;
        assert!(state.next(Event::TurnFinished).is_terminated());
        assert!(state.next(Event::PromptInterrupted).is_terminated());
    }
}
