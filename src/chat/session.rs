//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the transcript
//! and runs one request/response exchange per user message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::Gemini;
use crate::chat::config::ChatConfig;
use crate::chat::transcript::Transcript;
use crate::error::{Error, Result};
use crate::generator::{GenerateRequest, Generation, TextGenerator};
use crate::observability::{SESSION_ROLLBACKS, SESSION_TURNS};
use crate::types::{Model, UsageMetadata};

/// How often an in-flight request checks the interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// A chat session that owns the conversation and talks to a generator.
///
/// The full transcript is sent on every exchange; the generator is assumed
/// to keep no state between calls.
pub struct ChatSession<G: TextGenerator> {
    generator: G,
    config: ChatConfig,
    transcript: Transcript,
    usage_totals: UsageMetadata,
    last_turn_usage: Option<UsageMetadata>,
    request_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: Model,
    /// The number of turns in the transcript.
    pub turn_count: usize,
    /// Total number of answered requests.
    pub total_requests: u64,
    /// Total prompt tokens across all requests.
    pub total_prompt_tokens: u64,
    /// Total reply tokens across all requests.
    pub total_reply_tokens: u64,
    /// Prompt tokens for the last turn, if reported.
    pub last_turn_prompt_tokens: Option<u64>,
    /// Reply tokens for the last turn, if reported.
    pub last_turn_reply_tokens: Option<u64>,
}

impl ChatSession<Gemini> {
    /// Creates a session backed by the Gemini API.
    ///
    /// The credential comes from the environment.  A missing credential is
    /// reported by the first [`ChatSession::send`], not here.
    pub fn from_config(config: ChatConfig) -> Result<Self> {
        let client = Gemini::new(None)?
            .with_timeout(config.timeout)?
            .with_max_retries(config.max_retries);
        Ok(Self::new(client, config))
    }
}

impl<G: TextGenerator> ChatSession<G> {
    /// Creates a new chat session with an empty transcript.
    pub fn new(generator: G, config: ChatConfig) -> Self {
        Self {
            generator,
            config,
            transcript: Transcript::new(),
            usage_totals: UsageMetadata::default(),
            last_turn_usage: None,
            request_count: 0,
        }
    }

    /// Sends a user message and returns the reply.
    ///
    /// This method:
    /// 1. Adds the user turn to the transcript
    /// 2. Sends the whole transcript and the system instruction
    /// 3. Adds the reply as a model turn
    ///
    /// # Errors
    ///
    /// Returns an error if the generator fails.  The user turn is removed
    /// again, so the transcript still alternates.
    pub async fn send(&mut self, user_input: &str) -> Result<String> {
        self.exchange(user_input, None).await
    }

    /// Like [`ChatSession::send`], but gives up with [`Error::Abort`] as soon
    /// as `interrupted` is set.
    pub async fn send_interruptible(
        &mut self,
        user_input: &str,
        interrupted: &AtomicBool,
    ) -> Result<String> {
        self.exchange(user_input, Some(interrupted)).await
    }

    async fn exchange(
        &mut self,
        user_input: &str,
        interrupted: Option<&AtomicBool>,
    ) -> Result<String> {
        self.transcript.push_user(user_input)?;

        let generation_config = self.config.generation_config();
        let request = GenerateRequest {
            model: &self.config.model,
            system_instruction: &self.config.system_instruction,
            turns: self.transcript.turns(),
            generation_config: &generation_config,
        };
        let outcome = tokio::select! {
            outcome = self.generator.generate(request) => outcome,
            _ = wait_for_interrupt(interrupted) => Err(Error::abort("interrupted by user")),
        };

        match outcome {
            Ok(generation) => self.record_reply(generation),
            Err(err) => {
                if self.transcript.pop_unanswered().is_some() {
                    SESSION_ROLLBACKS.click();
                }
                warn!(error = %err, "exchange failed; user turn rolled back");
                Err(err)
            }
        }
    }

    fn record_reply(&mut self, generation: Generation) -> Result<String> {
        let Generation { text, usage } = generation;
        self.transcript.push_model(text.clone())?;
        SESSION_TURNS.click();
        self.request_count = self.request_count.saturating_add(1);
        self.last_turn_usage = usage;
        if let Some(usage) = usage {
            self.usage_totals = self.usage_totals + usage;
        }
        debug!(
            turns = self.transcript.len(),
            reply_chars = text.chars().count(),
            "reply recorded"
        );
        Ok(text)
    }

    /// Returns the conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the generator backing this session.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.config.model
    }

    /// Returns the system instruction.
    pub fn system_instruction(&self) -> &str {
        &self.config.system_instruction
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model.clone(),
            turn_count: self.transcript.len(),
            total_requests: self.request_count,
            total_prompt_tokens: self.usage_totals.prompt_token_count.into(),
            total_reply_tokens: self.usage_totals.candidates_token_count.into(),
            last_turn_prompt_tokens: self
                .last_turn_usage
                .map(|usage| usage.prompt_token_count.into()),
            last_turn_reply_tokens: self
                .last_turn_usage
                .map(|usage| usage.candidates_token_count.into()),
        }
    }
}

async fn wait_for_interrupt(interrupted: Option<&AtomicBool>) {
    let Some(flag) = interrupted else {
        return std::future::pending().await;
    };
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Turn;
    use crate::types::KnownModel;

    struct Echo;

    #[async_trait::async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, request: GenerateRequest<'_>) -> Result<Generation> {
            let last = request.turns.last().map(|t| t.text.as_str()).unwrap_or("");
            Ok(Generation {
                text: format!("echo: {last}"),
                usage: Some(UsageMetadata::new(10, 3)),
            })
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _: GenerateRequest<'_>) -> Result<Generation> {
            Err(Error::service_unavailable("down", None))
        }
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl TextGenerator for Stalled {
        async fn generate(&self, _: GenerateRequest<'_>) -> Result<Generation> {
            std::future::pending().await
        }
    }

    #[test]
    fn new_session_empty() {
        let session = ChatSession::new(Echo, ChatConfig::default());
        assert!(session.transcript().is_empty());
        assert_eq!(session.model(), &Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(session.stats().total_requests, 0);
    }

    #[tokio::test]
    async fn send_appends_user_and_model() {
        let mut session = ChatSession::new(Echo, ChatConfig::default());
        let reply = session.send("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
        assert_eq!(
            session.transcript().turns(),
            &[Turn::user("hello"), Turn::model("echo: hello")]
        );
    }

    #[tokio::test]
    async fn stats_accumulate_usage() {
        let mut session = ChatSession::new(Echo, ChatConfig::default());
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        let stats = session.stats();
        assert_eq!(stats.turn_count, 4);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_prompt_tokens, 20);
        assert_eq!(stats.total_reply_tokens, 6);
        assert_eq!(stats.last_turn_prompt_tokens, Some(10));
    }

    #[tokio::test]
    async fn failure_rolls_back_user_turn() {
        let mut session = ChatSession::new(Failing, ChatConfig::default());
        let err = session.send("hello").await.unwrap_err();
        assert!(err.is_service_unavailable());
        assert!(session.transcript().is_empty());
        assert_eq!(session.stats().total_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_aborts_in_flight_request() {
        let mut session = ChatSession::new(Stalled, ChatConfig::default());
        let interrupted = AtomicBool::new(true);
        let err = session
            .send_interruptible("hello", &interrupted)
            .await
            .unwrap_err();
        assert!(err.is_abort());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn exchanges_are_counted() {
        use biometrics::Sensor;

        let turns = SESSION_TURNS.read();
        let mut session = ChatSession::new(Echo, ChatConfig::default());
        session.send("one").await.unwrap();
        assert!(SESSION_TURNS.read() > turns);

        let rollbacks = SESSION_ROLLBACKS.read();
        let mut session = ChatSession::new(Failing, ChatConfig::default());
        session.send("two").await.unwrap_err();
        assert!(SESSION_ROLLBACKS.read() > rollbacks);
    }

    #[tokio::test]
    async fn unset_flag_does_not_interrupt() {
        let mut session = ChatSession::new(Echo, ChatConfig::default());
        let interrupted = AtomicBool::new(false);
        let reply = session.send_interruptible("hi", &interrupted).await.unwrap();
        assert_eq!(reply, "echo: hi");
        assert_eq!(session.transcript().len(), 2);
    }
}
