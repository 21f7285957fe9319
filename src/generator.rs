//! The seam between the chat loop and the text-generation service.
//!
//! The chat session only ever talks to a [`TextGenerator`]: it hands over the
//! transcript and the system instruction and gets back reply text.  The
//! [`Gemini`] client is the production implementation; tests plug in stubs.

use crate::Gemini;
use crate::chat::Turn;
use crate::error::{Error, Result};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Model,
    UsageMetadata,
};

/// Everything one call to the service needs.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    /// The model to ask.
    pub model: &'a Model,
    /// The fixed instruction framing every reply.
    pub system_instruction: &'a str,
    /// The whole transcript so far, ending with the pending user turn.
    pub turns: &'a [Turn],
    /// Sampling and length settings.
    pub generation_config: &'a GenerationConfig,
}

/// A reply from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The reply text.
    pub text: String,
    /// Token accounting, when the service reports it.
    pub usage: Option<UsageMetadata>,
}

impl Generation {
    /// Create a generation carrying only text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Access to the reply text of a service response.
pub trait ReplyText {
    /// Returns the reply text, or an error if the response carries none.
    fn reply_text(&self) -> Result<String>;
}

impl ReplyText for GenerateContentResponse {
    fn reply_text(&self) -> Result<String> {
        let Some(candidate) = self.first_candidate() else {
            return match self.block_reason() {
                Some(reason) => Err(Error::blocked(
                    "the prompt was refused",
                    Some(reason.to_string()),
                )),
                None => Err(Error::serialization("response has no candidates", None)),
            };
        };
        if let Some(text) = candidate.content.as_ref().and_then(Content::text) {
            return Ok(text);
        }
        match &candidate.finish_reason {
            Some(reason) if reason.is_filtered() => Err(Error::blocked(
                "the reply was withheld",
                Some(reason.to_string()),
            )),
            Some(reason) => Err(Error::serialization(
                format!("candidate has no text (finish reason {reason})"),
                None,
            )),
            None => Err(Error::serialization("candidate has no text", None)),
        }
    }
}

/// An external text-generation service.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the next model turn for `request.turns`.
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<Generation>;
}

impl From<GenerateRequest<'_>> for GenerateContentRequest {
    fn from(request: GenerateRequest<'_>) -> Self {
        let contents = request.turns.iter().map(Content::from).collect();
        GenerateContentRequest::new(contents)
            .with_system_instruction(request.system_instruction)
            .with_generation_config(request.generation_config.clone())
    }
}

#[async_trait::async_trait]
impl TextGenerator for Gemini {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<Generation> {
        let model = request.model;
        let body = GenerateContentRequest::from(request);
        let response = self.generate_content(model, &body).await?;
        Ok(Generation {
            text: response.reply_text()?,
            usage: response.usage_metadata,
        })
    }
}
