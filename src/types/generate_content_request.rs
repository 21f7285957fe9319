use serde::{Deserialize, Serialize};

use crate::types::{Content, GenerationConfig};

/// Body of a `models/{model}:generateContent` request.
///
/// The whole conversation travels on every request; the service keeps no
/// session state between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation so far, oldest first.
    pub contents: Vec<Content>,

    /// Instruction that frames every reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling and length settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Create a request carrying `contents` and nothing else.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Attach a system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content::system(instruction));
        self
    }

    /// Attach generation settings.  Empty settings are not sent.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = if config.is_empty() {
            None
        } else {
            Some(config)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_wire_shape() {
        let request = GenerateContentRequest::new(vec![
            Content::user("Hi"),
            Content::model("Hello!"),
            Content::user("Help me sell zobo"),
        ])
        .with_system_instruction("You are an advisor.")
        .with_generation_config(GenerationConfig::new().with_max_output_tokens(1024));

        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hi"}]},
                    {"role": "model", "parts": [{"text": "Hello!"}]},
                    {"role": "user", "parts": [{"text": "Help me sell zobo"}]}
                ],
                "systemInstruction": {"parts": [{"text": "You are an advisor."}]},
                "generationConfig": {"maxOutputTokens": 1024}
            })
        );
    }

    #[test]
    fn empty_generation_config_is_dropped() {
        let request = GenerateContentRequest::new(vec![Content::user("Hi")])
            .with_generation_config(GenerationConfig::new());
        assert!(request.generation_config.is_none());
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "Hi"}]}]})
        );
    }
}
