//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration that the session and client are built from.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::error::{Error, Result};
use crate::persona::SYSTEM_INSTRUCTION;
use crate::types::{GenerationConfig, Model};

/// Default maximum tokens per reply.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of retries for transient failures.
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Command-line arguments for the ogstartup-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: gemini-2.5-flash)", "MODEL")]
    pub model: Option<String>,

    /// Replacement for the built-in advisor instruction.
    #[arrrg(optional, "System instruction (default: the Ogun Startup Advisor persona)", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per reply.
    #[arrrg(optional, "Max tokens per reply (default: 1024)", "TOKENS")]
    pub max_output_tokens: Option<u32>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Seconds to wait for each reply (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Retries for transient failures.
    #[arrrg(optional, "Retries on timeouts and 5xx/429 (default: 2)", "N")]
    pub max_retries: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature in [0, 2] (default: model default)", "TEMP")]
    pub temperature: Option<f32>,

    /// Nucleus sampling mass.
    #[arrrg(optional, "Top-p in [0, 1] (default: model default)", "P")]
    pub top_p: Option<f32>,

    /// Top-k sampling limit.
    #[arrrg(optional, "Top-k, at least 1 (default: model default)", "K")]
    pub top_k: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

// `arrrg::CommandLine` requires `Eq`; the f32 fields prevent deriving it.
impl Eq for ChatArgs {}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating replies.
    pub model: Model,

    /// Instruction sent with every request.
    pub system_instruction: String,

    /// Maximum tokens per reply.
    pub max_output_tokens: u32,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Optional top-p nucleus sampling value.
    pub top_p: Option<f32>,

    /// Optional top-k sampling limit.
    pub top_k: Option<u32>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// How long to wait for each reply.
    pub timeout: Duration,

    /// How many times to retry a transient failure.
    pub max_retries: u32,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.5-flash
    /// - System instruction: the advisor persona
    /// - Max output tokens: 1024
    /// - Color: enabled
    /// - Timeout: 60 seconds, 2 retries
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: None,
            top_p: None,
            top_k: None,
            use_color: true,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Sets the maximum tokens per reply.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the top-k value.
    pub fn with_top_k(mut self, top_k: Option<u32>) -> Self {
        self.top_k = top_k;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry limit.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The generation settings sent on every request.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::new()
            .with_max_output_tokens(self.max_output_tokens)
            .with_temperature(self.temperature)
            .with_top_p(self.top_p)
            .with_top_k(self.top_k)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(model) = args.model {
            config.model = model.parse()?;
        }
        if let Some(system) = args.system {
            if system.trim().is_empty() {
                return Err(Error::validation(
                    "system instruction must not be empty",
                    Some("system".to_string()),
                ));
            }
            config.system_instruction = system;
        }
        if let Some(max_output_tokens) = args.max_output_tokens {
            if max_output_tokens == 0 {
                return Err(Error::validation(
                    "max output tokens must be positive",
                    Some("max-output-tokens".to_string()),
                ));
            }
            config.max_output_tokens = max_output_tokens;
        }
        if let Some(secs) = args.timeout_secs {
            if secs == 0 {
                return Err(Error::validation(
                    "timeout must be at least one second",
                    Some("timeout-secs".to_string()),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(max_retries) = args.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(temperature) = args.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::validation(
                    format!("temperature must be between 0 and 2, got {temperature}"),
                    Some("temperature".to_string()),
                ));
            }
            config.temperature = Some(temperature);
        }
        if let Some(top_p) = args.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(Error::validation(
                    format!("top-p must be between 0 and 1, got {top_p}"),
                    Some("top-p".to_string()),
                ));
            }
            config.top_p = Some(top_p);
        }
        if let Some(top_k) = args.top_k {
            if top_k == 0 {
                return Err(Error::validation(
                    "top-k must be at least 1",
                    Some("top-k".to_string()),
                ));
            }
            config.top_k = Some(top_k);
        }
        config.use_color = !args.no_color;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownModel;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(config.system_instruction, SYSTEM_INSTRUCTION);
        assert_eq!(config.max_output_tokens, 1024);
        assert!(config.use_color);
        assert!(config.temperature.is_none());
        assert!(config.top_p.is_none());
        assert!(config.top_k.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::try_from(ChatArgs::default()).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Flash));
        assert_eq!(config.max_output_tokens, 1024);
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemini-2.5-pro".to_string()),
            system: Some("You are terse.".to_string()),
            max_output_tokens: Some(256),
            timeout_secs: Some(5),
            max_retries: Some(0),
            temperature: Some(0.7),
            top_p: Some(0.9),
            top_k: Some(40),
            no_color: true,
        };
        let config = ChatConfig::try_from(args).unwrap();
        assert_eq!(config.model, Model::Known(KnownModel::Gemini25Pro));
        assert_eq!(config.system_instruction, "You are terse.");
        assert_eq!(config.max_output_tokens, 256);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.top_p, Some(0.9));
        assert_eq!(config.top_k, Some(40));
        assert!(!config.use_color);
    }

    #[test]
    fn config_from_args_rejects_sampling_out_of_range() {
        let args = ChatArgs {
            temperature: Some(2.5),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());

        let args = ChatArgs {
            top_p: Some(-0.1),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());

        let args = ChatArgs {
            top_k: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());
    }

    #[test]
    fn sampling_flags_reach_the_request() {
        let args = ChatArgs {
            temperature: Some(0.2),
            top_p: Some(0.5),
            top_k: Some(8),
            ..ChatArgs::default()
        };
        let generation = ChatConfig::try_from(args).unwrap().generation_config();
        assert_eq!(generation.temperature, Some(0.2));
        assert_eq!(generation.top_p, Some(0.5));
        assert_eq!(generation.top_k, Some(8));
    }

    #[test]
    fn config_from_args_rejects_nonsense() {
        let args = ChatArgs {
            max_output_tokens: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).unwrap_err().is_validation());

        let args = ChatArgs {
            system: Some("   ".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());

        let args = ChatArgs {
            model: Some("a:b".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::try_from(args).is_err());
    }

    #[test]
    fn generation_config_follows_config() {
        let config = ChatConfig::new()
            .with_max_output_tokens(2048)
            .with_temperature(Some(0.4))
            .with_top_k(Some(32));
        let generation = config.generation_config();
        assert_eq!(generation.max_output_tokens, Some(2048));
        assert_eq!(generation.temperature, Some(0.4));
        assert_eq!(generation.top_p, None);
        assert_eq!(generation.top_k, Some(32));
    }
}
