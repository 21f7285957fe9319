use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reasons why the model stopped generating a candidate.
///
/// Values the crate does not know about are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural stop point or a stop sequence.
    Stop,

    /// The configured output token limit was reached.
    MaxTokens,

    /// The candidate was flagged for safety reasons.
    Safety,

    /// The candidate was flagged for recitation.
    Recitation,

    /// The candidate was flagged for some other policy.
    Blocklist,

    /// A reason this crate does not recognize.
    Other(String),
}

impl FinishReason {
    /// Returns true if the reply was cut short by a content filter.
    pub fn is_filtered(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety | FinishReason::Recitation | FinishReason::Blocklist
        )
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "STOP"),
            FinishReason::MaxTokens => write!(f, "MAX_TOKENS"),
            FinishReason::Safety => write!(f, "SAFETY"),
            FinishReason::Recitation => write!(f, "RECITATION"),
            FinishReason::Blocklist => write!(f, "BLOCKLIST"),
            FinishReason::Other(other) => write!(f, "{other}"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            "BLOCKLIST" => FinishReason::Blocklist,
            other => FinishReason::Other(other.to_string()),
        })
    }
}

impl From<String> for FinishReason {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(reason) => reason,
            Err(never) => match never {},
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        reason.to_string()
    }
}
