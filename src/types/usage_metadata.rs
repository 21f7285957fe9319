use serde::{Deserialize, Serialize};

/// Token accounting reported with each response.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt, including the system instruction.
    #[serde(default)]
    pub prompt_token_count: u32,

    /// Tokens across all returned candidates.
    #[serde(default)]
    pub candidates_token_count: u32,

    /// Tokens spent on reasoning, for models that think.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<u32>,

    /// Total tokens billed for the call.
    #[serde(default)]
    pub total_token_count: u32,
}

impl UsageMetadata {
    /// Create usage from prompt and reply token counts.
    pub fn new(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            prompt_token_count,
            candidates_token_count,
            thoughts_token_count: None,
            total_token_count: prompt_token_count.saturating_add(candidates_token_count),
        }
    }
}

impl std::ops::Add for UsageMetadata {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let thoughts = match (self.thoughts_token_count, rhs.thoughts_token_count) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
        };
        Self {
            prompt_token_count: self
                .prompt_token_count
                .saturating_add(rhs.prompt_token_count),
            candidates_token_count: self
                .candidates_token_count
                .saturating_add(rhs.candidates_token_count),
            thoughts_token_count: thoughts,
            total_token_count: self.total_token_count.saturating_add(rhs.total_token_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_metadata() {
        let usage: UsageMetadata =
            serde_json::from_str(r#"{"promptTokenCount": 12, "totalTokenCount": 12}"#).unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.candidates_token_count, 0);
        assert_eq!(usage.thoughts_token_count, None);
    }

    #[test]
    fn addition_accumulates() {
        let total = UsageMetadata::new(10, 5) + UsageMetadata::new(20, 7);
        assert_eq!(total.prompt_token_count, 30);
        assert_eq!(total.candidates_token_count, 12);
        assert_eq!(total.total_token_count, 42);
        assert_eq!(total.thoughts_token_count, None);
    }
}
