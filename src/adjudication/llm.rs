use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::AdjudicationError;
use super::verdict::{Verdict, parse_verdict};
use super::Judge;
use crate::llm::ChatModel;

const AUDITOR_PROMPT: &str = r#"You are a rigorous compliance auditor.

Compare the reference requirement against the SOP excerpts and decide whether the SOP discharges it.

Classify with exactly one label:
- SATISFIED: the excerpts explicitly state the required procedure, matching its intent and key details.
- PARTIAL: the obligation is addressed but a necessary detail is missing (for example a timeframe, a responsible role, or a record to keep).
- WEAK: the excerpts mention the topic without actually stating the procedure, or use non-binding language where the requirement is mandatory.

Respond with JSON only:
{"status": "SATISFIED | PARTIAL | WEAK", "justification": "One sentence."}"#;

/// [`Judge`] backed by a chat model.
#[derive(Debug, Clone)]
pub struct LlmJudge {
    chat: Arc<dyn ChatModel>,
}

impl LlmJudge {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    fn user_prompt(requirement_text: &str, matched_texts: &[String]) -> String {
        let mut prompt = format!("Reference requirement:\n\"{requirement_text}\"\n\nSOP excerpts (best matches first):\n");
        for (i, text) in matched_texts.iter().enumerate() {
            let _ = writeln!(prompt, "---\n[{}] {}", i + 1, text);
        }
        prompt
    }
}

#[async_trait]
impl Judge for LlmJudge {
    fn name(&self) -> &str {
        self.chat.model()
    }

    async fn judge(
        &self,
        requirement_text: &str,
        matched_texts: &[String],
    ) -> Result<Verdict, AdjudicationError> {
        let reply = self
            .chat
            .complete(AUDITOR_PROMPT, &Self::user_prompt(requirement_text, matched_texts))
            .await?;
        parse_verdict(&reply)
    }
}
