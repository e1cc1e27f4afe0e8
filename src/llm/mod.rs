//! Chat-model access shared by the judge and the LLM normalizer.
//!
//! [`GenaiChat`] talks to any provider `genai` supports; the provider is inferred from the
//! model name (`gpt-*`, `claude-*`, `gemini-*`, ...) and credentials come from the usual
//! provider environment variables.


use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("chat request to {model} failed: {reason}")]
    Request { model: String, reason: String },

    #[error("chat model {model} returned no text")]
    EmptyResponse { model: String },
}

/// One-shot, system + user prompt completion.
#[async_trait]
pub trait ChatModel: Send + Sync + std::fmt::Debug {
    fn model(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

pub struct GenaiChat {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiChat")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiChat {
    /// Low temperature keeps classifications stable across runs.
    pub const DEFAULT_TEMPERATURE: f64 = 0.1;

    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::default(),
            model: model.into(),
            options: ChatOptions::default().with_temperature(Self::DEFAULT_TEMPERATURE),
        }
    }
}

#[async_trait]
impl ChatModel for GenaiChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)]);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| LlmError::Request {
                model: self.model.clone(),
                reason: e.to_string(),
            })?;

        let text = response
            .first_text()
            .map(str::to_string)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                model: self.model.clone(),
            })?;

        debug!(model = %self.model, chars = text.len(), "Chat completion received");
        Ok(text)
    }
}

/// Pulls the first JSON object or array out of a model reply.
///
/// Handles replies wrapped in Markdown code fences or surrounded by prose. Returns `None` when
/// no balanced `{...}` / `[...]` block is present.
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find(['{', '['])?;
    let open = reply[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in reply[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedChat;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{ChatModel, LlmError};

    /// Replays canned replies in order; `Err` entries simulate provider failures.
    /// Once the script runs out the last reply repeats.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedChat {
        replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
        last: Arc<Mutex<Option<Result<String, String>>>>,
        prompts: Arc<Mutex<Vec<String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedChat {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: impl Into<String>) -> Self {
            self.replies.lock().push_back(Ok(text.into()));
            self
        }

        pub fn fail(self, reason: impl Into<String>) -> Self {
            self.replies.lock().push_back(Err(reason.into()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// User prompts received so far.
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(user.to_string());

            let next = self.replies.lock().pop_front();
            let reply = match next {
                Some(reply) => {
                    *self.last.lock() = Some(reply.clone());
                    reply
                }
                None => self
                    .last
                    .lock()
                    .clone()
                    .unwrap_or_else(|| Err("no scripted reply".to_string())),
            };

            reply.map_err(|reason| LlmError::Request {
                model: "scripted".to_string(),
                reason,
            })
        }
    }
}
