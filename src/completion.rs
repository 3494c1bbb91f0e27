//! Chat completion gateway implementations.
//!
//! [`OpenAIChat`] calls `POST {base_url}/chat/completions`;
//! [`DisabledCompleter`] fails every call. [`create_completer`] picks one
//! from configuration.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use librarian_core::completion::{ChatMessage, ChatUsage, Completion, CompletionGateway};
use librarian_core::GatewayError;

use crate::config::CompletionConfig;
use crate::openai::OpenAIClient;

const SERVICE: &str = "completion";

/// A completion gateway that always fails.
pub struct DisabledCompleter;

#[async_trait]
impl CompletionGateway for DisabledCompleter {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<Completion> {
        Err(GatewayError::Disabled {
            service: SERVICE.to_string(),
        }
        .into())
    }
}

/// Completion gateway for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIChat {
    client: OpenAIClient,
    model: String,
}

impl OpenAIChat {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionGateway for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<Completion> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });
        let json = self.client.post_json("chat/completions", &body).await?;
        Ok(parse_chat_response(&json)?)
    }
}

/// Parse a `/chat/completions` response: the first choice's message text
/// plus usage counts (zeros when the backend omits them).
pub fn parse_chat_response(json: &Value) -> Result<Completion, GatewayError> {
    let message = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .ok_or_else(|| GatewayError::malformed(SERVICE, "missing choices[0].message"))?;

    let text = match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(_) => return Err(GatewayError::malformed(SERVICE, "content is not a string")),
    };

    let usage = json.get("usage");
    let count = |key: &str| {
        usage
            .and_then(|u| u.get(key))
            .and_then(|v| v.as_u64())
    };

    Ok(Completion {
        text,
        usage: ChatUsage::new(
            count("prompt_tokens").unwrap_or(0),
            count("completion_tokens").unwrap_or(0),
            count("total_tokens"),
        ),
    })
}

/// Create the configured [`CompletionGateway`].
pub fn create_completer(config: &CompletionConfig) -> Result<Arc<dyn CompletionGateway>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompleter)),
        "openai" => {
            let client =
                OpenAIClient::from_env(config.base_url(), config.timeout_secs, config.max_retries)?;
            Ok(Arc::new(OpenAIChat::new(client, config.model.clone())))
        }
        other => bail!("Unknown completion provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_and_usage() {
        let json = json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Dune"}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
        });
        let completion = parse_chat_response(&json).unwrap();
        assert_eq!(completion.text, "Dune");
        assert_eq!(completion.usage, ChatUsage::new(100, 20, Some(120)));
    }

    #[test]
    fn test_missing_usage_is_zero() {
        let json = json!({"choices": [{"message": {"content": "hi"}}]});
        let completion = parse_chat_response(&json).unwrap();
        assert_eq!(completion.usage, ChatUsage::default());
    }

    #[test]
    fn test_null_content_is_empty_text() {
        let json = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(parse_chat_response(&json).unwrap().text, "");
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let err = parse_chat_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_disabled_fails() {
        let err = DisabledCompleter
            .complete(&[ChatMessage::user("hi")], 0.6)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("completion provider is disabled"));
    }
}
