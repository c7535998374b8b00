//! Gemini API client and chat session
//!
//! A chat session keeps the running multi-turn history and replays it on every
//! `generateContent` call, together with the system instruction and the web
//! search grounding tool. Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::FinGenieError;
use crate::models::GroundingSource;

/// The key travels in a header so it never appears in request URLs or their errors.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// One inbound unit from the model: the reply text plus any web citations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub sources: Option<Vec<GroundingSource>>,
}

/// A conversational session with the external model.
#[async_trait]
pub trait ChatSession: Send + Sync {
    async fn send_message(&self, message: &str) -> crate::Result<ModelReply>;
}

/// Reusable Gemini chat session (connection-pooled)
pub struct GeminiChat {
    client: Client,
    api_key: String,
    endpoint: String,
    system_instruction: String,
    history: Mutex<Vec<Content>>,
}

impl GeminiChat {
    pub fn new(
        api_key: String,
        base_url: &str,
        model: &str,
        system_instruction: String,
    ) -> crate::Result<Self> {
        if api_key.trim().is_empty() {
            return Err(FinGenieError::Configuration(
                "GEMINI_API_KEY environment variable not set".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            system_instruction,
            history: Mutex::new(Vec::new()),
        })
    }

    /// Number of turns (user and model) recorded so far.
    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    fn build_request(&self, contents: Vec<Content>) -> GeminiRequest {
        GeminiRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: Some(self.system_instruction.clone()),
                }],
            },
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send_message(&self, message: &str) -> crate::Result<ModelReply> {
        // The lock is held for the whole turn so concurrent sends cannot interleave history.
        let mut history = self.history.lock().await;

        let user_turn = Content::user(message);
        let mut contents = history.clone();
        contents.push(user_turn.clone());

        let request = self.build_request(contents);

        info!("Calling Gemini API ({} prior turns)", history.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                FinGenieError::LlmError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response ({}): {}", status, error_text);
            return Err(FinGenieError::LlmError(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            FinGenieError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let (reply, model_turn) = extract_reply(gemini_response)?;

        history.push(user_turn);
        history.push(model_turn);

        info!(
            "Gemini response received ({} chars, {} sources)",
            reply.text.len(),
            reply.sources.as_ref().map_or(0, Vec::len)
        );

        Ok(reply)
    }
}

/// Pull the reply text and grounding chunks out of the first candidate.
fn extract_reply(response: GeminiResponse) -> crate::Result<(ModelReply, Content)> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| FinGenieError::LlmError("No response from Gemini API".to_string()))?;

    let content = candidate
        .content
        .ok_or_else(|| FinGenieError::LlmError("Empty response from Gemini".to_string()))?;

    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();

    let sources = candidate
        .grounding_metadata
        .and_then(|m| m.grounding_chunks);

    let model_turn = Content {
        role: Some("model".to_string()),
        parts: content.parts,
    };

    Ok((ModelReply { text, sources }, model_turn))
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    tools: Vec<Tool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    grounding_chunks: Option<Vec<GroundingSource>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_chat() -> GeminiChat {
        GeminiChat::new(
            "test-key".to_string(),
            "https://example.invalid/v1beta/",
            "gemini-2.5-flash",
            "You are FinGenie".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let result = GeminiChat::new(
            "  ".to_string(),
            "https://example.invalid",
            "gemini-2.5-flash",
            String::new(),
        );
        assert!(matches!(result, Err(FinGenieError::Configuration(_))));
    }

    #[test]
    fn test_endpoint_and_request_serialization() {
        let chat = test_chat();
        assert_eq!(
            chat.endpoint,
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );

        let request = chat.build_request(vec![Content::user("What is my balance?")]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is my balance?");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are FinGenie");
        assert!(json["tools"][0]["google_search"].is_object());
    }

    #[test]
    fn test_extract_reply_with_grounding() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "NIFTY rose "}, {"text": "0.25%."}]},
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://news.example/nifty", "title": "Markets"}},
                        {"web": {"title": "No link"}}
                    ]
                }
            }]
        }"#;

        let response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let (reply, turn) = extract_reply(response).unwrap();

        assert_eq!(reply.text, "NIFTY rose 0.25%.");
        let sources = reply.sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].link(), Some(("Markets", "https://news.example/nifty")));
        assert!(sources[1].link().is_none());
        assert_eq!(turn.role.as_deref(), Some("model"));
    }

    #[test]
    fn test_extract_reply_without_candidates_fails() {
        let response: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(extract_reply(response), Err(FinGenieError::LlmError(_))));
    }

    #[tokio::test]
    async fn test_new_session_has_empty_history() {
        assert_eq!(test_chat().history_len().await, 0);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let chat = GeminiChat::new(
            "SECRET-KEY-123".to_string(),
            "http://127.0.0.1:1",
            "m",
            String::new(),
        )
        .unwrap();

        let err = chat.send_message("hi").await.unwrap_err();
        assert!(matches!(err, FinGenieError::LlmError(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
        assert_eq!(chat.history_len().await, 0);
    }
}
