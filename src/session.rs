//! Session initializer
//!
//! Opens the one chat session used for the lifetime of the app.

use tracing::info;

use crate::composer::SYSTEM_INSTRUCTION;
use crate::config::Settings;
use crate::error::FinGenieError;
use crate::gemini::GeminiChat;

/// Start a Gemini chat session with the FinGenie system instruction and
/// web search grounding. Fails when no API key is configured.
pub fn start_chat_session(settings: &Settings) -> crate::Result<GeminiChat> {
    let api_key = settings.api_key.clone().ok_or_else(|| {
        FinGenieError::Configuration("GEMINI_API_KEY environment variable not set".to_string())
    })?;

    let chat = GeminiChat::new(
        api_key,
        &settings.base_url,
        &settings.model,
        SYSTEM_INSTRUCTION.to_string(),
    )?;

    info!(model = %settings.model, "Chat session started");
    Ok(chat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let result = start_chat_session(&Settings::with_api_key(None));
        let error = result.err().unwrap();
        assert!(matches!(error, FinGenieError::Configuration(_)));
        assert!(error.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_session_starts_with_key() {
        let settings = Settings::with_api_key(Some("test-key".to_string()));
        assert!(start_chat_session(&settings).is_ok());
    }
}
