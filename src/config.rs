//! Runtime settings loaded from the environment (and `.env` when present)

use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Credential for the Gemini session. `None` means the session cannot start.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Read settings from process environment variables.
    ///
    /// Call `dotenv::dotenv().ok()` first if `.env` support is wanted.
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());

        let port = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            api_key,
            model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            port,
            data_dir: env::var("FINGENIE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".fingenie")),
        }
    }

    /// Settings with the given key and every other value at its default.
    pub fn with_api_key(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(".fingenie"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_api_key(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.port, 8080);
    }
}
