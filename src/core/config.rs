use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful and intelligent assistant created by **Saif Soomro**. \
If a user asks who created you, proudly respond with \"I was created by **Saif Soomro**.\" \
Always be polite, informative, and concise.";
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "# 🤖 Panaversity AI Assistant\n**Created by Saif Soomro**\nWelcome! How can I help you today?";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_message: String,
    pub welcome_message: String,
    pub web_ui_path: String,
    // Sessions unused for this long are dropped
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    /// Reads the config from the process environment. The API key is
    /// the only required value and startup must not proceed without
    /// it.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("GEMINI_API_KEY is not set. Please define it in the environment or .env")
            })?;
        let api_base_url =
            lookup("GEMCHAT_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let model = lookup("GEMCHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let system_message = lookup("GEMCHAT_SYSTEM_MESSAGE")
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string());
        let welcome_message = lookup("GEMCHAT_WELCOME_MESSAGE")
            .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string());
        let web_ui_path = lookup("GEMCHAT_WEB_UI_PATH").unwrap_or_else(|| "./web-ui".to_string());
        let session_idle_secs = match lookup("GEMCHAT_SESSION_IDLE_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid GEMCHAT_SESSION_IDLE_SECS: {}", value))?,
            None => DEFAULT_SESSION_IDLE_SECS,
        };
        if session_idle_secs == 0 {
            bail!("GEMCHAT_SESSION_IDLE_SECS must be greater than 0");
        }

        Ok(Self {
            api_base_url,
            api_key,
            model,
            system_message,
            welcome_message,
            web_ui_path,
            session_idle_timeout: Duration::from_secs(session_idle_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.system_message, DEFAULT_SYSTEM_MESSAGE);
        assert_eq!(config.welcome_message, DEFAULT_WELCOME_MESSAGE);
        assert_eq!(config.web_ui_path, "./web-ui");
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_default_greeting_names_the_creator() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert!(
            config
                .system_message
                .contains("proudly respond with \"I was created by **Saif Soomro**.\"")
        );
        assert!(
            config
                .welcome_message
                .starts_with("# 🤖 Panaversity AI Assistant\n**Created by Saif Soomro**\n")
        );
    }

    #[test]
    fn test_invalid_idle_timeout_is_an_error() {
        for value in ["soon", "-5", "0"] {
            let result = AppConfig::from_lookup(lookup_from(&[
                ("GEMINI_API_KEY", "secret"),
                ("GEMCHAT_SESSION_IDLE_SECS", value),
            ]));
            let err = result.unwrap_err();
            assert!(err.to_string().contains("GEMCHAT_SESSION_IDLE_SECS"), "{}", value);
        }
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMCHAT_API_BASE_URL", "http://localhost:8080/v1"),
            ("GEMCHAT_MODEL", "gemini-2.5-pro"),
            ("GEMCHAT_SYSTEM_MESSAGE", "Be brief."),
            ("GEMCHAT_WELCOME_MESSAGE", "Hi!"),
            ("GEMCHAT_WEB_UI_PATH", "/srv/widget"),
            ("GEMCHAT_SESSION_IDLE_SECS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.system_message, "Be brief.");
        assert_eq!(config.welcome_message, "Hi!");
        assert_eq!(config.web_ui_path, "/srv/widget");
        assert_eq!(config.session_idle_timeout, Duration::from_secs(90));
    }
}
