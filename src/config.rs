use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ScanError;

/// Environment variables checked for the API key when the config has none
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Scanner configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// API key for the model endpoint (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Model identifier (e.g., "gemini-1.5-flash")
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL for the generative language API (for proxies and tests)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Temperature for generation; kept at zero so the model sticks to the schema
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Response format hint sent as `responseMimeType`
    #[serde(default = "default_response_mime_type")]
    pub response_mime_type: String,
    /// Turn off content filters that misfire on chemical ingredient names
    #[serde(default = "default_relax_safety_filters")]
    pub relax_safety_filters: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            response_mime_type: default_response_mime_type(),
            relax_safety_filters: default_relax_safety_filters(),
            timeout: default_timeout(),
        }
    }
}

// Default value functions
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_response_mime_type() -> String {
    "application/json".to_string()
}

fn default_relax_safety_filters() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl ScannerConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with UPF_SCANNER__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: UPF_SCANNER__API_KEY, UPF_SCANNER__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// API key from the config, falling back to GEMINI_API_KEY then GOOGLE_API_KEY
    ///
    /// # Errors
    /// Returns [`ScanError::Configuration`] when no key is set anywhere.
    pub fn resolve_api_key(&self) -> Result<String, ScanError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with<F>(&self, lookup: F) -> Result<String, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|name| lookup(name)))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ScanError::Configuration(format!(
                    "API key not found in config or environment ({})",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })
    }
}

/// Load configuration from an optional file and environment variables
///
/// When `path` is `None` an optional `config.toml` in the working directory is used.
pub fn load_config(path: Option<&Path>) -> Result<ScannerConfig, ConfigError> {
    let file = match path {
        // An explicitly named file must exist
        Some(path) => File::from(path).required(true),
        None => File::with_name("config").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        // Use double underscore for nested: UPF_SCANNER__API_KEY
        .add_source(
            Environment::with_prefix("UPF_SCANNER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_values() {
        assert_eq!(default_model(), "gemini-1.5-flash");
        assert_eq!(default_temperature(), 0.0);
        assert_eq!(default_max_output_tokens(), 2048);
        assert_eq!(default_response_mime_type(), "application/json");
        assert!(default_relax_safety_filters());
        assert_eq!(default_timeout(), 30);
    }

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_duration(), Duration::from_secs(30));
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let config = ScannerConfig {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        let key = config
            .resolve_api_key_with(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_api_key_env_fallback_order() {
        let env: HashMap<&str, &str> =
            HashMap::from([("GEMINI_API_KEY", "gemini"), ("GOOGLE_API_KEY", "google")]);
        let config = ScannerConfig::default();
        let key = config
            .resolve_api_key_with(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(key, "gemini");

        let key = config
            .resolve_api_key_with(|name| (name == "GOOGLE_API_KEY").then(|| "google".to_string()))
            .unwrap();
        assert_eq!(key, "google");
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = ScannerConfig::default();
        let err = config.resolve_api_key_with(|_| None).unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        let config = ScannerConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_api_key_with(|_| None).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("upf-scanner-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scanner.toml");
        std::fs::write(
            &path,
            "model = \"gemini-2.0-flash\"\ntimeout = 5\nrelax_safety_filters = false\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout, 5);
        assert!(!config.relax_safety_filters);
        assert_eq!(config.temperature, 0.0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
